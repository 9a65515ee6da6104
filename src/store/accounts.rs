// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::StoreError;
use super::models::Account;
use super::repository::{Entity, Repository, next_key};
use super::tables::Tables;
use crate::roles::Role;
use std::collections::BTreeMap;

pub type AccountRepository = Repository<Account>;

impl Entity for Account {
    type Key = i16;

    const LABEL: &'static str = "Account";

    fn key(&self) -> i16 {
        self.id
    }

    fn table(tables: &Tables) -> &BTreeMap<i16, Account> {
        &tables.accounts
    }

    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<i16, Account> {
        &mut tables.accounts
    }

    fn assign_key(&mut self, tables: &Tables) -> Result<(), StoreError> {
        if self.id <= 0 {
            self.id = next_key(&tables.accounts).ok_or(StoreError::KeysExhausted {
                entity: Self::LABEL,
            })?;
        }
        Ok(())
    }
}

pub(crate) fn same_email(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

pub(crate) fn email_taken(tables: &Tables, email: &str, excluding: Option<i16>) -> bool {
    tables
        .accounts
        .values()
        .any(|account| Some(account.id) != excluding && same_email(&account.email, email))
}

impl Repository<Account> {
    pub async fn all_by_name(&self) -> Vec<Account> {
        let mut accounts = self.get_all().await;
        accounts.sort_by(|left, right| left.name.cmp(&right.name).then(left.id.cmp(&right.id)));
        accounts
    }

    /// Case-insensitive.
    pub async fn by_email(&self, email: &str) -> Option<Account> {
        self.first_or_default(|account| same_email(&account.email, email))
            .await
    }

    pub async fn by_role(&self, role: Role) -> Vec<Account> {
        self.find(|account| account.role == role).await
    }

    pub async fn email_exists(&self, email: &str, excluding: Option<i16>) -> bool {
        self.database()
            .read(|tables| email_taken(tables, email, excluding))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;

    fn account(name: &str, email: &str, role: Role) -> Account {
        Account {
            id: 0,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn email_lookup_ignores_case_and_whitespace() {
        let repo = AccountRepository::new(Database::in_memory());
        repo.add(account("Ada", "Ada@Example.com", Role::Staff))
            .await
            .expect("add");
        let found = repo.by_email(" ada@example.COM ").await.expect("found");
        assert_eq!(found.id, 1);
        assert!(repo.email_exists("ADA@example.com", None).await);
        assert!(!repo.email_exists("ada@example.com", Some(1)).await);
    }

    #[tokio::test]
    async fn role_filter_and_name_order() {
        let repo = AccountRepository::new(Database::in_memory());
        repo.add(account("Zed", "z@example.com", Role::Lecturer))
            .await
            .expect("z");
        repo.add(account("Amy", "a@example.com", Role::Lecturer))
            .await
            .expect("a");
        repo.add(account("Max", "m@example.com", Role::Staff))
            .await
            .expect("m");
        let names: Vec<String> = repo
            .all_by_name()
            .await
            .into_iter()
            .map(|account| account.name)
            .collect();
        assert_eq!(names, vec!["Amy", "Max", "Zed"]);
        assert_eq!(repo.by_role(Role::Lecturer).await.len(), 2);
        assert_eq!(repo.by_role(Role::Admin).await.len(), 0);
    }
}
