// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::ServiceError;
use crate::config::Argon2Params;
use crate::iam::policy::{self, Requirement, authorize};
use crate::iam::{Identity, hash_password, verify_password};
use crate::notify::{ChangeNotifier, ChangeSignal};
use crate::roles::{LOWEST_PRIVILEGE_ROLE, Role};
use crate::security::{validate_account_name, validate_email_field, validate_password_field};
use crate::store::accounts::{AccountRepository, email_taken};
use crate::store::{Account, AccountSummary, Database, Repository};
use serde::Deserialize;

/// Verified in place of a real hash when the email is unknown, so both failure
/// paths cost the same.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzYWx0$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Required on create. On update a missing or blank value keeps the stored hash.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordChangeInput {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Clone)]
pub struct AccountService {
    accounts: AccountRepository,
    notifier: ChangeNotifier,
    password_params: Argon2Params,
}

impl AccountService {
    pub fn new(db: Database, notifier: ChangeNotifier, password_params: Argon2Params) -> Self {
        Self {
            accounts: Repository::new(db),
            notifier,
            password_params,
        }
    }

    pub fn repository(&self) -> &AccountRepository {
        &self.accounts
    }

    async fn hash(&self, password: String) -> Result<String, ServiceError> {
        let params = self.password_params.clone();
        tokio::task::spawn_blocking(move || hash_password(&password, &params))
            .await
            .map_err(|err| ServiceError::Store(format!("Password task failed: {}", err)))?
            .map_err(ServiceError::from)
    }

    async fn verify(&self, password: String, stored_hash: String) -> Result<bool, ServiceError> {
        tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|err| ServiceError::Store(format!("Password task failed: {}", err)))?
            .map_err(ServiceError::from)
    }

    /// Admin listing ordered by name; the keyword matches name or email, ignoring case.
    pub async fn list(
        &self,
        caller: Option<&Identity>,
        keyword: Option<&str>,
    ) -> Result<Vec<AccountSummary>, ServiceError> {
        authorize(caller, Requirement::Admin)?;
        let keyword = keyword
            .map(|keyword| keyword.trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty());
        Ok(self
            .accounts
            .all_by_name()
            .await
            .iter()
            .filter(|account| {
                keyword.as_ref().is_none_or(|keyword| {
                    account.name.to_lowercase().contains(keyword)
                        || account.email.to_lowercase().contains(keyword)
                })
            })
            .map(AccountSummary::from)
            .collect())
    }

    pub async fn get(
        &self,
        caller: Option<&Identity>,
        id: i16,
    ) -> Result<AccountSummary, ServiceError> {
        authorize(caller, Requirement::AccountOwner(id))?;
        self.accounts
            .get_by_id(&id)
            .await
            .map(|account| AccountSummary::from(&account))
            .ok_or_else(|| ServiceError::not_found("Account", id))
    }

    pub async fn by_email(
        &self,
        caller: Option<&Identity>,
        email: &str,
    ) -> Result<Option<AccountSummary>, ServiceError> {
        authorize(caller, Requirement::Admin)?;
        if email.trim().is_empty() {
            return Ok(None);
        }
        Ok(self
            .accounts
            .by_email(email)
            .await
            .map(|account| AccountSummary::from(&account)))
    }

    pub async fn by_role(
        &self,
        caller: Option<&Identity>,
        role: Role,
    ) -> Result<Vec<AccountSummary>, ServiceError> {
        authorize(caller, Requirement::Admin)?;
        Ok(self
            .accounts
            .by_role(role)
            .await
            .iter()
            .map(AccountSummary::from)
            .collect())
    }

    pub async fn create(
        &self,
        caller: Option<&Identity>,
        input: AccountInput,
    ) -> Result<AccountSummary, ServiceError> {
        authorize(caller, Requirement::Admin)?;
        self.insert(input).await
    }

    /// Public sign-up. Always the lowest role.
    pub async fn register(&self, input: RegistrationInput) -> Result<AccountSummary, ServiceError> {
        self.insert(AccountInput {
            name: input.name,
            email: input.email,
            password: Some(input.password),
            role: Some(LOWEST_PRIVILEGE_ROLE),
        })
        .await
    }

    async fn insert(&self, input: AccountInput) -> Result<AccountSummary, ServiceError> {
        let name = validate_account_name(&input.name).map_err(ServiceError::Validation)?;
        validate_email_field(&input.email).map_err(ServiceError::Validation)?;
        let password = input.password.unwrap_or_default();
        validate_password_field(&password).map_err(ServiceError::Validation)?;

        let email = input.email.trim().to_string();
        if self.accounts.email_exists(&email, None).await {
            return Err(email_conflict(&email));
        }
        let account = Account {
            id: 0,
            name,
            email,
            password_hash: self.hash(password).await?,
            role: input.role.unwrap_or(LOWEST_PRIVILEGE_ROLE),
        };

        let created = self
            .accounts
            .database()
            .commit(|tables| {
                if email_taken(tables, &account.email, None) {
                    return Err(email_conflict(&account.email));
                }
                AccountRepository::insert_into(tables, account).map_err(ServiceError::from)
            })
            .await?;

        log::info!("Account {} created with role {}", created.id, created.role);
        self.notifier.publish(ChangeSignal::AccountsChanged);
        Ok(AccountSummary::from(&created))
    }

    /// Owners may edit themselves; only admins may edit others or change roles.
    pub async fn update(
        &self,
        caller: Option<&Identity>,
        id: i16,
        input: AccountInput,
    ) -> Result<AccountSummary, ServiceError> {
        let editor = authorize(caller, Requirement::AccountOwner(id))?;
        let existing = self
            .accounts
            .get_by_id(&id)
            .await
            .ok_or_else(|| ServiceError::not_found("Account", id))?;
        if let Some(role) = input.role
            && role != existing.role
            && !policy::is_admin(editor)
        {
            return Err(ServiceError::Denied);
        }

        let name = validate_account_name(&input.name).map_err(ServiceError::Validation)?;
        validate_email_field(&input.email).map_err(ServiceError::Validation)?;
        let email = input.email.trim().to_string();
        let new_hash = match input.password.filter(|password| !password.trim().is_empty()) {
            Some(password) => {
                validate_password_field(&password).map_err(ServiceError::Validation)?;
                Some(self.hash(password).await?)
            }
            None => None,
        };

        let updated = self
            .accounts
            .database()
            .commit(|tables| {
                let current = tables
                    .accounts
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| ServiceError::not_found("Account", id))?;
                if email_taken(tables, &email, Some(id)) {
                    return Err(email_conflict(&email));
                }
                let account = Account {
                    id,
                    name,
                    email,
                    password_hash: new_hash.unwrap_or(current.password_hash),
                    role: input.role.unwrap_or(current.role),
                };
                AccountRepository::replace_in(tables, account).map_err(ServiceError::from)
            })
            .await?;

        log::info!("Account {} updated", id);
        self.notifier.publish(ChangeSignal::AccountsChanged);
        Ok(AccountSummary::from(&updated))
    }

    /// Admin only. Admins cannot remove themselves, and authors keep their accounts.
    pub async fn delete(&self, caller: Option<&Identity>, id: i16) -> Result<(), ServiceError> {
        let admin = authorize(caller, Requirement::Admin)?;
        if admin.account_id == id {
            return Err(ServiceError::conflict("You cannot delete your own account"));
        }

        self.accounts
            .database()
            .commit(|tables| {
                if !tables.accounts.contains_key(&id) {
                    return Err(ServiceError::not_found("Account", id));
                }
                let authored = tables.articles_by_author(id);
                if authored > 0 {
                    return Err(ServiceError::conflict(format!(
                        "Cannot delete account {} as it has {} news article(s)",
                        id, authored
                    )));
                }
                AccountRepository::remove_from(tables, &id)?;
                Ok(())
            })
            .await?;

        log::info!("Account {} deleted", id);
        self.notifier.publish(ChangeSignal::AccountsChanged);
        Ok(())
    }

    pub async fn change_password(
        &self,
        caller: Option<&Identity>,
        id: i16,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        authorize(caller, Requirement::AccountOwner(id))?;
        if new_password.trim().is_empty() {
            return Err(ServiceError::validation("New password is required"));
        }
        validate_password_field(new_password).map_err(ServiceError::Validation)?;
        if !self.accounts.any(|account| account.id == id).await {
            return Err(ServiceError::not_found("Account", id));
        }
        let new_hash = self.hash(new_password.to_string()).await?;

        self.accounts
            .database()
            .commit(|tables| {
                let account = tables
                    .accounts
                    .get_mut(&id)
                    .ok_or_else(|| ServiceError::not_found("Account", id))?;
                account.password_hash = new_hash;
                Ok::<_, ServiceError>(())
            })
            .await?;

        log::info!("Password changed for account {}", id);
        self.notifier.publish(ChangeSignal::AccountsChanged);
        Ok(())
    }

    /// Self-service change: the current password must verify and the new one be typed twice.
    pub async fn change_own_password(
        &self,
        caller: Option<&Identity>,
        input: PasswordChangeInput,
    ) -> Result<(), ServiceError> {
        let identity = authorize(caller, Requirement::Authenticated)?;
        if input.new_password != input.confirm_password {
            return Err(ServiceError::validation(
                "New password and confirmation do not match",
            ));
        }
        let account = self
            .accounts
            .get_by_id(&identity.account_id)
            .await
            .ok_or_else(|| ServiceError::not_found("Account", identity.account_id))?;
        if !self
            .verify(input.current_password, account.password_hash)
            .await?
        {
            return Err(ServiceError::validation("Current password is incorrect"));
        }
        self.change_password(caller, identity.account_id, &input.new_password)
            .await
    }

    /// `None` on any mismatch; unknown email and wrong password look the same.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<Identity>, ServiceError> {
        if email.trim().is_empty() || password.is_empty() {
            return Ok(None);
        }
        let account = self.accounts.by_email(email).await;
        let stored_hash = account
            .as_ref()
            .map(|account| account.password_hash.clone())
            .unwrap_or_else(|| DUMMY_PASSWORD_HASH.to_string());

        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
            .await
            .map_err(|err| ServiceError::Store(format!("Password task failed: {}", err)))?;
        // A corrupt stored hash counts as a mismatch.
        let matches = verified.unwrap_or_else(|err| {
            log::error!("Stored password hash for {} is unreadable: {}", email, err);
            false
        });
        match account {
            Some(account) if matches => Ok(Some(Identity::from(&account))),
            _ => Ok(None),
        }
    }

    /// Fresh identity for an account, used to rewrite live sessions after edits.
    pub async fn identity(&self, id: i16) -> Option<Identity> {
        self.accounts
            .get_by_id(&id)
            .await
            .map(|account| Identity::from(&account))
    }

    pub async fn profile(&self, caller: Option<&Identity>) -> Result<AccountSummary, ServiceError> {
        let identity = authorize(caller, Requirement::Authenticated)?;
        self.get(caller, identity.account_id).await
    }

    pub async fn update_profile(
        &self,
        caller: Option<&Identity>,
        input: ProfileInput,
    ) -> Result<AccountSummary, ServiceError> {
        let identity = authorize(caller, Requirement::Authenticated)?;
        self.update(
            caller,
            identity.account_id,
            AccountInput {
                name: input.name,
                email: input.email,
                password: None,
                role: None,
            },
        )
        .await
    }
}

fn email_conflict(email: &str) -> ServiceError {
    ServiceError::conflict(format!("Email {} already exists", email))
}
