// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{BootstrapError, log_action, log_warning};
use crate::config::ValidatedConfig;
use crate::iam::{generate_password, hash_password};
use crate::roles::Role;
use crate::store::{Account, DataStore, YamlDataStore};
use std::io;
use std::path::Path;

pub const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_NAME: &str = "Administrator";
const ADMIN_PASSWORD_LENGTH: usize = 16;

/// Seeds an admin account when the data file holds no accounts at all. The
/// generated password is printed once.
pub fn ensure_admin(data_file: &Path, config: &ValidatedConfig) -> Result<bool, BootstrapError> {
    let store = YamlDataStore::new(data_file.to_path_buf()).map_err(io_error)?;
    let mut tables = store.load().map_err(io_error)?;
    if !tables.accounts.is_empty() {
        return Ok(false);
    }

    let password = generate_password(ADMIN_PASSWORD_LENGTH);
    let password_hash = hash_password(&password, &config.password).map_err(io_error)?;
    let id = 1;
    tables.accounts.insert(
        id,
        Account {
            id,
            name: ADMIN_NAME.to_string(),
            email: ADMIN_EMAIL.to_string(),
            password_hash,
            role: Role::Admin,
        },
    );
    store.save(&tables).map_err(io_error)?;

    log_action(format!(
        "created admin account {} in {}",
        ADMIN_EMAIL,
        data_file.display()
    ));
    log_warning(format!(
        "{} password: {} (change this immediately)",
        ADMIN_EMAIL, password
    ));

    Ok(true)
}

fn io_error(err: impl std::fmt::Display) -> BootstrapError {
    BootstrapError::Io(io::Error::other(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iam::verify_password;
    use crate::store::Tables;
    use crate::util::TestFixtureRoot;

    #[test]
    fn existing_accounts_are_left_alone() {
        let fixture = TestFixtureRoot::new_unique("seed-existing").unwrap();
        let store = YamlDataStore::new(fixture.data_file()).unwrap();
        let mut tables = Tables::default();
        tables.accounts.insert(
            4,
            Account {
                id: 4,
                name: "Lee".to_string(),
                email: "lee@example.com".to_string(),
                password_hash: "$argon2id$placeholder".to_string(),
                role: Role::Staff,
            },
        );
        store.save(&tables).unwrap();

        let seeded = ensure_admin(&fixture.data_file(), &ValidatedConfig::for_tests()).unwrap();
        assert!(!seeded);
        assert_eq!(store.load().unwrap(), tables);
    }

    #[test]
    fn seeded_password_is_usable() {
        let fixture = TestFixtureRoot::new_unique("seed-admin").unwrap();
        assert!(ensure_admin(&fixture.data_file(), &ValidatedConfig::for_tests()).unwrap());

        let tables = YamlDataStore::new(fixture.data_file())
            .unwrap()
            .load()
            .unwrap();
        let admin = tables.accounts.get(&1).expect("admin");
        assert_eq!(admin.role, Role::Admin);
        assert!(!verify_password("wrong", &admin.password_hash).unwrap());
    }
}
