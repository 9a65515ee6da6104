// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound { entity: &'static str, key: String },
    DuplicateKey { entity: &'static str, key: String },
    /// Every key the table's key type can hold is already taken.
    KeysExhausted { entity: &'static str },
    /// The backing file could not be read, written or decoded.
    Persistence(String),
    /// A background write task died before reporting back.
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn duplicate(entity: &'static str, key: impl fmt::Display) -> Self {
        StoreError::DuplicateKey {
            entity,
            key: key.to_string(),
        }
    }

    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            StoreError::Persistence(_) | StoreError::Unavailable(_)
        )
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { entity, key } => write!(f, "{} '{}' not found", entity, key),
            StoreError::DuplicateKey { entity, key } => {
                write!(f, "{} '{}' already exists", entity, key)
            }
            StoreError::KeysExhausted { entity } => {
                write!(f, "No free {} id is left", entity.to_lowercase())
            }
            StoreError::Persistence(msg) => write!(f, "Storage error: {}", msg),
            StoreError::Unavailable(msg) => write!(f, "Storage unavailable: {}", msg),
        }
    }
}

impl Error for StoreError {}
