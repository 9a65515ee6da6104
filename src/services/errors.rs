// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::iam::{AccessError, PasswordError};
use crate::store::StoreError;
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum ServiceError {
    Validation(String),
    NotFound { entity: &'static str, id: String },
    Conflict(String),
    Unauthenticated,
    Denied,
    /// Store or hashing failure. Passed through untouched, never retried.
    Store(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_failed",
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Unauthenticated => "authentication_required",
            ServiceError::Denied => "access_denied",
            ServiceError::Store(_) => "storage_error",
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Validation(msg) => write!(f, "{}", msg),
            ServiceError::NotFound { entity, id } => write!(f, "{} '{}' not found", entity, id),
            ServiceError::Conflict(msg) => write!(f, "{}", msg),
            ServiceError::Unauthenticated => write!(f, "Authentication required"),
            ServiceError::Denied => write!(f, "Access denied"),
            ServiceError::Store(msg) => write!(f, "{}", msg),
        }
    }
}

impl Error for ServiceError {}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, key } => ServiceError::NotFound { entity, id: key },
            StoreError::DuplicateKey { .. } | StoreError::KeysExhausted { .. } => {
                ServiceError::Conflict(err.to_string())
            }
            other => ServiceError::Store(other.to_string()),
        }
    }
}

impl From<AccessError> for ServiceError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthenticated => ServiceError::Unauthenticated,
            AccessError::Denied => ServiceError::Denied,
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        ServiceError::Store(format!("Password hashing failed: {}", err))
    }
}

pub(crate) fn require_text(value: &str, label: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(format!("{} is required", label)));
    }
    Ok(())
}
