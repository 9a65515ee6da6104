// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;

/// Account roles. Stored and exchanged as their numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Admin,
    Staff,
    Lecturer,
}

pub const ALL_ROLES: [Role; 3] = [Role::Admin, Role::Staff, Role::Lecturer];

/// Role handed out when none is requested, including public registration.
pub const LOWEST_PRIVILEGE_ROLE: Role = Role::Lecturer;

#[derive(Debug)]
pub struct RoleValidationError {
    message: String,
}

impl RoleValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RoleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for RoleValidationError {}

impl Role {
    pub fn code(self) -> u8 {
        match self {
            Role::Admin => 1,
            Role::Staff => 2,
            Role::Lecturer => 3,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, RoleValidationError> {
        match code {
            1 => Ok(Role::Admin),
            2 => Ok(Role::Staff),
            3 => Ok(Role::Lecturer),
            other => Err(RoleValidationError::new(format!(
                "Role code {} is not one of 1 (admin), 2 (staff), 3 (lecturer)",
                other
            ))),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Lecturer => "lecturer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Role::from_code(code).map_err(serde::de::Error::custom)
    }
}
