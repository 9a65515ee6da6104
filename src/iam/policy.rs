// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Access decisions. Pure functions over an optional caller identity.

use super::identity::Identity;
use crate::roles::Role;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    Admin,
    AdminOrStaff,
    /// The caller is the given account, or an admin.
    AccountOwner(i16),
}

/// The two ways a gated action can be refused. Callers route them differently:
/// the first to the login flow, the second to an access-denied page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    Unauthenticated,
    Denied,
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::Unauthenticated => write!(f, "Authentication required"),
            AccessError::Denied => write!(f, "Access denied"),
        }
    }
}

impl Error for AccessError {}

/// Admin satisfies every role check.
pub fn has_role(identity: &Identity, required: Role) -> bool {
    identity.role == required || identity.role == Role::Admin
}

pub fn is_admin(identity: &Identity) -> bool {
    has_role(identity, Role::Admin)
}

pub fn is_admin_or_staff(identity: &Identity) -> bool {
    is_admin(identity) || has_role(identity, Role::Staff)
}

/// Whether unpublished articles are visible to the caller.
pub fn sees_unpublished(identity: Option<&Identity>) -> bool {
    identity.is_some_and(is_admin_or_staff)
}

pub fn authorize(
    identity: Option<&Identity>,
    requirement: Requirement,
) -> Result<&Identity, AccessError> {
    let identity = identity.ok_or(AccessError::Unauthenticated)?;
    let allowed = match requirement {
        Requirement::Authenticated => true,
        Requirement::Admin => is_admin(identity),
        Requirement::AdminOrStaff => is_admin_or_staff(identity),
        Requirement::AccountOwner(account_id) => {
            identity.account_id == account_id || is_admin(identity)
        }
    };
    if allowed {
        Ok(identity)
    } else {
        Err(AccessError::Denied)
    }
}
