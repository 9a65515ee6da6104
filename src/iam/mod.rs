// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod identity;
pub mod middleware;
pub mod password;
pub mod policy;

pub use identity::Identity;
pub use middleware::{Caller, IdentityMiddlewareFactory, IdentityRequest, SessionId};
pub use password::{PasswordError, generate_password, hash_password, verify_password};
pub use policy::{AccessError, Requirement, authorize};
