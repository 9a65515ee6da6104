// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::web;

mod handlers;
mod sessions;

pub use sessions::{SessionError, SessionStore};

/// Login, logout, registration and the access-denied landing route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::post().to(handlers::login))
        .route("/logout", web::post().to(handlers::logout))
        .route("/register", web::post().to(handlers::register))
        .route("/access-denied", web::get().to(handlers::access_denied));
}
