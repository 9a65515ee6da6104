// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::app_state::AppState;
use actix_web::web;
use serde::Deserialize;

mod accounts;
mod articles;
mod categories;
pub mod errors;
mod profile;
mod tags;

pub use errors::{ApiError, ApiResult, ForCaller};

#[derive(Debug, Deserialize)]
struct KeywordQuery {
    keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CountQuery {
    count: Option<i64>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/me", web::get().to(profile::me))
            .route("/profile", web::get().to(profile::get_profile))
            .route("/profile", web::put().to(profile::update_profile))
            .route("/profile/password", web::post().to(profile::change_password))
            .route(
                "/notifications",
                web::get().to(crate::notify::ws::notifications_ws),
            )
            .configure(categories::configure)
            .configure(tags::configure)
            .configure(articles::configure)
            .configure(accounts::configure),
    );
}

/// Rewrites the identity held by every live session of `account_id`.
async fn refresh_sessions(state: &AppState, account_id: i16) {
    let Some(identity) = state.services.accounts.identity(account_id).await else {
        return;
    };
    match state.sessions.refresh_account(&identity).await {
        Ok(refreshed) if refreshed > 0 => {
            log::debug!("Refreshed {} session(s) of account {}", refreshed, account_id)
        }
        Ok(_) => {}
        Err(err) => log::warn!("Session refresh for account {} failed: {}", account_id, err),
    }
}
