// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::{ApiResult, ForCaller};
use crate::app_state::AppState;
use crate::iam::policy::{Requirement, authorize};
use crate::iam::Caller;
use crate::services::ServiceError;
use crate::services::accounts::{PasswordChangeInput, ProfileInput};
use actix_web::{HttpResponse, web};
use serde_json::json;

pub async fn me(caller: Caller) -> ApiResult {
    let identity = authorize(caller.identity(), Requirement::Authenticated)
        .map_err(ServiceError::from)
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(identity))
}

pub async fn get_profile(caller: Caller, state: web::Data<AppState>) -> ApiResult {
    let profile = state
        .services
        .accounts
        .profile(caller.identity())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn update_profile(
    caller: Caller,
    state: web::Data<AppState>,
    payload: web::Json<ProfileInput>,
) -> ApiResult {
    let profile = state
        .services
        .accounts
        .update_profile(caller.identity(), payload.into_inner())
        .await
        .for_caller(&caller)?;
    super::refresh_sessions(&state, profile.id).await;
    Ok(HttpResponse::Ok().json(profile))
}

pub async fn change_password(
    caller: Caller,
    state: web::Data<AppState>,
    payload: web::Json<PasswordChangeInput>,
) -> ApiResult {
    state
        .services
        .accounts
        .change_own_password(caller.identity(), payload.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Password changed"
    })))
}
