// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::api::errors::error_json;
use crate::api::{ApiResult, ForCaller};
use crate::app_state::AppState;
use crate::config::ValidatedConfig;
use crate::iam::{Caller, IdentityRequest};
use crate::security::validate_return_path;
use crate::services::accounts::RegistrationInput;
use actix_web::cookie::{Cookie, SameSite, time};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    return_path: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginResponse<'a> {
    success: bool,
    return_path: String,
    identity: &'a crate::iam::Identity,
}

fn session_cookie<'a>(config: &ValidatedConfig, value: String) -> Cookie<'a> {
    Cookie::build(config.session.cookie_name.clone(), value)
        .path("/")
        .secure(!config.server.is_localhost_only())
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

fn expired_session_cookie<'a>(config: &ValidatedConfig) -> Cookie<'a> {
    Cookie::build(config.session.cookie_name.clone(), "")
        .path("/")
        .secure(!config.server.is_localhost_only())
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(0))
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .finish()
}

pub(super) async fn login(
    req: HttpRequest,
    payload: web::Json<LoginRequest>,
    config: web::Data<ValidatedConfig>,
    app_state: web::Data<AppState>,
) -> ApiResult {
    let payload = payload.into_inner();
    let identity = app_state
        .services
        .accounts
        .login(&payload.email, &payload.password)
        .await?;

    let Some(identity) = identity else {
        log::info!("Login rejected");
        return Ok(error_json(
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "Invalid email or password",
        ));
    };

    let previous = req
        .cookie(&config.session.cookie_name)
        .map(|cookie| cookie.value().to_string());
    let session_id = match app_state.sessions.establish(previous, &identity).await {
        Ok(session_id) => session_id,
        Err(err) => {
            log::error!("Failed to establish session: {}", err);
            return Ok(error_json(
                StatusCode::SERVICE_UNAVAILABLE,
                "session_unavailable",
                "Login is temporarily unavailable",
            ));
        }
    };

    let return_path = payload
        .return_path
        .as_deref()
        .and_then(validate_return_path)
        .unwrap_or_else(|| "/".to_string());
    log::info!(
        "Account {} logged in as {}",
        identity.account_id,
        identity.role
    );
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&config, session_id))
        .json(LoginResponse {
            success: true,
            return_path,
            identity: &identity,
        }))
}

pub(super) async fn logout(
    req: HttpRequest,
    config: web::Data<ValidatedConfig>,
    app_state: web::Data<AppState>,
) -> ApiResult {
    if let Some(session_id) = req.session_id() {
        if let Err(err) = app_state.sessions.clear(&session_id).await {
            log::warn!("Logout could not clear session: {}", err);
        }
    }
    Ok(HttpResponse::Ok()
        .cookie(expired_session_cookie(&config))
        .json(json!({
            "success": true,
            "message": "Logged out successfully",
            "redirect_url": "/login"
        })))
}

pub(super) async fn register(
    caller: Caller,
    payload: web::Json<RegistrationInput>,
    app_state: web::Data<AppState>,
) -> ApiResult {
    let account = app_state
        .services
        .accounts
        .register(payload.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Created().json(account))
}

pub(super) async fn access_denied() -> HttpResponse {
    error_json(
        StatusCode::FORBIDDEN,
        "access_denied",
        "You do not have permission to perform this action",
    )
}
