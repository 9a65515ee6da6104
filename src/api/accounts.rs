// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::{ApiResult, ForCaller};
use crate::app_state::AppState;
use crate::iam::Caller;
use crate::roles::Role;
use crate::services::ServiceError;
use crate::services::accounts::AccountInput;
use actix_web::{HttpResponse, web};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct AccountListQuery {
    keyword: Option<String>,
    role: Option<u8>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/accounts")
            .route("", web::get().to(list))
            .route("", web::post().to(create))
            .route("/{id}", web::get().to(get))
            .route("/{id}", web::put().to(update))
            .route("/{id}", web::delete().to(delete))
            .route("/{id}/articles", web::get().to(articles)),
    );
}

async fn list(
    caller: Caller,
    state: web::Data<AppState>,
    query: web::Query<AccountListQuery>,
) -> ApiResult {
    let accounts = match query.role {
        Some(code) => {
            let role = Role::from_code(code)
                .map_err(|err| ServiceError::validation(err.to_string()))
                .for_caller(&caller)?;
            state.services.accounts.by_role(caller.identity(), role).await
        }
        None => {
            state
                .services
                .accounts
                .list(caller.identity(), query.keyword.as_deref())
                .await
        }
    }
    .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(accounts))
}

async fn get(caller: Caller, state: web::Data<AppState>, path: web::Path<i16>) -> ApiResult {
    let account = state
        .services
        .accounts
        .get(caller.identity(), path.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(account))
}

async fn articles(state: web::Data<AppState>, path: web::Path<i16>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.services.articles.by_author(path.into_inner()).await))
}

async fn create(
    caller: Caller,
    state: web::Data<AppState>,
    payload: web::Json<AccountInput>,
) -> ApiResult {
    let account = state
        .services
        .accounts
        .create(caller.identity(), payload.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Created().json(account))
}

/// Live sessions of the edited account pick up the new name, email and role.
async fn update(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<i16>,
    payload: web::Json<AccountInput>,
) -> ApiResult {
    let id = path.into_inner();
    let account = state
        .services
        .accounts
        .update(caller.identity(), id, payload.into_inner())
        .await
        .for_caller(&caller)?;
    super::refresh_sessions(&state, id).await;
    Ok(HttpResponse::Ok().json(account))
}

async fn delete(caller: Caller, state: web::Data<AppState>, path: web::Path<i16>) -> ApiResult {
    let id = path.into_inner();
    state
        .services
        .accounts
        .delete(caller.identity(), id)
        .await
        .for_caller(&caller)?;
    if let Err(err) = state.sessions.revoke_account(id).await {
        log::error!("Sessions of deleted account {} were not revoked: {}", id, err);
    }
    Ok(HttpResponse::NoContent().finish())
}
