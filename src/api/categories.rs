// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::KeywordQuery;
use super::errors::{ApiResult, ForCaller};
use crate::app_state::AppState;
use crate::iam::Caller;
use crate::services::categories::CategoryInput;
use actix_web::{HttpResponse, web};
use serde_json::json;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/categories")
            .route("", web::get().to(list))
            .route("", web::post().to(create))
            .route("/roots", web::get().to(roots))
            .route("/{id}", web::get().to(details))
            .route("/{id}", web::put().to(update))
            .route("/{id}", web::delete().to(delete))
            .route("/{id}/can-delete", web::get().to(can_delete))
            .route("/{id}/children", web::get().to(children))
            .route("/{id}/articles", web::get().to(articles)),
    );
}

async fn list(
    caller: Caller,
    state: web::Data<AppState>,
    query: web::Query<KeywordQuery>,
) -> ApiResult {
    let categories = state
        .services
        .categories
        .list(caller.identity(), query.keyword.as_deref())
        .await;
    Ok(HttpResponse::Ok().json(categories))
}

async fn roots(state: web::Data<AppState>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.services.categories.roots().await))
}

async fn details(caller: Caller, state: web::Data<AppState>, path: web::Path<i16>) -> ApiResult {
    let details = state
        .services
        .categories
        .details(caller.identity(), path.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(details))
}

async fn children(state: web::Data<AppState>, path: web::Path<i16>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.services.categories.children(path.into_inner()).await))
}

async fn articles(caller: Caller, state: web::Data<AppState>, path: web::Path<i16>) -> ApiResult {
    let details = state
        .services
        .categories
        .details(caller.identity(), path.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(details.articles))
}

async fn can_delete(caller: Caller, state: web::Data<AppState>, path: web::Path<i16>) -> ApiResult {
    let id = path.into_inner();
    let can_delete = state
        .services
        .categories
        .can_delete(id)
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(json!({ "id": id, "can_delete": can_delete })))
}

async fn create(
    caller: Caller,
    state: web::Data<AppState>,
    payload: web::Json<CategoryInput>,
) -> ApiResult {
    let category = state
        .services
        .categories
        .create(caller.identity(), payload.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Created().json(category))
}

async fn update(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<i16>,
    payload: web::Json<CategoryInput>,
) -> ApiResult {
    let category = state
        .services
        .categories
        .update(caller.identity(), path.into_inner(), payload.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(category))
}

async fn delete(caller: Caller, state: web::Data<AppState>, path: web::Path<i16>) -> ApiResult {
    state
        .services
        .categories
        .delete(caller.identity(), path.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::NoContent().finish())
}
