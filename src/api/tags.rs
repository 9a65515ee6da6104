// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::{ApiResult, ForCaller};
use super::{CountQuery, KeywordQuery};
use crate::app_state::AppState;
use crate::iam::Caller;
use crate::services::tags::TagInput;
use actix_web::{HttpResponse, web};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tags")
            .route("", web::get().to(list))
            .route("", web::post().to(create))
            .route("/popular", web::get().to(popular))
            .route("/in-use", web::get().to(in_use))
            .route("/{id}", web::get().to(get))
            .route("/{id}", web::put().to(update))
            .route("/{id}", web::delete().to(delete))
            .route("/{id}/articles", web::get().to(articles)),
    );
}

async fn list(state: web::Data<AppState>, query: web::Query<KeywordQuery>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.services.tags.list(query.keyword.as_deref()).await))
}

async fn popular(state: web::Data<AppState>, query: web::Query<CountQuery>) -> ApiResult {
    let count = query.count.unwrap_or(0);
    Ok(HttpResponse::Ok().json(state.services.tags.most_used(count).await))
}

async fn in_use(state: web::Data<AppState>) -> ApiResult {
    Ok(HttpResponse::Ok().json(state.services.tags.with_articles().await))
}

async fn get(caller: Caller, state: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    let tag = state
        .services
        .tags
        .get(path.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(tag))
}

async fn articles(caller: Caller, state: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    let tag = state
        .services
        .tags
        .get(path.into_inner())
        .await
        .for_caller(&caller)?;
    let articles = state.services.articles.by_tag(tag.id).await;
    Ok(HttpResponse::Ok().json(articles))
}

async fn create(
    caller: Caller,
    state: web::Data<AppState>,
    payload: web::Json<TagInput>,
) -> ApiResult {
    let tag = state
        .services
        .tags
        .create(caller.identity(), payload.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Created().json(tag))
}

async fn update(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<i32>,
    payload: web::Json<TagInput>,
) -> ApiResult {
    let tag = state
        .services
        .tags
        .update(caller.identity(), path.into_inner(), payload.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(tag))
}

async fn delete(caller: Caller, state: web::Data<AppState>, path: web::Path<i32>) -> ApiResult {
    state
        .services
        .tags
        .delete(caller.identity(), path.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::NoContent().finish())
}
