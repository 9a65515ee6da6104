// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::{ApiResult, ForCaller};
use super::{CountQuery, KeywordQuery};
use crate::app_state::AppState;
use crate::iam::Caller;
use crate::services::articles::ArticleInput;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct ListQuery {
    keyword: Option<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/articles")
            .route("", web::get().to(list))
            .route("", web::post().to(create))
            .route("/search", web::get().to(search))
            .route("/latest", web::get().to(latest))
            .route("/next-id", web::get().to(next_id))
            .route("/report", web::get().to(report))
            .route("/{id}", web::get().to(get))
            .route("/{id}", web::put().to(update))
            .route("/{id}", web::delete().to(delete))
            .route("/{id}/publish", web::post().to(publish))
            .route("/{id}/unpublish", web::post().to(unpublish)),
    );
}

async fn list(caller: Caller, state: web::Data<AppState>, query: web::Query<ListQuery>) -> ApiResult {
    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);
    let page = state
        .services
        .articles
        .list_paged(
            caller.identity(),
            query.keyword.as_deref(),
            query.page.unwrap_or(1),
            page_size,
        )
        .await;
    Ok(HttpResponse::Ok().json(page))
}

async fn search(state: web::Data<AppState>, query: web::Query<KeywordQuery>) -> ApiResult {
    let keyword = query.keyword.as_deref().unwrap_or_default();
    Ok(HttpResponse::Ok().json(state.services.articles.search(keyword).await))
}

async fn latest(state: web::Data<AppState>, query: web::Query<CountQuery>) -> ApiResult {
    let count = query.count.unwrap_or(0);
    Ok(HttpResponse::Ok().json(state.services.articles.latest(count).await))
}

async fn next_id(state: web::Data<AppState>) -> ApiResult {
    Ok(HttpResponse::Ok().json(json!({ "id": state.services.articles.next_id().await })))
}

async fn report(
    caller: Caller,
    state: web::Data<AppState>,
    query: web::Query<ReportQuery>,
) -> ApiResult {
    let report = state
        .services
        .articles
        .report(caller.identity(), query.start_date, query.end_date)
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(report))
}

async fn get(caller: Caller, state: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let details = state
        .services
        .articles
        .get_visible(caller.identity(), &path)
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(details))
}

async fn create(
    caller: Caller,
    state: web::Data<AppState>,
    payload: web::Json<ArticleInput>,
) -> ApiResult {
    let details = state
        .services
        .articles
        .create(caller.identity(), payload.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Created().json(details))
}

async fn update(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ArticleInput>,
) -> ApiResult {
    let details = state
        .services
        .articles
        .update(caller.identity(), &path, payload.into_inner())
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(details))
}

async fn delete(caller: Caller, state: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    state
        .services
        .articles
        .delete(caller.identity(), &path)
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::NoContent().finish())
}

async fn publish(caller: Caller, state: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let article = state
        .services
        .articles
        .publish(caller.identity(), &path)
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(article))
}

async fn unpublish(
    caller: Caller,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult {
    let article = state
        .services
        .articles
        .unpublish(caller.identity(), &path)
        .await
        .for_caller(&caller)?;
    Ok(HttpResponse::Ok().json(article))
}
