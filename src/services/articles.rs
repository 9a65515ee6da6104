// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::Page;
use super::errors::{ServiceError, require_text};
use crate::iam::Identity;
use crate::iam::policy::{self, Requirement, authorize};
use crate::notify::{ChangeNotifier, ChangeSignal};
use crate::store::articles::{ArticleDetails, ArticleRepository, details_in, matches_keyword, newest_first};
use crate::store::associations::{TagSyncOutcome, attach_tags, sync_tags};
use crate::store::{ArticleStatus, Database, NewsArticle, Repository, Tables};
use chrono::{DateTime, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_LATEST_COUNT: i64 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleInput {
    /// Only read on create; the id of an existing article never changes.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub category_id: Option<i16>,
    #[serde(default)]
    pub status: Option<ArticleStatus>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// `None` leaves the tag set alone on update.
    #[serde(default)]
    pub tag_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub articles: Vec<NewsArticle>,
    pub total: usize,
}

/// Next id for numeric-string articles: highest purely numeric id plus one.
/// Other ids are ignored; with no numeric ids the answer is "1".
pub fn next_article_id<'a>(ids: impl IntoIterator<Item = &'a str>) -> String {
    let highest = ids
        .into_iter()
        .filter(|id| !id.is_empty() && id.bytes().all(|byte| byte.is_ascii_digit()))
        .filter_map(|id| id.parse::<u64>().ok())
        .max();
    match highest {
        Some(max) => max.saturating_add(1).to_string(),
        None => "1".to_string(),
    }
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn ensure_category(tables: &Tables, category_id: Option<i16>) -> Result<(), ServiceError> {
    match category_id {
        Some(id) if !tables.categories.contains_key(&id) => Err(ServiceError::validation(
            format!("Category {} does not exist", id),
        )),
        _ => Ok(()),
    }
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn day_end(date: NaiveDate) -> Result<DateTime<Utc>, ServiceError> {
    date.and_hms_nano_opt(23, 59, 59, 999_999_999)
        .map(|end| end.and_utc())
        .ok_or_else(|| ServiceError::validation(format!("Invalid end date {}", date)))
}

#[derive(Clone)]
pub struct ArticleService {
    articles: ArticleRepository,
    notifier: ChangeNotifier,
}

impl ArticleService {
    pub fn new(db: Database, notifier: ChangeNotifier) -> Self {
        Self {
            articles: Repository::new(db),
            notifier,
        }
    }

    pub fn repository(&self) -> &ArticleRepository {
        &self.articles
    }

    pub async fn next_id(&self) -> String {
        let ids = self.articles.ids().await;
        next_article_id(ids.iter().map(String::as_str))
    }

    /// Article with its tags. Unpublished articles look missing to callers that may not see them.
    pub async fn get_visible(
        &self,
        caller: Option<&Identity>,
        id: &str,
    ) -> Result<ArticleDetails, ServiceError> {
        match self.articles.with_tags(id).await {
            Some(details)
                if details.article.status.is_published() || policy::sees_unpublished(caller) =>
            {
                Ok(details)
            }
            _ => Err(ServiceError::not_found("News article", id)),
        }
    }

    /// One page, newest first. Admin and staff see every status, everyone else only
    /// published articles. A keyword narrows the listing to matching articles.
    pub async fn list_paged(
        &self,
        caller: Option<&Identity>,
        keyword: Option<&str>,
        page_number: usize,
        page_size: usize,
    ) -> Page<NewsArticle> {
        let all_statuses = policy::sees_unpublished(caller);
        let keyword = keyword.filter(|keyword| !keyword.trim().is_empty());
        let visible = move |article: &NewsArticle| {
            (all_statuses || article.status.is_published())
                && keyword.is_none_or(|keyword| matches_keyword(article, keyword))
        };

        let total = self.articles.count(Some(&visible)).await;
        let items = self
            .articles
            .get_paged_by(Some(&visible), Some(&newest_first), page_number, page_size)
            .await;
        Page {
            items,
            page: page_number.max(1),
            page_size,
            total,
        }
    }

    pub async fn active(&self) -> Vec<NewsArticle> {
        self.articles.active().await
    }

    pub async fn by_category(&self, category_id: i16) -> Vec<NewsArticle> {
        self.articles.by_category(category_id).await
    }

    pub async fn by_author(&self, account_id: i16) -> Vec<NewsArticle> {
        self.articles.by_author(account_id).await
    }

    pub async fn by_tag(&self, tag_id: i32) -> Vec<NewsArticle> {
        self.articles.by_tag(tag_id).await
    }

    pub async fn search(&self, keyword: &str) -> Vec<NewsArticle> {
        self.articles.search(keyword).await
    }

    /// `count <= 0` falls back to ten.
    pub async fn latest(&self, count: i64) -> Vec<NewsArticle> {
        let count = if count <= 0 { DEFAULT_LATEST_COUNT } else { count };
        self.articles
            .latest(usize::try_from(count).unwrap_or(usize::MAX))
            .await
    }

    pub async fn by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<NewsArticle>, ServiceError> {
        if start > end {
            return Err(ServiceError::validation(
                "Start date must be before end date",
            ));
        }
        Ok(self.articles.by_date_range(start, end).await)
    }

    /// Published articles created between two calendar days, both included. Without
    /// both bounds the period is the last month up to today.
    pub async fn report(
        &self,
        caller: Option<&Identity>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<ArticleReport, ServiceError> {
        authorize(caller, Requirement::Admin)?;

        let (start_date, end_date) = match (start_date, end_date) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                let today = Utc::now().date_naive();
                let month_ago = today.checked_sub_months(Months::new(1)).unwrap_or(today);
                (month_ago, today)
            }
        };
        let articles = self
            .by_date_range(day_start(start_date), day_end(end_date)?)
            .await?;
        Ok(ArticleReport {
            start_date,
            end_date,
            total: articles.len(),
            articles,
        })
    }

    pub async fn create(
        &self,
        caller: Option<&Identity>,
        input: ArticleInput,
    ) -> Result<ArticleDetails, ServiceError> {
        let author = authorize(caller, Requirement::AdminOrStaff)?;
        require_text(&input.id, "News article ID")?;
        require_text(&input.headline, "Headline")?;

        let article = NewsArticle {
            id: input.id.trim().to_string(),
            title: input.title.trim().to_string(),
            headline: input.headline.trim().to_string(),
            content: input.content,
            source: optional_text(input.source),
            category_id: input.category_id,
            status: input.status.unwrap_or_default(),
            created_by: author.account_id,
            created_at: input.created_at.unwrap_or_else(Utc::now),
            updated_by: None,
            modified_at: None,
        };
        let tag_ids = input.tag_ids.unwrap_or_default();

        let (details, outcome) = self
            .articles
            .database()
            .commit(|tables| {
                if tables.articles.contains_key(&article.id) {
                    return Err(ServiceError::conflict(format!(
                        "News article with ID {} already exists",
                        article.id
                    )));
                }
                ensure_category(tables, article.category_id)?;
                let id = article.id.clone();
                ArticleRepository::insert_into(tables, article)?;
                let outcome = attach_tags(tables, &id, &tag_ids);
                let details = details_in(tables, &id)
                    .ok_or_else(|| ServiceError::not_found("News article", &id))?;
                Ok((details, outcome))
            })
            .await?;

        log_tag_outcome(&details.article.id, &outcome);
        log::info!(
            "News article {} created by account {}",
            details.article.id,
            details.article.created_by
        );
        self.notifier.publish(ChangeSignal::ArticlesChanged);
        Ok(details)
    }

    pub async fn update(
        &self,
        caller: Option<&Identity>,
        id: &str,
        input: ArticleInput,
    ) -> Result<ArticleDetails, ServiceError> {
        let editor = authorize(caller, Requirement::AdminOrStaff)?;
        let editor_id = editor.account_id;

        let (details, outcome) = self
            .articles
            .database()
            .commit(|tables| {
                let existing = tables
                    .articles
                    .get(id)
                    .cloned()
                    .ok_or_else(|| ServiceError::not_found("News article", id))?;
                require_text(&input.headline, "Headline")?;
                ensure_category(tables, input.category_id)?;

                let article = NewsArticle {
                    id: existing.id.clone(),
                    title: input.title.trim().to_string(),
                    headline: input.headline.trim().to_string(),
                    content: input.content.clone(),
                    source: optional_text(input.source.clone()),
                    category_id: input.category_id,
                    status: input.status.unwrap_or(existing.status),
                    created_by: existing.created_by,
                    created_at: existing.created_at,
                    updated_by: Some(editor_id),
                    modified_at: Some(Utc::now()),
                };
                ArticleRepository::replace_in(tables, article)?;
                let outcome = match &input.tag_ids {
                    Some(tag_ids) => sync_tags(tables, id, tag_ids),
                    None => TagSyncOutcome::default(),
                };
                let details = details_in(tables, id)
                    .ok_or_else(|| ServiceError::not_found("News article", id))?;
                Ok::<_, ServiceError>((details, outcome))
            })
            .await?;

        log_tag_outcome(id, &outcome);
        log::info!("News article {} updated by account {}", id, editor_id);
        self.notifier.publish(ChangeSignal::ArticlesChanged);
        Ok(details)
    }

    /// Removes the article and its tag links in one commit; the tags stay.
    pub async fn delete(&self, caller: Option<&Identity>, id: &str) -> Result<(), ServiceError> {
        authorize(caller, Requirement::AdminOrStaff)?;
        self.articles
            .database()
            .commit(|tables| {
                ArticleRepository::remove_from(tables, &id.to_string())?;
                Ok::<_, ServiceError>(())
            })
            .await?;

        log::info!("News article {} deleted", id);
        self.notifier.publish(ChangeSignal::ArticlesChanged);
        Ok(())
    }

    pub async fn publish(
        &self,
        caller: Option<&Identity>,
        id: &str,
    ) -> Result<NewsArticle, ServiceError> {
        self.set_status(caller, id, ArticleStatus::Published).await
    }

    pub async fn unpublish(
        &self,
        caller: Option<&Identity>,
        id: &str,
    ) -> Result<NewsArticle, ServiceError> {
        self.set_status(caller, id, ArticleStatus::Unpublished).await
    }

    async fn set_status(
        &self,
        caller: Option<&Identity>,
        id: &str,
        status: ArticleStatus,
    ) -> Result<NewsArticle, ServiceError> {
        let editor = authorize(caller, Requirement::AdminOrStaff)?;
        let editor_id = editor.account_id;
        let article = self
            .articles
            .database()
            .commit(|tables| {
                let article = tables
                    .articles
                    .get_mut(id)
                    .ok_or_else(|| ServiceError::not_found("News article", id))?;
                article.status = status;
                article.updated_by = Some(editor_id);
                article.modified_at = Some(Utc::now());
                Ok::<_, ServiceError>(article.clone())
            })
            .await?;

        log::info!("News article {} is now {:?}", id, status);
        self.notifier.publish(ChangeSignal::ArticlesChanged);
        Ok(article)
    }
}

fn log_tag_outcome(article_id: &str, outcome: &TagSyncOutcome) {
    if outcome.changed() {
        log::debug!(
            "Tags of article {}: added {:?}, removed {:?}",
            article_id,
            outcome.added,
            outcome.removed
        );
    }
    if !outcome.dropped.is_empty() {
        log::debug!(
            "Ignored unknown tag ids {:?} for article {}",
            outcome.dropped,
            article_id
        );
    }
}
