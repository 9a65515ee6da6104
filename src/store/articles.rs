// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::models::{NewsArticle, Tag};
use super::repository::{Entity, Repository};
use super::tables::Tables;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub type ArticleRepository = Repository<NewsArticle>;

impl Entity for NewsArticle {
    type Key = String;

    const LABEL: &'static str = "News article";

    fn key(&self) -> String {
        self.id.clone()
    }

    fn table(tables: &Tables) -> &BTreeMap<String, NewsArticle> {
        &tables.articles
    }

    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<String, NewsArticle> {
        &mut tables.articles
    }

    fn release_dependents(tables: &mut Tables, key: &String) {
        let removed = super::associations::detach_all_tags(tables, key);
        if removed > 0 {
            log::debug!("Removed {} tag link(s) of article {}", removed, key);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleDetails {
    pub article: NewsArticle,
    pub tags: Vec<Tag>,
}

/// Newest first; ties broken by id so listings are stable.
pub(crate) fn newest_first(left: &NewsArticle, right: &NewsArticle) -> Ordering {
    right
        .created_at
        .cmp(&left.created_at)
        .then_with(|| left.id.cmp(&right.id))
}

fn published_where(tables: &Tables, predicate: impl Fn(&NewsArticle) -> bool) -> Vec<NewsArticle> {
    let mut articles: Vec<NewsArticle> = tables
        .articles
        .values()
        .filter(|article| article.status.is_published() && predicate(article))
        .cloned()
        .collect();
    articles.sort_by(newest_first);
    articles
}

pub(crate) fn details_in(tables: &Tables, article_id: &str) -> Option<ArticleDetails> {
    let article = tables.articles.get(article_id)?.clone();
    let tags = tables
        .tag_ids_for_article(article_id)
        .into_iter()
        .filter_map(|tag_id| tables.tags.get(&tag_id).cloned())
        .collect();
    Some(ArticleDetails { article, tags })
}

/// Case-sensitive substring match over title, headline and content.
pub fn matches_keyword(article: &NewsArticle, keyword: &str) -> bool {
    article.title.contains(keyword)
        || article.headline.contains(keyword)
        || article.content.contains(keyword)
}

impl Repository<NewsArticle> {
    pub async fn active(&self) -> Vec<NewsArticle> {
        self.database()
            .read(|tables| published_where(tables, |_| true))
            .await
    }

    pub async fn by_category(&self, category_id: i16) -> Vec<NewsArticle> {
        self.database()
            .read(|tables| {
                published_where(tables, |article| article.category_id == Some(category_id))
            })
            .await
    }

    pub async fn by_author(&self, account_id: i16) -> Vec<NewsArticle> {
        self.database()
            .read(|tables| published_where(tables, |article| article.created_by == account_id))
            .await
    }

    pub async fn by_tag(&self, tag_id: i32) -> Vec<NewsArticle> {
        self.database()
            .read(|tables| {
                let tagged = tables.article_ids_for_tag(tag_id);
                published_where(tables, |article| tagged.contains(&article.id))
            })
            .await
    }

    /// Blank keywords match nothing.
    pub async fn search(&self, keyword: &str) -> Vec<NewsArticle> {
        if keyword.trim().is_empty() {
            return Vec::new();
        }
        self.database()
            .read(|tables| published_where(tables, |article| matches_keyword(article, keyword)))
            .await
    }

    pub async fn latest(&self, count: usize) -> Vec<NewsArticle> {
        let mut articles = self.active().await;
        articles.truncate(count);
        articles
    }

    /// Inclusive on both bounds. Callers check `start <= end`.
    pub async fn by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<NewsArticle> {
        self.database()
            .read(|tables| {
                published_where(tables, |article| {
                    article.created_at >= start && article.created_at <= end
                })
            })
            .await
    }

    pub async fn with_tags(&self, article_id: &str) -> Option<ArticleDetails> {
        self.database()
            .read(|tables| details_in(tables, article_id))
            .await
    }

    pub async fn ids(&self) -> Vec<String> {
        self.database()
            .read(|tables| tables.articles.keys().cloned().collect())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;
    use crate::store::StoreError;
    use crate::store::models::{ArticleStatus, ArticleTag};
    use chrono::TimeZone;

    fn article(id: &str, day: u32, status: ArticleStatus) -> NewsArticle {
        NewsArticle {
            id: id.to_string(),
            title: format!("Title {}", id),
            headline: format!("Headline {}", id),
            content: format!("Body of article {}", id),
            source: None,
            category_id: Some(if day % 2 == 0 { 2 } else { 1 }),
            status,
            created_by: if day < 3 { 10 } else { 11 },
            created_at: Utc.with_ymd_and_hms(2025, 5, day, 12, 0, 0).unwrap(),
            updated_by: None,
            modified_at: None,
        }
    }

    async fn fixture() -> ArticleRepository {
        let repo = ArticleRepository::new(Database::in_memory());
        repo.add(article("1", 1, ArticleStatus::Published)).await.expect("1");
        repo.add(article("2", 2, ArticleStatus::Published)).await.expect("2");
        repo.add(article("3", 3, ArticleStatus::Unpublished)).await.expect("3");
        repo.add(article("4", 4, ArticleStatus::Published)).await.expect("4");
        repo.database()
            .commit(|tables| {
                tables.tags.insert(
                    5,
                    Tag {
                        id: 5,
                        name: "Campus".to_string(),
                        note: None,
                    },
                );
                tables.article_tags.insert(ArticleTag::new("2", 5));
                tables.article_tags.insert(ArticleTag::new("3", 5));
                Ok::<_, StoreError>(())
            })
            .await
            .expect("tags");
        repo
    }

    fn ids(articles: &[NewsArticle]) -> Vec<&str> {
        articles.iter().map(|a| a.id.as_str()).collect()
    }

    #[tokio::test]
    async fn published_queries_are_newest_first() {
        let repo = fixture().await;
        assert_eq!(ids(&repo.active().await), vec!["4", "2", "1"]);
        assert_eq!(ids(&repo.by_category(2).await), vec!["4", "2"]);
        assert_eq!(ids(&repo.by_author(11).await), vec!["4"]);
        assert_eq!(ids(&repo.by_tag(5).await), vec!["2"]);
        assert_eq!(ids(&repo.latest(2).await), vec!["4", "2"]);
    }

    #[tokio::test]
    async fn search_is_case_sensitive_and_blank_matches_nothing() {
        let repo = fixture().await;
        assert_eq!(ids(&repo.search("article 4").await), vec!["4"]);
        assert!(repo.search("ARTICLE 4").await.is_empty());
        assert!(repo.search("   ").await.is_empty());
        assert!(repo.search("Headline 3").await.is_empty());
    }

    #[tokio::test]
    async fn date_range_is_inclusive() {
        let repo = fixture().await;
        let start = Utc.with_ymd_and_hms(2025, 5, 2, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 5, 4, 12, 0, 0).unwrap();
        assert_eq!(ids(&repo.by_date_range(start, end).await), vec!["4", "2"]);
    }

    #[tokio::test]
    async fn deleting_an_article_drops_its_tag_links_but_not_tags() {
        let repo = fixture().await;
        repo.delete(&"2".to_string()).await.expect("delete");
        let (links, tags) = repo
            .database()
            .read(|tables| (tables.article_tags.len(), tables.tags.len()))
            .await;
        assert_eq!(links, 1);
        assert_eq!(tags, 1);
        let details = repo.with_tags("3").await.expect("details");
        assert_eq!(details.tags.len(), 1);
    }
}
