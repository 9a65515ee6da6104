// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::articles::newest_first;
use super::errors::StoreError;
use super::models::{Category, NewsArticle};
use super::repository::{Entity, Repository, next_key};
use super::tables::Tables;
use serde::Serialize;
use std::collections::BTreeMap;

pub type CategoryRepository = Repository<Category>;

impl Entity for Category {
    type Key = i16;

    const LABEL: &'static str = "Category";

    fn key(&self) -> i16 {
        self.id
    }

    fn table(tables: &Tables) -> &BTreeMap<i16, Category> {
        &tables.categories
    }

    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<i16, Category> {
        &mut tables.categories
    }

    fn assign_key(&mut self, tables: &Tables) -> Result<(), StoreError> {
        if self.id <= 0 {
            self.id = next_key(&tables.categories).ok_or(StoreError::KeysExhausted {
                entity: Self::LABEL,
            })?;
        }
        Ok(())
    }
}

/// A category with the articles filed under it and its direct children.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetails {
    pub category: Category,
    pub articles: Vec<NewsArticle>,
    pub children: Vec<Category>,
}

pub(crate) fn by_name(left: &Category, right: &Category) -> std::cmp::Ordering {
    left.name.cmp(&right.name).then(left.id.cmp(&right.id))
}

fn sorted(mut categories: Vec<Category>) -> Vec<Category> {
    categories.sort_by(by_name);
    categories
}

impl Repository<Category> {
    pub async fn all_by_name(&self) -> Vec<Category> {
        sorted(self.get_all().await)
    }

    pub async fn active(&self) -> Vec<Category> {
        sorted(self.find(|category| category.is_active).await)
    }

    pub async fn roots(&self) -> Vec<Category> {
        sorted(
            self.find(|category| category.parent_id.is_none() && category.is_active)
                .await,
        )
    }

    pub async fn subcategories(&self, parent_id: i16) -> Vec<Category> {
        sorted(
            self.find(|category| category.parent_id == Some(parent_id) && category.is_active)
                .await,
        )
    }

    pub async fn with_details(&self, id: i16) -> Option<CategoryDetails> {
        self.database()
            .read(|tables| {
                let category = tables.categories.get(&id)?.clone();
                let mut articles: Vec<NewsArticle> = tables
                    .articles
                    .values()
                    .filter(|article| article.category_id == Some(id))
                    .cloned()
                    .collect();
                articles.sort_by(newest_first);
                let children = sorted(
                    tables
                        .categories
                        .values()
                        .filter(|child| child.parent_id == Some(id))
                        .cloned()
                        .collect(),
                );
                Some(CategoryDetails {
                    category,
                    articles,
                    children,
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;
    use crate::store::models::ArticleStatus;
    use chrono::{TimeZone, Utc};

    fn category(name: &str, parent_id: Option<i16>, is_active: bool) -> Category {
        Category {
            id: 0,
            name: name.to_string(),
            description: format!("{} news", name),
            parent_id,
            is_active,
        }
    }

    async fn fixture() -> CategoryRepository {
        let repo = CategoryRepository::new(Database::in_memory());
        repo.add(category("Sports", None, true)).await.expect("1");
        repo.add(category("Academics", None, true)).await.expect("2");
        repo.add(category("Football", Some(1), true)).await.expect("3");
        repo.add(category("Archived", None, false)).await.expect("4");
        repo.add(category("Chess", Some(1), false)).await.expect("5");
        repo
    }

    fn names(categories: &[Category]) -> Vec<&str> {
        categories.iter().map(|c| c.name.as_str()).collect()
    }

    #[tokio::test]
    async fn listings_are_ordered_by_name() {
        let repo = fixture().await;
        assert_eq!(
            names(&repo.all_by_name().await),
            vec!["Academics", "Archived", "Chess", "Football", "Sports"]
        );
        assert_eq!(
            names(&repo.active().await),
            vec!["Academics", "Football", "Sports"]
        );
    }

    #[tokio::test]
    async fn add_fails_cleanly_when_no_id_is_left() {
        let repo = CategoryRepository::new(Database::in_memory());
        let mut last = category("Last", None, true);
        last.id = i16::MAX;
        repo.add(last).await.expect("explicit id");

        match repo.add(category("Overflow", None, true)).await {
            Err(StoreError::KeysExhausted { entity }) => assert_eq!(entity, "Category"),
            other => panic!("expected exhausted key space, got {:?}", other),
        }
        assert_eq!(names(&repo.all_by_name().await), vec!["Last"]);
    }

    #[tokio::test]
    async fn roots_and_subcategories_skip_inactive() {
        let repo = fixture().await;
        assert_eq!(names(&repo.roots().await), vec!["Academics", "Sports"]);
        assert_eq!(names(&repo.subcategories(1).await), vec!["Football"]);
    }

    #[tokio::test]
    async fn details_include_articles_and_all_children() {
        let repo = fixture().await;
        repo.database()
            .commit(|tables| {
                tables.articles.insert(
                    "1".to_string(),
                    NewsArticle {
                        id: "1".to_string(),
                        title: "Derby".to_string(),
                        headline: "Derby day".to_string(),
                        content: "Report".to_string(),
                        source: None,
                        category_id: Some(1),
                        status: ArticleStatus::Published,
                        created_by: 1,
                        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
                        updated_by: None,
                        modified_at: None,
                    },
                );
                Ok::<_, crate::store::StoreError>(())
            })
            .await
            .expect("seed article");

        let details = repo.with_details(1).await.expect("details");
        assert_eq!(details.category.name, "Sports");
        assert_eq!(details.articles.len(), 1);
        assert_eq!(names(&details.children), vec!["Chess", "Football"]);
        assert!(repo.with_details(42).await.is_none());
    }
}
