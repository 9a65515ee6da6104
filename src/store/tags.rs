// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::StoreError;
use super::models::Tag;
use super::repository::{Entity, Repository, next_key};
use super::tables::Tables;
use serde::Serialize;
use std::collections::BTreeMap;

pub type TagRepository = Repository<Tag>;

impl Entity for Tag {
    type Key = i32;

    const LABEL: &'static str = "Tag";

    fn key(&self) -> i32 {
        self.id
    }

    fn table(tables: &Tables) -> &BTreeMap<i32, Tag> {
        &tables.tags
    }

    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<i32, Tag> {
        &mut tables.tags
    }

    fn assign_key(&mut self, tables: &Tables) -> Result<(), StoreError> {
        if self.id <= 0 {
            self.id = next_key(&tables.tags).ok_or(StoreError::KeysExhausted {
                entity: Self::LABEL,
            })?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TagUsage {
    pub tag: Tag,
    pub article_count: usize,
}

pub(crate) fn same_name(left: &str, right: &str) -> bool {
    left.trim().to_lowercase() == right.trim().to_lowercase()
}

/// Name lookup over a table snapshot, optionally ignoring one tag (the one being renamed).
pub(crate) fn name_taken(tables: &Tables, name: &str, excluding: Option<i32>) -> bool {
    tables
        .tags
        .values()
        .any(|tag| Some(tag.id) != excluding && same_name(&tag.name, name))
}

fn usage_ranking(tables: &Tables) -> Vec<TagUsage> {
    let mut usage: Vec<TagUsage> = tables
        .tags
        .values()
        .map(|tag| TagUsage {
            tag: tag.clone(),
            article_count: tables.tag_usage(tag.id),
        })
        .collect();
    usage.sort_by(|left, right| {
        right
            .article_count
            .cmp(&left.article_count)
            .then_with(|| left.tag.name.cmp(&right.tag.name))
    });
    usage
}

impl Repository<Tag> {
    pub async fn all_by_name(&self) -> Vec<Tag> {
        let mut tags = self.get_all().await;
        tags.sort_by(|left, right| left.name.cmp(&right.name).then(left.id.cmp(&right.id)));
        tags
    }

    /// Case-insensitive.
    pub async fn by_name(&self, name: &str) -> Option<Tag> {
        self.first_or_default(|tag| same_name(&tag.name, name)).await
    }

    pub async fn name_exists(&self, name: &str, excluding: Option<i32>) -> bool {
        self.database()
            .read(|tables| name_taken(tables, name, excluding))
            .await
    }

    /// Tags attached to at least one article, most used first.
    pub async fn with_articles(&self) -> Vec<TagUsage> {
        self.database()
            .read(|tables| {
                usage_ranking(tables)
                    .into_iter()
                    .filter(|usage| usage.article_count > 0)
                    .collect()
            })
            .await
    }

    pub async fn most_used(&self, count: usize) -> Vec<TagUsage> {
        self.database()
            .read(|tables| {
                let mut ranking = usage_ranking(tables);
                ranking.truncate(count);
                ranking
            })
            .await
    }

    pub async fn usage_count(&self, id: i32) -> usize {
        self.database().read(|tables| tables.tag_usage(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;
    use crate::store::StoreError;
    use crate::store::models::ArticleTag;

    fn tag(name: &str) -> Tag {
        Tag {
            id: 0,
            name: name.to_string(),
            note: None,
        }
    }

    async fn fixture() -> TagRepository {
        let repo = TagRepository::new(Database::in_memory());
        for name in ["Campus", "sports", "Events"] {
            repo.add(tag(name)).await.expect("add");
        }
        repo.database()
            .commit(|tables| {
                tables.article_tags.insert(ArticleTag::new("1", 2));
                tables.article_tags.insert(ArticleTag::new("2", 2));
                tables.article_tags.insert(ArticleTag::new("2", 3));
                Ok::<_, StoreError>(())
            })
            .await
            .expect("links");
        repo
    }

    #[tokio::test]
    async fn name_lookups_ignore_case() {
        let repo = fixture().await;
        assert_eq!(repo.by_name("SPORTS").await.map(|t| t.id), Some(2));
        assert!(repo.name_exists("campus", None).await);
        assert!(!repo.name_exists("campus", Some(1)).await);
        assert!(!repo.name_exists("Music", None).await);
    }

    #[tokio::test]
    async fn usage_rankings() {
        let repo = fixture().await;
        let with_articles: Vec<i32> = repo
            .with_articles()
            .await
            .iter()
            .map(|usage| usage.tag.id)
            .collect();
        assert_eq!(with_articles, vec![2, 3]);

        let top: Vec<(i32, usize)> = repo
            .most_used(2)
            .await
            .iter()
            .map(|usage| (usage.tag.id, usage.article_count))
            .collect();
        assert_eq!(top, vec![(2, 2), (3, 1)]);
        assert_eq!(repo.usage_count(1).await, 0);
    }
}
