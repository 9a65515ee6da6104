// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::models::{Account, ArticleTag, Category, NewsArticle, Tag};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The full relational dataset: four entity tables plus the article/tag junction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub accounts: BTreeMap<i16, Account>,
    #[serde(default)]
    pub categories: BTreeMap<i16, Category>,
    #[serde(default)]
    pub articles: BTreeMap<String, NewsArticle>,
    #[serde(default)]
    pub tags: BTreeMap<i32, Tag>,
    #[serde(default)]
    pub article_tags: BTreeSet<ArticleTag>,
}

impl Tables {
    pub fn tag_ids_for_article(&self, article_id: &str) -> BTreeSet<i32> {
        self.article_tags
            .iter()
            .filter(|link| link.article_id == article_id)
            .map(|link| link.tag_id)
            .collect()
    }

    pub fn article_ids_for_tag(&self, tag_id: i32) -> BTreeSet<String> {
        self.article_tags
            .iter()
            .filter(|link| link.tag_id == tag_id)
            .map(|link| link.article_id.clone())
            .collect()
    }

    pub fn tag_usage(&self, tag_id: i32) -> usize {
        self.article_tags
            .iter()
            .filter(|link| link.tag_id == tag_id)
            .count()
    }

    pub fn articles_in_category(&self, category_id: i16) -> usize {
        self.articles
            .values()
            .filter(|article| article.category_id == Some(category_id))
            .count()
    }

    pub fn articles_by_author(&self, account_id: i16) -> usize {
        self.articles
            .values()
            .filter(|article| article.created_by == account_id)
            .count()
    }
}
