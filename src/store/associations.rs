// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Maintenance of the article/tag junction table. Every function here works on a
//! table snapshot inside a single commit; tags themselves are never created or removed.

use super::models::ArticleTag;
use super::tables::Tables;
use serde::Serialize;
use std::collections::BTreeSet;

/// What a reconciliation did to one article's tag set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagSyncOutcome {
    pub added: Vec<i32>,
    pub removed: Vec<i32>,
    pub kept: Vec<i32>,
    /// Requested ids with no matching tag.
    pub dropped: Vec<i32>,
}

impl TagSyncOutcome {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

fn resolve(tables: &Tables, requested: &[i32]) -> (BTreeSet<i32>, Vec<i32>) {
    let mut known = BTreeSet::new();
    let mut dropped = BTreeSet::new();
    for tag_id in requested {
        if tables.tags.contains_key(tag_id) {
            known.insert(*tag_id);
        } else {
            dropped.insert(*tag_id);
        }
    }
    (known, dropped.into_iter().collect())
}

/// Adds the requested tags. Unknown ids are dropped and already attached ids are skipped.
pub fn attach_tags(tables: &mut Tables, article_id: &str, requested: &[i32]) -> TagSyncOutcome {
    let (desired, dropped) = resolve(tables, requested);
    let current = tables.tag_ids_for_article(article_id);
    let mut outcome = TagSyncOutcome {
        dropped,
        ..TagSyncOutcome::default()
    };
    for tag_id in desired {
        if current.contains(&tag_id) {
            outcome.kept.push(tag_id);
        } else {
            tables
                .article_tags
                .insert(ArticleTag::new(article_id, tag_id));
            outcome.added.push(tag_id);
        }
    }
    outcome
}

/// Makes the article's tag set equal to the resolved request: extra links are removed,
/// missing ones added, shared ones left as they are.
pub fn sync_tags(tables: &mut Tables, article_id: &str, requested: &[i32]) -> TagSyncOutcome {
    let (desired, dropped) = resolve(tables, requested);
    let current = tables.tag_ids_for_article(article_id);

    let removed: Vec<i32> = current.difference(&desired).copied().collect();
    for tag_id in &removed {
        tables
            .article_tags
            .remove(&ArticleTag::new(article_id, *tag_id));
    }

    let mut outcome = attach_tags(tables, article_id, &desired.into_iter().collect::<Vec<_>>());
    outcome.removed = removed;
    outcome.dropped = dropped;
    outcome
}

/// Removes every link of the article and reports how many went.
pub fn detach_all_tags(tables: &mut Tables, article_id: &str) -> usize {
    let before = tables.article_tags.len();
    tables
        .article_tags
        .retain(|link| link.article_id != article_id);
    before - tables.article_tags.len()
}

pub fn detach_tag(tables: &mut Tables, article_id: &str, tag_id: i32) -> bool {
    tables
        .article_tags
        .remove(&ArticleTag::new(article_id, tag_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::Tag;

    fn tables_with_tags(ids: &[i32]) -> Tables {
        let mut tables = Tables::default();
        for id in ids {
            tables.tags.insert(
                *id,
                Tag {
                    id: *id,
                    name: format!("tag-{}", id),
                    note: None,
                },
            );
        }
        tables
    }

    fn linked(tables: &Tables, article_id: &str) -> Vec<i32> {
        tables.tag_ids_for_article(article_id).into_iter().collect()
    }

    #[test]
    fn sync_converges_with_minimal_changes() {
        let mut tables = tables_with_tags(&[1, 2, 3, 4]);
        attach_tags(&mut tables, "a", &[1, 2, 3]);

        let outcome = sync_tags(&mut tables, "a", &[2, 3, 4]);

        assert_eq!(linked(&tables, "a"), vec![2, 3, 4]);
        assert_eq!(outcome.removed, vec![1]);
        assert_eq!(outcome.added, vec![4]);
        assert_eq!(outcome.kept, vec![2, 3]);
        assert!(outcome.dropped.is_empty());
    }

    #[test]
    fn sync_is_idempotent() {
        let mut tables = tables_with_tags(&[1, 2, 3]);
        sync_tags(&mut tables, "a", &[1, 3]);
        let after_once = tables.clone();

        let outcome = sync_tags(&mut tables, "a", &[3, 1, 3]);

        assert_eq!(tables, after_once);
        assert!(!outcome.changed());
        assert_eq!(outcome.kept, vec![1, 3]);
    }

    #[test]
    fn unknown_ids_are_dropped_silently() {
        let mut tables = tables_with_tags(&[1]);
        let outcome = sync_tags(&mut tables, "a", &[1, 99, -4]);
        assert_eq!(linked(&tables, "a"), vec![1]);
        assert_eq!(outcome.dropped, vec![-4, 99]);
    }

    #[test]
    fn attaching_an_attached_tag_is_a_no_op() {
        let mut tables = tables_with_tags(&[1, 2]);
        attach_tags(&mut tables, "a", &[1]);
        let outcome = attach_tags(&mut tables, "a", &[1, 2]);
        assert_eq!(outcome.added, vec![2]);
        assert_eq!(outcome.kept, vec![1]);
        assert_eq!(tables.article_tags.len(), 2);
    }

    #[test]
    fn sync_to_empty_clears_links_and_keeps_tags() {
        let mut tables = tables_with_tags(&[1, 2]);
        attach_tags(&mut tables, "a", &[1, 2]);
        attach_tags(&mut tables, "b", &[2]);

        let outcome = sync_tags(&mut tables, "a", &[]);

        assert_eq!(outcome.removed, vec![1, 2]);
        assert!(linked(&tables, "a").is_empty());
        assert_eq!(linked(&tables, "b"), vec![2]);
        assert_eq!(tables.tags.len(), 2);
    }

    #[test]
    fn detach_all_only_touches_one_article() {
        let mut tables = tables_with_tags(&[1, 2]);
        attach_tags(&mut tables, "a", &[1, 2]);
        attach_tags(&mut tables, "b", &[1]);
        assert_eq!(detach_all_tags(&mut tables, "a"), 2);
        assert_eq!(detach_all_tags(&mut tables, "a"), 0);
        assert_eq!(linked(&tables, "b"), vec![1]);
        assert!(detach_tag(&mut tables, "b", 1));
        assert!(!detach_tag(&mut tables, "b", 1));
    }
}
