// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod accounts;
pub mod articles;
pub mod associations;
pub mod categories;
mod errors;
pub mod models;
pub mod repository;
mod tables;
pub mod tags;
mod yaml_store;

pub use errors::StoreError;
pub use models::{
    Account, AccountSummary, ArticleStatus, ArticleTag, Category, NewsArticle, Tag,
};
pub use repository::{Entity, Repository, paginate};
pub use tables::Tables;
pub use yaml_store::{DataStore, MemoryDataStore, YamlDataStore};

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle on the dataset. Reads see the last committed snapshot; commits are
/// serialized and only become visible once the backing store accepted them.
#[derive(Clone)]
pub struct Database {
    tables: Arc<RwLock<Tables>>,
    store: Arc<dyn DataStore>,
}

impl Database {
    pub fn open(store: Arc<dyn DataStore>) -> Result<Self, StoreError> {
        let tables = store.load()?;
        log::debug!(
            "Loaded {} accounts, {} categories, {} articles, {} tags",
            tables.accounts.len(),
            tables.categories.len(),
            tables.articles.len(),
            tables.tags.len()
        );
        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
            store,
        })
    }

    pub fn in_memory() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            store: Arc::new(MemoryDataStore::new()),
        }
    }

    pub async fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let guard = self.tables.read().await;
        f(&guard)
    }

    /// Applies `f` to a copy of the tables, persists the copy, then publishes it.
    /// When `f` or the save fails the visible tables are left untouched.
    pub async fn commit<R, E>(&self, f: impl FnOnce(&mut Tables) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut guard = self.tables.write().await;
        let mut updated = guard.clone();
        let result = f(&mut updated)?;

        let store = self.store.clone();
        let (updated, saved) = tokio::task::spawn_blocking(move || {
            let saved = store.save(&updated);
            (updated, saved)
        })
        .await
        .map_err(|err| StoreError::Unavailable(format!("Store write task failed: {}", err)))?;

        if let Err(err) = saved {
            log::error!("Commit rejected by store: {}", err);
            return Err(err.into());
        }

        *guard = updated;
        Ok(result)
    }
}
