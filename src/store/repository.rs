// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::StoreError;
use super::tables::Tables;
use super::Database;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::marker::PhantomData;

/// A row type living in one of the [`Tables`].
pub trait Entity: Clone + Send + Sync + 'static {
    type Key: Ord + Clone + Display + Send + Sync;

    const LABEL: &'static str;

    fn key(&self) -> Self::Key;

    fn table(tables: &Tables) -> &BTreeMap<Self::Key, Self>;

    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<Self::Key, Self>;

    /// Store-assigned keys. Entities whose key is supplied by the caller keep the default.
    fn assign_key(&mut self, _tables: &Tables) -> Result<(), StoreError> {
        Ok(())
    }

    /// Removes rows that only exist on behalf of the entity being deleted.
    fn release_dependents(_tables: &mut Tables, _key: &Self::Key) {}
}

/// Slices a 1-indexed page. Page 0 is read as page 1; a zero page size yields nothing.
pub fn paginate<T>(items: Vec<T>, page_number: usize, page_size: usize) -> Vec<T> {
    if page_size == 0 {
        return Vec::new();
    }
    let page_number = page_number.max(1);
    let skip = (page_number - 1).saturating_mul(page_size);
    items.into_iter().skip(skip).take(page_size).collect()
}

/// Uniform CRUD and query access over one entity table.
pub struct Repository<T: Entity> {
    db: Database,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn get_by_id(&self, id: &T::Key) -> Option<T> {
        self.db.read(|tables| T::table(tables).get(id).cloned()).await
    }

    /// Every row in key order.
    pub async fn get_all(&self) -> Vec<T> {
        self.db
            .read(|tables| T::table(tables).values().cloned().collect())
            .await
    }

    pub async fn add(&self, entity: T) -> Result<T, StoreError> {
        self.db
            .commit(|tables| Self::insert_into(tables, entity))
            .await
    }

    pub async fn update(&self, entity: T) -> Result<T, StoreError> {
        self.db
            .commit(|tables| Self::replace_in(tables, entity))
            .await
    }

    pub async fn delete(&self, id: &T::Key) -> Result<T, StoreError> {
        self.db
            .commit(|tables| Self::remove_from(tables, id))
            .await
    }

    pub async fn delete_entity(&self, entity: &T) -> Result<T, StoreError> {
        self.delete(&entity.key()).await
    }

    pub async fn find(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.db
            .read(|tables| {
                T::table(tables)
                    .values()
                    .filter(|row| predicate(row))
                    .cloned()
                    .collect()
            })
            .await
    }

    pub async fn first_or_default(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.db
            .read(|tables| T::table(tables).values().find(|row| predicate(row)).cloned())
            .await
    }

    pub async fn any(&self, predicate: impl Fn(&T) -> bool) -> bool {
        self.db
            .read(|tables| T::table(tables).values().any(|row| predicate(row)))
            .await
    }

    pub async fn count(&self, predicate: Option<&(dyn Fn(&T) -> bool + Sync)>) -> usize {
        self.db
            .read(|tables| match predicate {
                Some(predicate) => T::table(tables).values().filter(|row| predicate(row)).count(),
                None => T::table(tables).len(),
            })
            .await
    }

    pub async fn get_paged(&self, page_number: usize, page_size: usize) -> Vec<T> {
        self.get_paged_by(None, None, page_number, page_size).await
    }

    /// Filters, orders (key order when `order_by` is absent), then slices one page.
    pub async fn get_paged_by(
        &self,
        filter: Option<&(dyn Fn(&T) -> bool + Sync)>,
        order_by: Option<&(dyn Fn(&T, &T) -> Ordering + Sync)>,
        page_number: usize,
        page_size: usize,
    ) -> Vec<T> {
        let mut rows: Vec<T> = self
            .db
            .read(|tables| {
                T::table(tables)
                    .values()
                    .filter(|row| filter.is_none_or(|filter| filter(row)))
                    .cloned()
                    .collect()
            })
            .await;
        if let Some(order_by) = order_by {
            rows.sort_by(|left, right| order_by(left, right));
        }
        paginate(rows, page_number, page_size)
    }

    pub(crate) fn insert_into(tables: &mut Tables, mut entity: T) -> Result<T, StoreError> {
        entity.assign_key(tables)?;
        let key = entity.key();
        let table = T::table_mut(tables);
        if table.contains_key(&key) {
            return Err(StoreError::duplicate(T::LABEL, &key));
        }
        table.insert(key, entity.clone());
        Ok(entity)
    }

    pub(crate) fn replace_in(tables: &mut Tables, entity: T) -> Result<T, StoreError> {
        let key = entity.key();
        match T::table_mut(tables).get_mut(&key) {
            Some(row) => {
                *row = entity.clone();
                Ok(entity)
            }
            None => Err(StoreError::not_found(T::LABEL, &key)),
        }
    }

    pub(crate) fn remove_from(tables: &mut Tables, id: &T::Key) -> Result<T, StoreError> {
        let removed = T::table_mut(tables)
            .remove(id)
            .ok_or_else(|| StoreError::not_found(T::LABEL, id))?;
        T::release_dependents(tables, id);
        Ok(removed)
    }
}

/// Integer keys the store can hand out itself.
pub(crate) trait SurrogateKey: Copy + Ord {
    const FIRST: Self;

    fn successor(self) -> Option<Self>;
}

impl SurrogateKey for i16 {
    const FIRST: Self = 1;

    fn successor(self) -> Option<Self> {
        self.checked_add(1)
    }
}

impl SurrogateKey for i32 {
    const FIRST: Self = 1;

    fn successor(self) -> Option<Self> {
        self.checked_add(1)
    }
}

/// Next surrogate key for auto-increment tables, `None` once the highest key is taken.
pub(crate) fn next_key<K: SurrogateKey>(table: &BTreeMap<K, impl Sized>) -> Option<K> {
    match table.keys().next_back() {
        Some(max) => max.successor(),
        None => Some(K::FIRST),
    }
}
