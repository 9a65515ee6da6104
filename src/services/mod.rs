// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Business rules on top of the store. Every mutation checks the caller, runs in a
//! single commit and announces itself on the [`ChangeNotifier`] once it landed.

pub mod accounts;
pub mod articles;
pub mod categories;
mod errors;
pub mod tags;

pub use accounts::AccountService;
pub use articles::ArticleService;
pub use categories::CategoryService;
pub use errors::ServiceError;
pub use tags::TagService;

use crate::config::Argon2Params;
use crate::notify::ChangeNotifier;
use crate::store::Database;
use serde::Serialize;

/// One page of a listing. `page` is 1-based.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
}

#[derive(Clone)]
pub struct Services {
    pub categories: CategoryService,
    pub tags: TagService,
    pub articles: ArticleService,
    pub accounts: AccountService,
}

impl Services {
    pub fn new(db: Database, notifier: ChangeNotifier, password_params: Argon2Params) -> Self {
        Self {
            categories: CategoryService::new(db.clone(), notifier.clone()),
            tags: TagService::new(db.clone(), notifier.clone()),
            articles: ArticleService::new(db.clone(), notifier.clone()),
            accounts: AccountService::new(db, notifier, password_params),
        }
    }
}
