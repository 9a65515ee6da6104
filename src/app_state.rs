// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::ValidatedConfig;
use crate::login::SessionStore;
use crate::notify::ChangeNotifier;
use crate::services::Services;
use crate::store::Database;

pub struct AppState {
    pub services: Services,
    pub sessions: SessionStore,
    pub notifier: ChangeNotifier,
}

impl AppState {
    /// Must run inside a tokio runtime; the session store spawns its task here.
    pub fn new(db: Database, config: &ValidatedConfig) -> Self {
        let notifier = ChangeNotifier::new();
        Self {
            services: Services::new(db, notifier.clone(), config.password.clone()),
            sessions: SessionStore::new(&config.session),
            notifier,
        }
    }
}
