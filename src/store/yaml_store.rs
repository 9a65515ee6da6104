// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::errors::StoreError;
use super::tables::Tables;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

const MAX_TEMP_ATTEMPTS: u32 = 100;

/// Persistence seam under [`super::Database`]. Implementations hold whole-table snapshots.
pub trait DataStore: Send + Sync {
    fn load(&self) -> Result<Tables, StoreError>;
    fn save(&self, tables: &Tables) -> Result<(), StoreError>;
}

/// Keeps every table in one YAML document, replaced atomically on each save.
pub struct YamlDataStore {
    data_file: PathBuf,
}

impl YamlDataStore {
    pub fn new(data_file: PathBuf) -> Result<Self, StoreError> {
        if data_file.as_os_str().is_empty() {
            return Err(StoreError::Persistence(
                "Data file path is empty".to_string(),
            ));
        }
        Ok(Self { data_file })
    }

    pub fn path(&self) -> &Path {
        &self.data_file
    }
}

impl DataStore for YamlDataStore {
    fn load(&self) -> Result<Tables, StoreError> {
        if !self.data_file.exists() {
            return Ok(Tables::default());
        }
        let content = fs::read_to_string(&self.data_file)
            .map_err(|err| StoreError::Persistence(format!("Failed to read data file: {}", err)))?;
        if content.trim().is_empty() {
            return Ok(Tables::default());
        }
        serde_yaml::from_str(&content)
            .map_err(|err| StoreError::Persistence(format!("Failed to parse data file: {}", err)))
    }

    fn save(&self, tables: &Tables) -> Result<(), StoreError> {
        let content = serde_yaml::to_string(tables).map_err(|err| {
            StoreError::Persistence(format!("Failed to serialize tables: {}", err))
        })?;
        write_atomically(&self.data_file, content.as_bytes())
    }
}

/// Volatile store for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryDataStore {
    snapshot: RwLock<Tables>,
    fail_saves: RwLock<bool>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Tables) -> Self {
        Self {
            snapshot: RwLock::new(tables),
            fail_saves: RwLock::new(false),
        }
    }

    /// Makes every later save fail, to exercise rollback paths.
    pub fn fail_saves(&self, fail: bool) {
        if let Ok(mut guard) = self.fail_saves.write() {
            *guard = fail;
        }
    }

    pub fn snapshot(&self) -> Tables {
        self.snapshot
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl DataStore for MemoryDataStore {
    fn load(&self) -> Result<Tables, StoreError> {
        self.snapshot
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| StoreError::Unavailable("Memory store lock poisoned".to_string()))
    }

    fn save(&self, tables: &Tables) -> Result<(), StoreError> {
        let failing = self.fail_saves.read().map(|guard| *guard).unwrap_or(false);
        if failing {
            return Err(StoreError::Persistence(
                "Memory store configured to fail".to_string(),
            ));
        }
        let mut guard = self
            .snapshot
            .write()
            .map_err(|_| StoreError::Unavailable("Memory store lock poisoned".to_string()))?;
        *guard = tables.clone();
        Ok(())
    }
}

fn write_atomically(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::Persistence("Data file path has no parent directory".to_string()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| StoreError::Persistence("Data file name is not valid UTF-8".to_string()))?;
    let (mut file, temp_path) = create_temp_file(parent, file_name)?;

    if let Ok(metadata) = fs::metadata(path) {
        #[cfg(unix)]
        {
            if let Err(err) = fs::set_permissions(&temp_path, metadata.permissions()) {
                let _ = fs::remove_file(&temp_path);
                return Err(StoreError::Persistence(format!(
                    "Failed to set temp data file permissions: {}",
                    err
                )));
            }
        }
        #[cfg(not(unix))]
        let _ = metadata;
    }

    if let Err(err) = file.write_all(content) {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::Persistence(format!(
            "Failed to write data temp file: {}",
            err
        )));
    }
    if let Err(err) = file.sync_all() {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::Persistence(format!(
            "Failed to sync data temp file: {}",
            err
        )));
    }

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(StoreError::Persistence(format!(
            "Failed to replace data file: {}",
            err
        )));
    }

    #[cfg(unix)]
    {
        if let Err(err) = fs::File::open(parent).and_then(|dir| dir.sync_all()) {
            log::warn!("Data directory sync failed: {}", err);
        }
    }

    Ok(())
}

fn create_temp_file(parent: &Path, file_name: &str) -> Result<(fs::File, PathBuf), StoreError> {
    for attempt in 0..MAX_TEMP_ATTEMPTS {
        let temp_path = parent.join(format!(
            ".{}.tmp.{}.{}",
            file_name,
            std::process::id(),
            attempt
        ));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
        {
            Ok(file) => return Ok((file, temp_path)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(StoreError::Persistence(format!(
                    "Failed to create temp data file: {}",
                    err
                )));
            }
        }
    }
    Err(StoreError::Persistence(
        "Failed to create temp data file after multiple attempts".to_string(),
    ))
}
