// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use env_logger::Logger;
use log::{Level, Log, Metadata, Record, SetLoggerError};

/// Rewrites records of one level coming from targets under `target_prefix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelRule {
    pub target_prefix: String,
    pub from: Level,
    pub to: Level,
}

impl LevelRule {
    pub fn new(target_prefix: &str, from: Level, to: Level) -> Self {
        Self {
            target_prefix: target_prefix.to_string(),
            from,
            to,
        }
    }
}

/// Rules applied by the server binary: per-worker startup chatter is demoted.
pub fn default_rules() -> Vec<LevelRule> {
    vec![
        LevelRule::new("actix_server::worker", Level::Info, Level::Debug),
        LevelRule::new("actix_server::builder", Level::Info, Level::Debug),
    ]
}

struct LevelModifierLogger {
    inner: Logger,
    rules: Vec<LevelRule>,
}

impl LevelModifierLogger {
    fn new(inner: Logger, rules: Vec<LevelRule>) -> Self {
        LevelModifierLogger { inner, rules }
    }
}

fn rewritten_level(rules: &[LevelRule], target: &str, original_level: Level) -> Level {
    rules
        .iter()
        .find(|rule| target.starts_with(&rule.target_prefix) && rule.from == original_level)
        .map(|rule| rule.to)
        .unwrap_or(original_level)
}

impl Log for LevelModifierLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        let new_level = rewritten_level(&self.rules, metadata.target(), metadata.level());
        let new_metadata = Metadata::builder()
            .level(new_level)
            .target(metadata.target())
            .build();
        self.inner.enabled(&new_metadata)
    }

    fn log(&self, record: &Record) {
        let new_level = rewritten_level(&self.rules, record.target(), record.level());
        let new_record = Record::builder()
            .level(new_level)
            .target(record.target())
            .args(*record.args())
            .module_path(record.module_path())
            .file(record.file())
            .line(record.line())
            .build();
        self.inner.log(&new_record);
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

pub fn init_logger(rules: Vec<LevelRule>, logger: Logger) -> Result<(), SetLoggerError> {
    let max_level = logger.filter();
    let custom_logger = LevelModifierLogger::new(logger, rules);
    log::set_boxed_logger(Box::new(custom_logger))?;
    log::set_max_level(max_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_rule_rewrites_level() {
        let rules = default_rules();
        assert_eq!(
            rewritten_level(&rules, "actix_server::worker", Level::Info),
            Level::Debug
        );
        assert_eq!(
            rewritten_level(&rules, "actix_server::worker", Level::Warn),
            Level::Warn
        );
        assert_eq!(
            rewritten_level(&rules, "newsdesk::services", Level::Info),
            Level::Info
        );
    }

    #[test]
    fn first_matching_rule_wins() {
        let rules = vec![
            LevelRule::new("newsdesk", Level::Info, Level::Trace),
            LevelRule::new("newsdesk::store", Level::Info, Level::Warn),
        ];
        assert_eq!(
            rewritten_level(&rules, "newsdesk::store", Level::Info),
            Level::Trace
        );
    }
}
