// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub password: Argon2ParamsConfig,
}

#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub password: Argon2Params,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    4
}

impl ServerConfig {
    pub fn address_tuple(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    /// Loopback-only servers get non-secure cookies so plain HTTP works locally.
    pub fn is_localhost_only(&self) -> bool {
        matches!(self.host.as_str(), "127.0.0.1" | "localhost" | "::1")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_session_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_session_idle_timeout_minutes")]
    pub idle_timeout_minutes: u64,
    #[serde(default = "default_session_max_sessions")]
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_session_cookie_name(),
            idle_timeout_minutes: default_session_idle_timeout_minutes(),
            max_sessions: default_session_max_sessions(),
        }
    }
}

fn default_session_cookie_name() -> String {
    "newsdesk_session".to_string()
}

fn default_session_idle_timeout_minutes() -> u64 {
    30
}

fn default_session_max_sessions() -> usize {
    10000
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_data_file")]
    pub data_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: default_storage_data_file(),
        }
    }
}

fn default_storage_data_file() -> String {
    "newsdesk.yaml".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Argon2ParamsConfig {
    #[serde(default)]
    pub memory_kib: Option<u32>,
    #[serde(default)]
    pub iterations: Option<u32>,
    #[serde(default)]
    pub parallelism: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

pub const DEFAULT_ARGON2_PARAMS: Argon2Params = Argon2Params {
    memory_kib: 19456,
    iterations: 2,
    parallelism: 1,
};

impl Argon2Params {
    fn resolve(config: &Argon2ParamsConfig, defaults: Argon2Params) -> Result<Self, ConfigError> {
        let resolved = Argon2Params {
            memory_kib: config.memory_kib.unwrap_or(defaults.memory_kib),
            iterations: config.iterations.unwrap_or(defaults.iterations),
            parallelism: config.parallelism.unwrap_or(defaults.parallelism),
        };

        if resolved.memory_kib == 0 || resolved.iterations == 0 || resolved.parallelism == 0 {
            return Err(ConfigError::ValidationError(
                "Argon2id password params must be non-zero".to_string(),
            ));
        }

        if let Err(err) = argon2::Params::new(
            resolved.memory_kib,
            resolved.iterations,
            resolved.parallelism,
            None,
        ) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid Argon2id password params: {}",
                err
            )));
        }

        Ok(resolved)
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join("config.yaml");
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        Self::parse(&config_content).map_err(|e| match e {
            ConfigError::LoadError(msg) => ConfigError::LoadError(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                msg
            )),
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// Loads and validates configuration at startup. If validation fails, the application should not start.
    pub fn load_and_validate(root: &Path) -> Result<ValidatedConfig, ConfigError> {
        Self::load(root)?.validate()
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.host cannot be empty".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server.port must be non-zero".to_string(),
            ));
        }
        if self.server.workers == 0 {
            return Err(ConfigError::ValidationError(
                "server.workers must be at least 1".to_string(),
            ));
        }

        Self::validate_logging(&self.logging)?;
        Self::validate_session(&self.session)?;

        if self.storage.data_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "storage.data_file cannot be empty".to_string(),
            ));
        }

        let password = Argon2Params::resolve(&self.password, DEFAULT_ARGON2_PARAMS)?;

        Ok(ValidatedConfig {
            server: self.server,
            app: self.app,
            logging: self.logging,
            session: self.session,
            storage: self.storage,
            password,
        })
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let level = logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {}, got: {}",
                LOG_LEVELS.join(", "),
                logging.level
            )));
        }
        Ok(())
    }

    fn validate_session(session: &SessionConfig) -> Result<(), ConfigError> {
        if session.cookie_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "session.cookie_name cannot be empty".to_string(),
            ));
        }
        if !session
            .cookie_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(ConfigError::ValidationError(format!(
                "session.cookie_name contains invalid characters: {}",
                session.cookie_name
            )));
        }
        if session.idle_timeout_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "session.idle_timeout_minutes must be at least 1".to_string(),
            ));
        }
        if session.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "session.max_sessions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl ValidatedConfig {
    pub fn log_level_filter(&self) -> log::LevelFilter {
        match self.logging.level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            _ => log::LevelFilter::Info,
        }
    }

    pub fn session_idle_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session.idle_timeout_minutes.saturating_mul(60))
    }

    /// Cheap settings for tests; argon2 at its minimum cost.
    pub fn for_tests() -> Self {
        ValidatedConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5466,
                workers: 1,
            },
            app: AppConfig {
                name: "Test Desk".to_string(),
                description: "Test Description".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            session: SessionConfig::default(),
            storage: StorageConfig::default(),
            password: Argon2Params {
                memory_kib: 8,
                iterations: 1,
                parallelism: 1,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
server:
  host: "127.0.0.1"
  port: 8080
app:
  name: "Desk"
logging:
  level: "info"
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = Config::parse(MINIMAL).expect("parse").validate().expect("valid");
        assert_eq!(config.server.workers, 4);
        assert_eq!(config.session.cookie_name, "newsdesk_session");
        assert_eq!(config.session.idle_timeout_minutes, 30);
        assert_eq!(config.storage.data_file, "newsdesk.yaml");
        assert_eq!(config.password, DEFAULT_ARGON2_PARAMS);
        assert_eq!(config.log_level_filter(), log::LevelFilter::Info);
    }

    #[test]
    fn rejects_unknown_log_level() {
        let yaml = MINIMAL.replace("\"info\"", "\"chatty\"");
        let err = Config::parse(&yaml)
            .expect("parse")
            .validate()
            .expect_err("level");
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn rejects_zero_idle_timeout() {
        let yaml = format!("{}session:\n  idle_timeout_minutes: 0\n", MINIMAL);
        let err = Config::parse(&yaml)
            .expect("parse")
            .validate()
            .expect_err("timeout");
        assert!(err.to_string().contains("idle_timeout_minutes"));
    }

    #[test]
    fn rejects_zero_argon2_params() {
        let yaml = format!("{}password:\n  iterations: 0\n", MINIMAL);
        let err = Config::parse(&yaml)
            .expect("parse")
            .validate()
            .expect_err("argon2");
        assert!(err.to_string().contains("non-zero"));
    }

    #[test]
    fn partial_argon2_params_fall_back_to_defaults() {
        let yaml = format!("{}password:\n  memory_kib: 4096\n", MINIMAL);
        let config = Config::parse(&yaml).expect("parse").validate().expect("valid");
        assert_eq!(config.password.memory_kib, 4096);
        assert_eq!(config.password.iterations, DEFAULT_ARGON2_PARAMS.iterations);
    }

    #[test]
    fn rejects_empty_host() {
        let yaml = MINIMAL.replace("\"127.0.0.1\"", "\"  \"");
        let err = Config::parse(&yaml)
            .expect("parse")
            .validate()
            .expect_err("host");
        assert!(err.to_string().contains("server.host"));
    }
}
