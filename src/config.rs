/// Application configuration
///
/// Read from `config.json` in the user's config directory:
/// - Linux: ~/.config/concern-desk/config.json
/// - macOS: ~/Library/Application Support/concern-desk/config.json
/// - Windows: %APPDATA%\concern-desk\config.json
///
/// A missing file means defaults. `CONCERN_DESK_*` environment variables
/// override individual values after the file is read.
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::dashboard::DashboardSettings;
use crate::error::ConfigError;
use crate::state::data::Role;
use crate::state::resolver::SearchStrategy;
use crate::state::session::Session;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_PAGE_SIZE: usize = 6;
const DEFAULT_LOCATIONS: [&str; 5] = ["Downtown", "Harbor", "Old Town", "Riverside", "University"];

const ENV_API_URL: &str = "CONCERN_DESK_API_URL";
const ENV_TIMEOUT_SECS: &str = "CONCERN_DESK_TIMEOUT_SECS";
const ENV_PAGE_SIZE: &str = "CONCERN_DESK_PAGE_SIZE";
const ENV_SEARCH: &str = "CONCERN_DESK_SEARCH";
const ENV_USERNAME: &str = "CONCERN_DESK_USERNAME";
const ENV_ROLE: &str = "CONCERN_DESK_ROLE";
const ENV_TOKEN: &str = "CONCERN_DESK_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub page_size: usize,
    pub search: SearchStrategy,
    pub locations: Vec<String>,
    pub session: Session,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            search: SearchStrategy::default(),
            locations: DEFAULT_LOCATIONS.iter().map(|l| (*l).to_owned()).collect(),
            session: Session::default(),
        }
    }
}

impl AppConfig {
    /// Load from the default path and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::default_path() {
            Some(path) => Self::from_path(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Where the config file lives, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("concern-desk");
        path.push("config.json");
        Some(path)
    }

    /// Read a config file; a file that does not exist yields defaults
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Apply `CONCERN_DESK_*` overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = read(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(raw) = read(ENV_TIMEOUT_SECS) {
            self.api.timeout_secs = raw
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds.")))?;
        }
        if let Some(raw) = read(ENV_PAGE_SIZE) {
            self.page_size = raw
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{ENV_PAGE_SIZE} must be a positive integer.")))?;
        }
        if let Some(raw) = read(ENV_SEARCH) {
            self.search = match raw.to_ascii_lowercase().as_str() {
                "server" => SearchStrategy::Server,
                "local" => SearchStrategy::Local,
                _ => {
                    return Err(ConfigError::Invalid(format!(
                        "{ENV_SEARCH} must be 'server' or 'local', got '{raw}'."
                    )))
                }
            };
        }
        if let Some(username) = read(ENV_USERNAME) {
            self.session.username = username;
        }
        if let Some(raw) = read(ENV_ROLE) {
            self.session.role = raw
                .parse::<Role>()
                .map_err(|error| ConfigError::Invalid(format!("{ENV_ROLE}: {error}")))?;
        }
        if let Some(token) = read(ENV_TOKEN) {
            self.session.set_token(Some(token));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api.base_url cannot be empty.".to_owned()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Invalid("api.timeout_secs must be greater than zero.".to_owned()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be greater than zero.".to_owned()));
        }
        if self.locations.iter().all(|location| location.trim().is_empty()) {
            return Err(ConfigError::Invalid("at least one location must be configured.".to_owned()));
        }
        Ok(())
    }

    pub fn dashboard_settings(&self) -> DashboardSettings {
        DashboardSettings {
            page_size: self.page_size,
            search: self.search,
            locations: self
                .locations
                .iter()
                .map(|location| location.trim().to_owned())
                .filter(|location| !location.is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_path(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "api": {{ "base_url": "https://concerns.example/api" }},
                "search": "local",
                "session": {{ "username": "amina", "role": "moderator" }}
            }}"#
        )
        .unwrap();

        let config = AppConfig::from_path(file.path()).unwrap();

        assert_eq!(config.api.base_url, "https://concerns.example/api");
        assert_eq!(config.api.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.search, SearchStrategy::Local);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.session.role, Role::Moderator);
        assert_eq!(config.session.username, "amina");
    }

    #[test]
    fn test_malformed_file_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            AppConfig::from_path(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                (ENV_API_URL, "http://10.0.0.5:9000/api"),
                (ENV_PAGE_SIZE, " 12 "),
                (ENV_ROLE, "Admin"),
                (ENV_TOKEN, "secret"),
                (ENV_SEARCH, ""),
            ]))
            .unwrap();

        assert_eq!(config.api.base_url, "http://10.0.0.5:9000/api");
        assert_eq!(config.page_size, 12);
        assert_eq!(config.session.role, Role::Admin);
        assert_eq!(config.session.token(), Some("secret"));
        assert_eq!(config.search, SearchStrategy::Server);
    }

    #[test]
    fn test_invalid_env_values_are_rejected() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(env(&[(ENV_PAGE_SIZE, "many")])).is_err());
        assert!(config.apply_env(env(&[(ENV_ROLE, "superuser")])).is_err());
        assert!(config.apply_env(env(&[(ENV_SEARCH, "fuzzy")])).is_err());
    }

    #[test]
    fn test_zero_page_size_fails_validation() {
        let config = AppConfig {
            page_size: 0,
            ..AppConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
