//! Settings file handling
//!
//! Credentials and optional overrides are read from a TOML file, by default
//! `settings.toml` in the platform configuration directory:
//!
//! ```toml
//! [tvdb]
//! api_key = "Your API key"
//! api_pin = "Your API pin"
//! ```

use crate::cache::{self, CacheError};
use crate::metadata_retrieval::Credentials;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the settings file inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "settings.toml";

/// Translation language used when none is configured
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Errors that can occur while loading the settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine configuration directory location
    #[error("Failed to determine configuration directory location")]
    ConfigDirectoryNotFound,

    /// `api_key` or `api_pin` is missing from the `[tvdb]` section
    #[error("Missing api_key or api_pin in the [tvdb] section of {path}")]
    MissingCredentials { path: PathBuf },

    /// Failed to read the settings file
    #[error("Failed to read settings file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The settings file is not valid TOML
    #[error("Failed to parse settings file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    tvdb: TvdbSection,
    #[serde(default)]
    cache: CacheSection,
}

#[derive(Debug, Default, Deserialize)]
struct TvdbSection {
    api_key: Option<String>,
    api_pin: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CacheSection {
    file: Option<PathBuf>,
}

/// Loaded settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// TheTVDB login secrets
    pub credentials: Credentials,
    /// Language code used for translations
    pub language: String,
    /// Cache file override, `None` means the platform default
    pub cache_file: Option<PathBuf>,
}

impl Config {
    /// Returns the default location of the settings file
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs = directories::ProjectDirs::from("net", "dmlane", "tvdb-favourites")
            .ok_or(ConfigError::ConfigDirectoryNotFound)?;

        Ok(proj_dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Returns the cache file to use, the configured one or the platform default
    pub fn cache_path(&self) -> Result<PathBuf, CacheError> {
        match &self.cache_file {
            Some(path) => Ok(path.clone()),
            None => cache::default_cache_path(),
        }
    }

    /// Loads the settings from `path`
    ///
    /// A missing file is reported as `MissingCredentials`, since both secrets
    /// are required and neither can be found.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(settings) = read_settings(path)? else {
            return Err(ConfigError::MissingCredentials {
                path: path.to_path_buf(),
            });
        };

        Self::from_settings(settings, path)
    }

    /// Reads only the `[cache] file` override from `path`
    ///
    /// Needs no credentials. A missing settings file means no override; any
    /// other read or parse failure is returned.
    pub fn load_cache_file(path: &Path) -> Result<Option<PathBuf>, ConfigError> {
        Ok(read_settings(path)?.and_then(|settings| settings.cache.file))
    }

    fn from_settings(settings: SettingsFile, path: &Path) -> Result<Self, ConfigError> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let (Some(api_key), Some(api_pin)) = (
            non_empty(settings.tvdb.api_key),
            non_empty(settings.tvdb.api_pin),
        ) else {
            return Err(ConfigError::MissingCredentials {
                path: path.to_path_buf(),
            });
        };

        Ok(Self {
            credentials: Credentials { api_key, api_pin },
            language: non_empty(settings.tvdb.language)
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            cache_file: settings.cache.file,
        })
    }
}

/// Reads and parses the settings file, `None` if it does not exist
fn read_settings(path: &Path) -> Result<Option<SettingsFile>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_settings(&content, path).map(Some)
}

fn parse_settings(content: &str, path: &Path) -> Result<SettingsFile, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ParseFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
