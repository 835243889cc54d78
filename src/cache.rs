//! Cache storage module
//!
//! This module persists the favourites cache as a single binary file. The
//! whole map is written at once and replaced atomically, and read back
//! wholesale.

use crate::metadata_retrieval::Cache;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// File name of the cache inside the platform cache directory
pub const CACHE_FILE_NAME: &str = "favourites.bin";

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to determine cache directory location
    #[error("Failed to determine cache directory location")]
    CacheDirectoryNotFound,

    /// Failed to create or access cache directory
    #[error("Failed to create cache directory at {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The cache file does not exist yet
    #[error("Cache file {path} does not exist")]
    CacheNotFound { path: PathBuf },

    /// Failed to read cached data
    #[error("Failed to read cache file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write cached data
    #[error("Failed to write cache file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to deserialize cached data
    #[error("Failed to deserialize cache file {path}: {source}")]
    DeserializationFailed {
        path: PathBuf,
        source: bincode::Error,
    },

    /// Failed to serialize data for caching
    #[error("Failed to serialize data: {0}")]
    SerializationFailed(#[from] bincode::Error),
}

/// Returns the default location of the cache file
///
/// - Linux: ~/.cache/tvdb-favourites/favourites.bin
/// - macOS: ~/Library/Caches/net.dmlane.tvdb-favourites/favourites.bin
/// - Windows: %LOCALAPPDATA%\dmlane\tvdb-favourites\cache\favourites.bin
pub fn default_cache_path() -> Result<PathBuf, CacheError> {
    let proj_dirs = directories::ProjectDirs::from("net", "dmlane", "tvdb-favourites")
        .ok_or(CacheError::CacheDirectoryNotFound)?;

    Ok(proj_dirs.cache_dir().join(CACHE_FILE_NAME))
}

/// Writes the whole cache to `path`, replacing any previous content
///
/// The data is written to a sibling `.tmp` file first and then renamed over
/// the target, so readers never observe a half-written cache. The parent
/// directory is created if needed.
pub fn save(cache: &Cache, path: &Path) -> Result<(), CacheError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CacheError::DirectoryCreationFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let content = bincode::serialize(cache)?;

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, content).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        CacheError::WriteFailed {
            path: temp_path.clone(),
            source: e,
        }
    })?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        CacheError::WriteFailed {
            path: path.to_path_buf(),
            source: e,
        }
    })?;

    info!(path = %path.display(), entries = cache.len(), "cache written");
    Ok(())
}

/// Reads the whole cache from `path`
///
/// A missing file is an error (`CacheNotFound`), never an empty cache.
pub fn load(path: &Path) -> Result<Cache, CacheError> {
    if !path.exists() {
        return Err(CacheError::CacheNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read(path).map_err(|e| CacheError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    let cache: Cache =
        bincode::deserialize(&content).map_err(|e| CacheError::DeserializationFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    debug!(path = %path.display(), entries = cache.len(), "cache loaded");
    Ok(cache)
}
