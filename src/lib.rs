//! tvdb_favourites - Keep a local copy of your TheTVDB favourites
//!
//! This library fetches the favourite series (with all of their episodes) and
//! movies of a TheTVDB account, including their translations, and stores them
//! in a single cache file so other tools can use the metadata offline.

mod cache;
mod config;
mod metadata_retrieval;
mod refresh;
mod report;

// Re-export error types
pub use cache::CacheError;
pub use config::ConfigError;
pub use metadata_retrieval::MetadataRetrievalError;

// Re-export the data model and the client
pub use cache::{CACHE_FILE_NAME, default_cache_path};
pub use config::{CONFIG_FILE_NAME, Config, DEFAULT_LANGUAGE};
pub use metadata_retrieval::{
    Cache, CacheEntry, Credentials, DEFAULT_BASE_URL, Episode, EpisodeRecord, Favourites, Movie,
    MovieRecord, Series, SeriesRecord, Translation, TvdbApi, TvdbClient,
};
pub use refresh::{
    MediaKind, RefreshFailure, RefreshPolicy, RefreshReport, build_cache, fetch_episodes,
    fetch_movie, fetch_series, refresh_with,
};
pub use report::{LISTING_HEADER, write_slugs};

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Progress event emitted during a cache refresh
///
/// These events allow library users to report progress per favourite, or to
/// stay silent.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Logging in to TheTVDB
    Connecting,

    /// The favourites list was fetched
    FavouritesFetched {
        series_count: usize,
        movie_count: usize,
    },

    /// Started fetching a series
    FetchingSeries { id: u64 },

    /// The slug of a series is known
    SeriesResolved { id: u64, slug: String },

    /// A series and its episodes are complete
    SeriesDone { slug: String, episode_count: usize },

    /// Started fetching a movie
    FetchingMovie { id: u64 },

    /// The slug of a movie is known
    MovieResolved { id: u64, slug: String },

    /// A movie is complete
    MovieDone { slug: String },

    /// A favourite was skipped because it could not be fetched
    ItemFailed {
        kind: MediaKind,
        id: u64,
        message: String,
    },

    /// The cache file was written
    CacheWritten { path: PathBuf, entry_count: usize },
}

/// Top-level error type for tvdb_favourites operations
#[derive(Debug, Error)]
pub enum FavouritesError {
    /// Error while talking to TheTVDB
    #[error("Metadata retrieval error: {0}")]
    MetadataRetrieval(#[from] MetadataRetrievalError),

    /// Error during cache operations
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Error while loading the settings
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Refreshes the favourites cache from TheTVDB
///
/// Logs in with the configured credentials, fetches every favourite series
/// and movie and replaces the configured cache file with the result.
///
/// With `RefreshPolicy::Strict` any failure aborts the refresh and the old
/// cache stays as it was. With `RefreshPolicy::SkipFailures` favourites that
/// cannot be fetched are listed in the returned report instead.
///
/// # Examples
///
/// ```no_run
/// use tvdb_favourites::{Config, ProgressEvent, RefreshPolicy, refresh_cache};
///
/// let config = Config::load(&Config::default_path()?)?;
///
/// let report = refresh_cache(&config, RefreshPolicy::Strict, |event| {
///     if let ProgressEvent::SeriesDone { slug, .. } = event {
///         println!("{} done", slug);
///     }
/// })?;
/// println!("{} favourites cached", report.entry_count);
/// # Ok::<(), tvdb_favourites::FavouritesError>(())
/// ```
pub fn refresh_cache<F>(
    config: &Config,
    policy: RefreshPolicy,
    mut progress_callback: F,
) -> Result<RefreshReport, FavouritesError>
where
    F: FnMut(ProgressEvent),
{
    let cache_path = config.cache_path()?;

    progress_callback(ProgressEvent::Connecting);
    let client = TvdbClient::connect(&config.credentials)?;

    refresh_with(
        &client,
        &config.language,
        &cache_path,
        policy,
        progress_callback,
    )
}

/// Loads the favourites cache
///
/// Reads `cache_path`, or the platform default cache file when `None`. Fails
/// with `CacheError::CacheNotFound` if no cache has been written yet.
pub fn load_cache(cache_path: Option<&Path>) -> Result<Cache, FavouritesError> {
    let cache = match cache_path {
        Some(path) => cache::load(path)?,
        None => cache::load(&default_cache_path()?)?,
    };
    Ok(cache)
}

/// Prints a sorted listing of the cached favourites to stdout
///
/// See [`load_cache`] for how `cache_path` is resolved.
pub fn print_slugs(cache_path: Option<&Path>) -> Result<(), FavouritesError> {
    let cache = load_cache(cache_path)?;
    let stdout = io::stdout();
    write_slugs(&cache, &mut stdout.lock())?;
    Ok(())
}
