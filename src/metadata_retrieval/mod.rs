/// Data structures and traits for TheTVDB metadata retrieval.
///
/// This module provides the records stored in the favourites cache (series,
/// episodes and movies with their translated names and overviews), as well as
/// the trait describing the remote operations the refresh pipeline relies on.
mod tvdb;
mod tvdb_types;

pub use tvdb::{Credentials, DEFAULT_BASE_URL, TvdbClient};
pub use tvdb_types::{EpisodeRecord, Favourites, MovieRecord, SeriesRecord, Translation};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during metadata retrieval operations.
#[derive(Debug, Error)]
pub enum MetadataRetrievalError {
    /// Login failed: bad credentials or the service is unreachable
    #[error("Could not connect to TVDB: {0}")]
    ConnectionFailed(String),

    /// The favourites endpoint returned no data
    #[error("Could not fetch favourites from TVDB")]
    FavouritesUnavailable,

    /// A metadata, translation or episode request failed
    #[error("Request to {endpoint} failed: {message}")]
    RequestFailed { endpoint: String, message: String },

    /// Failed to parse the provider's JSON response
    #[error("Failed to parse response from {endpoint}: {message}")]
    ParseError { endpoint: String, message: String },
}

/// A single episode of a series, with its translated name and overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// TheTVDB episode id
    pub id: u64,
    /// The season number this episode belongs to
    pub season_number: i32,
    /// The episode number within the season
    pub episode_number: i32,
    /// The episode title
    pub name: Option<String>,
    /// A brief summary of the episode
    pub overview: Option<String>,
    /// Run time in minutes, 0 when unknown
    pub run_time: u32,
    pub image_url: Option<String>,
}

/// A favourite series together with all of its numbered episodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    /// TheTVDB series id
    pub id: u64,
    /// The name of the series
    pub name: String,
    pub image_url: Option<String>,
    /// Episodes in the order the remote returned them
    pub episodes: Vec<Episode>,
}

/// A favourite movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    /// TheTVDB movie id
    pub id: u64,
    pub name: Option<String>,
    pub overview: Option<String>,
    /// Runtime in minutes, 0 when unknown
    pub runtime: u32,
    pub image_url: Option<String>,
}

/// A single cached record, either a series or a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheEntry {
    Series(Series),
    Movie(Movie),
}

impl CacheEntry {
    /// Display name of the record, empty if the remote had none
    pub fn name(&self) -> &str {
        match self {
            CacheEntry::Series(series) => &series.name,
            CacheEntry::Movie(movie) => movie.name.as_deref().unwrap_or(""),
        }
    }

    /// TheTVDB id of the record
    pub fn id(&self) -> u64 {
        match self {
            CacheEntry::Series(series) => series.id,
            CacheEntry::Movie(movie) => movie.id,
        }
    }
}

/// The full favourites cache, keyed by slug.
pub type Cache = BTreeMap<String, CacheEntry>;

/// Trait for clients that can talk to TheTVDB.
///
/// The refresh pipeline only depends on this trait, so any source that can
/// answer these requests (the real HTTP client, or a canned one in tests) can
/// drive a refresh.
pub trait TvdbApi {
    /// Fetches the id lists of the user's favourite series and movies.
    ///
    /// Returns `FavouritesUnavailable` if the service answered without data.
    fn fetch_favourites(&self) -> Result<Favourites, MetadataRetrievalError>;

    /// Fetches the core record of a series.
    fn fetch_series(&self, id: u64) -> Result<SeriesRecord, MetadataRetrievalError>;

    /// Fetches a series' name and overview in the given language.
    fn fetch_series_translation(
        &self,
        id: u64,
        language: &str,
    ) -> Result<Translation, MetadataRetrievalError>;

    /// Fetches every episode of a series, in the order the service lists them.
    fn fetch_series_episodes(&self, id: u64) -> Result<Vec<EpisodeRecord>, MetadataRetrievalError>;

    /// Fetches an episode's name and overview in the given language.
    fn fetch_episode_translation(
        &self,
        episode_id: u64,
        language: &str,
    ) -> Result<Translation, MetadataRetrievalError>;

    /// Fetches the core record of a movie.
    fn fetch_movie(&self, id: u64) -> Result<MovieRecord, MetadataRetrievalError>;

    /// Fetches a movie's name and overview in the given language.
    fn fetch_movie_translation(
        &self,
        id: u64,
        language: &str,
    ) -> Result<Translation, MetadataRetrievalError>;
}
