//! Cache refresh pipeline
//!
//! Walks the user's favourites, fetches every series (with its episodes) and
//! every movie together with their translations, and writes the assembled
//! map to the cache file.

use crate::cache;
use crate::metadata_retrieval::{
    Cache, CacheEntry, Episode, Favourites, MetadataRetrievalError, Movie, Series, TvdbApi,
};
use crate::{FavouritesError, ProgressEvent};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// How a refresh reacts when a single series or movie cannot be fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Abort the whole refresh and leave the existing cache untouched
    #[default]
    Strict,
    /// Record the failure, keep going, and write everything that succeeded
    SkipFailures,
}

/// Which favourites list an item came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Series,
    Movie,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Series => write!(f, "series"),
            MediaKind::Movie => write!(f, "movie"),
        }
    }
}

/// A favourite that could not be fetched during a lenient refresh
#[derive(Debug)]
pub struct RefreshFailure {
    pub kind: MediaKind,
    pub id: u64,
    pub error: MetadataRetrievalError,
}

/// Outcome of a successful refresh
#[derive(Debug)]
pub struct RefreshReport {
    /// Where the cache was written
    pub cache_path: PathBuf,
    /// Number of entries in the written cache
    pub entry_count: usize,
    /// Items skipped under `RefreshPolicy::SkipFailures`, always empty when strict
    pub failures: Vec<RefreshFailure>,
}

/// Fetches all numbered episodes of a series
///
/// Specials (season 0) and unnumbered entries are dropped. Every kept episode
/// gets its translation fetched; the result keeps the order in which the
/// service listed the episodes.
pub fn fetch_episodes<A>(
    api: &A,
    series_id: u64,
    language: &str,
) -> Result<Vec<Episode>, MetadataRetrievalError>
where
    A: TvdbApi + ?Sized,
{
    let records = api.fetch_series_episodes(series_id)?;
    debug!(series_id, total = records.len(), "episode list fetched");

    records
        .into_iter()
        .filter(|record| record.season_number > 0 && record.number > 0)
        .map(|record| {
            let translation = api.fetch_episode_translation(record.id, language)?;
            Ok::<_, MetadataRetrievalError>(Episode {
                id: record.id,
                season_number: record.season_number,
                episode_number: record.number,
                name: translation.name,
                overview: translation.overview,
                run_time: record.runtime.unwrap_or(0),
                image_url: record.image,
            })
        })
        .collect()
}

/// Fetches a series with its translation and episodes
///
/// Returns the slug the series is keyed by together with the record.
pub fn fetch_series<A, F>(
    api: &A,
    id: u64,
    language: &str,
    progress_callback: &mut F,
) -> Result<(String, Series), MetadataRetrievalError>
where
    A: TvdbApi + ?Sized,
    F: FnMut(ProgressEvent),
{
    progress_callback(ProgressEvent::FetchingSeries { id });

    let record = api.fetch_series(id)?;
    progress_callback(ProgressEvent::SeriesResolved {
        id,
        slug: record.slug.clone(),
    });

    let translation = api.fetch_series_translation(id, language)?;
    let episodes = fetch_episodes(api, id, language)?;

    let series = Series {
        id,
        // Not every series has a translation name, fall back to the original one
        name: translation.name.or(record.name).unwrap_or_default(),
        image_url: record.image,
        episodes,
    };

    progress_callback(ProgressEvent::SeriesDone {
        slug: record.slug.clone(),
        episode_count: series.episodes.len(),
    });

    Ok((record.slug, series))
}

/// Fetches a movie with its translation
///
/// Returns the slug the movie is keyed by together with the record.
pub fn fetch_movie<A, F>(
    api: &A,
    id: u64,
    language: &str,
    progress_callback: &mut F,
) -> Result<(String, Movie), MetadataRetrievalError>
where
    A: TvdbApi + ?Sized,
    F: FnMut(ProgressEvent),
{
    progress_callback(ProgressEvent::FetchingMovie { id });

    let record = api.fetch_movie(id)?;
    progress_callback(ProgressEvent::MovieResolved {
        id,
        slug: record.slug.clone(),
    });

    let translation = api.fetch_movie_translation(id, language)?;

    let movie = Movie {
        id,
        name: translation.name,
        overview: translation.overview,
        runtime: record.runtime.unwrap_or(0),
        image_url: record.image,
    };

    progress_callback(ProgressEvent::MovieDone {
        slug: record.slug.clone(),
    });

    Ok((record.slug, movie))
}

/// Builds a fresh cache from the given favourites
///
/// Under `RefreshPolicy::Strict` the first failing item aborts the build.
/// Otherwise failed items are collected and returned next to the cache.
pub fn build_cache<A, F>(
    api: &A,
    favourites: &Favourites,
    language: &str,
    policy: RefreshPolicy,
    progress_callback: &mut F,
) -> Result<(Cache, Vec<RefreshFailure>), MetadataRetrievalError>
where
    A: TvdbApi + ?Sized,
    F: FnMut(ProgressEvent),
{
    let mut cache = Cache::new();
    let mut failures = Vec::new();

    let series_items = favourites.series.iter().map(|&id| (MediaKind::Series, id));
    let movie_items = favourites.movies.iter().map(|&id| (MediaKind::Movie, id));

    for (kind, id) in series_items.chain(movie_items) {
        let fetched = match kind {
            MediaKind::Series => fetch_series(api, id, language, &mut *progress_callback)
                .map(|(slug, series)| (slug, CacheEntry::Series(series))),
            MediaKind::Movie => fetch_movie(api, id, language, &mut *progress_callback)
                .map(|(slug, movie)| (slug, CacheEntry::Movie(movie))),
        };

        match fetched {
            Ok((slug, entry)) => {
                if let Some(previous) = cache.insert(slug.clone(), entry) {
                    warn!(%slug, replaced_id = previous.id(), "duplicate slug in favourites");
                }
            }
            Err(error) if policy == RefreshPolicy::SkipFailures => {
                warn!(%kind, id, %error, "skipping favourite");
                progress_callback(ProgressEvent::ItemFailed {
                    kind,
                    id,
                    message: error.to_string(),
                });
                failures.push(RefreshFailure { kind, id, error });
            }
            Err(error) => return Err(error),
        }
    }

    Ok((cache, failures))
}

/// Runs a full refresh against an already connected client
///
/// Fetches the favourites, builds the cache and persists it to `cache_path`.
/// Nothing is written unless the build succeeds.
pub fn refresh_with<A, F>(
    api: &A,
    language: &str,
    cache_path: &Path,
    policy: RefreshPolicy,
    mut progress_callback: F,
) -> Result<RefreshReport, FavouritesError>
where
    A: TvdbApi + ?Sized,
    F: FnMut(ProgressEvent),
{
    let favourites = api.fetch_favourites()?;
    progress_callback(ProgressEvent::FavouritesFetched {
        series_count: favourites.series.len(),
        movie_count: favourites.movies.len(),
    });

    let (cache, failures) =
        build_cache(api, &favourites, language, policy, &mut progress_callback)?;

    cache::save(&cache, cache_path)?;
    progress_callback(ProgressEvent::CacheWritten {
        path: cache_path.to_path_buf(),
        entry_count: cache.len(),
    });

    Ok(RefreshReport {
        cache_path: cache_path.to_path_buf(),
        entry_count: cache.len(),
        failures,
    })
}
