//! Checks against the real TheTVDB service.
//!
//! These need a subscriber key and PIN in `TVDB_API_KEY` and `TVDB_API_PIN`
//! and are ignored by default:
//!
//! ```sh
//! TVDB_API_KEY=... TVDB_API_PIN=... cargo test --test tvdb_live -- --ignored
//! ```

use tvdb_favourites::{
    CacheEntry, Credentials, MetadataRetrievalError, RefreshPolicy, TvdbApi, TvdbClient,
    fetch_movie, fetch_series, load_cache, refresh_with,
};

/// "The Postman", released in Italian
const THE_POSTMAN: u64 = 7606;
/// "The Glory", a Korean series
const THE_GLORY: u64 = 411469;

fn credentials() -> Credentials {
    Credentials {
        api_key: std::env::var("TVDB_API_KEY").expect("TVDB_API_KEY not set"),
        api_pin: std::env::var("TVDB_API_PIN").expect("TVDB_API_PIN not set"),
    }
}

#[test]
#[ignore = "needs TheTVDB credentials and network access"]
fn test_connection() {
    assert!(TvdbClient::connect(&credentials()).is_ok());
}

#[test]
#[ignore = "needs TheTVDB credentials and network access"]
fn test_wrong_credentials() {
    let mut credentials = credentials();
    credentials.api_pin = "wrong_pin".to_string();

    assert!(matches!(
        TvdbClient::connect(&credentials),
        Err(MetadataRetrievalError::ConnectionFailed(_))
    ));
}

#[test]
#[ignore = "needs TheTVDB credentials and network access"]
fn test_fetch_movie() {
    let client = TvdbClient::connect(&credentials()).unwrap();

    let (slug, movie) = fetch_movie(&client, THE_POSTMAN, "eng", &mut |_| {}).unwrap();

    assert_eq!(slug, "the-postman-1994");
    assert_eq!(movie.id, THE_POSTMAN);
}

#[test]
#[ignore = "needs TheTVDB credentials and network access"]
fn test_fetch_series() {
    let client = TvdbClient::connect(&credentials()).unwrap();

    let (slug, series) = fetch_series(&client, THE_GLORY, "eng", &mut |_| {}).unwrap();

    assert_eq!(slug, "the-glory");
    assert_eq!(series.episodes.len(), 16);
}

#[test]
#[ignore = "needs TheTVDB credentials and network access"]
fn test_fetch_favourites() {
    let client = TvdbClient::connect(&credentials()).unwrap();

    assert!(client.fetch_favourites().is_ok());
}

#[test]
#[ignore = "needs TheTVDB credentials and network access"]
fn test_refresh_and_load() {
    let client = TvdbClient::connect(&credentials()).unwrap();
    let favourites = client.fetch_favourites().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("favourites.bin");

    let report = refresh_with(&client, "eng", &path, RefreshPolicy::Strict, |_| {}).unwrap();
    let cache = load_cache(Some(&path)).unwrap();

    assert_eq!(cache.len(), report.entry_count);
    assert_eq!(cache.len(), favourites.series.len() + favourites.movies.len());

    let mut series_ids: Vec<u64> = Vec::new();
    let mut movie_ids: Vec<u64> = Vec::new();
    for entry in cache.values() {
        match entry {
            CacheEntry::Series(series) => series_ids.push(series.id),
            CacheEntry::Movie(movie) => movie_ids.push(movie.id),
        }
    }
    series_ids.sort_unstable();
    movie_ids.sort_unstable();

    let mut expected_series = favourites.series.clone();
    let mut expected_movies = favourites.movies.clone();
    expected_series.sort_unstable();
    expected_movies.sort_unstable();

    assert_eq!(series_ids, expected_series);
    assert_eq!(movie_ids, expected_movies);
}
