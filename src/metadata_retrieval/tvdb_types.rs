/// TheTVDB v4 API response types for deserialization.
///
/// These structures mirror the JSON response format of the v4 API. Every
/// response is wrapped in an envelope whose `data` field holds the payload.
use serde::{Deserialize, Serialize};

/// The envelope around every v4 response.
#[derive(Debug, Deserialize)]
pub(super) struct ApiResponse<T> {
    /// Payload, null when the service has nothing to return
    pub data: Option<T>,
    /// Paging links, only present on paged endpoints
    pub links: Option<Links>,
}

/// Paging links of a paged response.
#[derive(Debug, Deserialize)]
pub(super) struct Links {
    /// URL of the next page, null on the last page
    pub next: Option<String>,
}

/// Body of the login request.
#[derive(Debug, Serialize)]
pub(super) struct LoginRequest<'a> {
    pub apikey: &'a str,
    pub pin: &'a str,
}

/// Payload of a successful login.
#[derive(Debug, Deserialize)]
pub(super) struct LoginData {
    /// Bearer token for all following requests
    pub token: String,
}

/// Payload of the episodes endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct EpisodePage {
    #[serde(default)]
    pub episodes: Vec<EpisodeRecord>,
}

/// The user's favourites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Favourites {
    /// Favourite series ids
    #[serde(default, deserialize_with = "null_as_empty")]
    pub series: Vec<u64>,
    /// Favourite movie ids
    #[serde(default, deserialize_with = "null_as_empty")]
    pub movies: Vec<u64>,
}

/// Core record of a series, from the extended series endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeriesRecord {
    pub id: u64,
    /// Name in the series' original language
    pub name: Option<String>,
    pub slug: String,
    /// Poster image URL
    pub image: Option<String>,
}

/// A single raw episode from the episodes endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRecord {
    pub id: u64,
    /// Season number (0 for specials)
    pub season_number: i32,
    /// Episode number within the season (0 when unnumbered)
    pub number: i32,
    /// Runtime in minutes, may be null
    pub runtime: Option<u32>,
    pub image: Option<String>,
}

/// Core record of a movie.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MovieRecord {
    pub id: u64,
    pub name: Option<String>,
    pub slug: String,
    /// Runtime in minutes, may be null
    pub runtime: Option<u32>,
    pub image: Option<String>,
}

/// Localized display text of a series, episode or movie.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Translation {
    pub name: Option<String>,
    pub overview: Option<String>,
}

/// The service sends `null` rather than `[]` for empty favourite lists.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<u64>>::deserialize(deserializer)?.unwrap_or_default())
}
