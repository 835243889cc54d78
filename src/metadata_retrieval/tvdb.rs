/// TheTVDB v4 client implementation.
use super::tvdb_types::{
    ApiResponse, EpisodePage, EpisodeRecord, Favourites, LoginData, LoginRequest, MovieRecord,
    SeriesRecord, Translation,
};
use super::{MetadataRetrievalError, TvdbApi};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Base URL of the v4 API
pub const DEFAULT_BASE_URL: &str = "https://api4.thetvdb.com/v4";

/// Timeout applied to every single request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default upper bound on episode pages followed for a single series
const MAX_EPISODE_PAGES: usize = 100;

/// The two secrets needed to log in to TheTVDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_pin: String,
}

/// Blocking client for the TheTVDB v4 API.
///
/// A client is obtained by logging in with [`TvdbClient::connect`]; the bearer
/// token it receives is sent with every following request.
pub struct TvdbClient {
    client: reqwest::blocking::Client,
    base_url: String,
    token: String,
    /// Upper bound on episode pages followed for a single series
    max_episode_pages: usize,
}

impl TvdbClient {
    /// Logs in to the public TheTVDB API.
    pub fn connect(credentials: &Credentials) -> Result<Self, MetadataRetrievalError> {
        Self::connect_to(DEFAULT_BASE_URL, credentials)
    }

    /// Logs in to a TheTVDB compatible API at the given base URL.
    ///
    /// Any failure here, transport or authentication, is reported as
    /// `ConnectionFailed`.
    pub fn connect_to(
        base_url: &str,
        credentials: &Credentials,
    ) -> Result<Self, MetadataRetrievalError> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MetadataRetrievalError::ConnectionFailed(e.to_string()))?;

        debug!(base_url = %base_url, "logging in to TVDB");
        let response = client
            .post(format!("{}/login", base_url))
            .json(&LoginRequest {
                apikey: &credentials.api_key,
                pin: &credentials.api_pin,
            })
            .send()
            .map_err(|e| MetadataRetrievalError::ConnectionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MetadataRetrievalError::ConnectionFailed(format!(
                "HTTP {} {}",
                response.status().as_u16(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let login: ApiResponse<LoginData> = response
            .json()
            .map_err(|e| MetadataRetrievalError::ConnectionFailed(e.to_string()))?;

        let token = login
            .data
            .ok_or_else(|| {
                MetadataRetrievalError::ConnectionFailed("login returned no token".to_string())
            })?
            .token;

        Ok(Self {
            client,
            base_url,
            token,
            max_episode_pages: MAX_EPISODE_PAGES,
        })
    }

    /// Performs an authenticated GET and returns the decoded envelope.
    fn get_envelope<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse<T>, MetadataRetrievalError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, ?query, "GET");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .map_err(|e| MetadataRetrievalError::RequestFailed {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(MetadataRetrievalError::RequestFailed {
                endpoint: endpoint.to_string(),
                message: format!(
                    "HTTP {} {}",
                    response.status().as_u16(),
                    response.status().canonical_reason().unwrap_or("Unknown")
                ),
            });
        }

        response
            .json()
            .map_err(|e| MetadataRetrievalError::ParseError {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            })
    }

    /// Performs an authenticated GET whose payload must be present.
    fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, MetadataRetrievalError> {
        self.get_envelope(endpoint, &[])?
            .data
            .ok_or_else(|| MetadataRetrievalError::RequestFailed {
                endpoint: endpoint.to_string(),
                message: "response contained no data".to_string(),
            })
    }
}

impl TvdbApi for TvdbClient {
    fn fetch_favourites(&self) -> Result<Favourites, MetadataRetrievalError> {
        self.get_envelope::<Favourites>("user/favorites", &[])?
            .data
            .ok_or(MetadataRetrievalError::FavouritesUnavailable)
    }

    fn fetch_series(&self, id: u64) -> Result<SeriesRecord, MetadataRetrievalError> {
        self.get(&format!("series/{}/extended", id))
    }

    fn fetch_series_translation(
        &self,
        id: u64,
        language: &str,
    ) -> Result<Translation, MetadataRetrievalError> {
        self.get(&format!("series/{}/translations/{}", id, language))
    }

    fn fetch_series_episodes(&self, id: u64) -> Result<Vec<EpisodeRecord>, MetadataRetrievalError> {
        let endpoint = format!("series/{}/episodes/default", id);
        let mut episodes = Vec::new();

        for page in 0..self.max_episode_pages {
            let response: ApiResponse<EpisodePage> =
                self.get_envelope(&endpoint, &[("page", page.to_string())])?;

            let data = response
                .data
                .ok_or_else(|| MetadataRetrievalError::RequestFailed {
                    endpoint: endpoint.clone(),
                    message: "response contained no data".to_string(),
                })?;
            episodes.extend(data.episodes);

            // The last page carries no link to a next one
            if response.links.and_then(|links| links.next).is_none() {
                return Ok(episodes);
            }
        }

        Err(MetadataRetrievalError::RequestFailed {
            endpoint,
            message: format!("more than {} episode pages", self.max_episode_pages),
        })
    }

    fn fetch_episode_translation(
        &self,
        episode_id: u64,
        language: &str,
    ) -> Result<Translation, MetadataRetrievalError> {
        self.get(&format!("episodes/{}/translations/{}", episode_id, language))
    }

    fn fetch_movie(&self, id: u64) -> Result<MovieRecord, MetadataRetrievalError> {
        self.get(&format!("movies/{}", id))
    }

    fn fetch_movie_translation(
        &self,
        id: u64,
        language: &str,
    ) -> Result<Translation, MetadataRetrievalError> {
        self.get(&format!("movies/{}/translations/{}", id, language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    fn credentials() -> Credentials {
        Credentials {
            api_key: "key".to_string(),
            api_pin: "pin".to_string(),
        }
    }

    /// Reads one HTTP request and returns its method and target
    fn read_request(stream: &mut TcpStream) -> (String, String) {
        let mut reader = BufReader::new(stream);

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line.trim().is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }

        let mut body = vec![0; content_length];
        reader.read_exact(&mut body).unwrap();

        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let target = parts.next().unwrap_or_default().to_string();
        (method, target)
    }

    /// Starts a local HTTP server answering every request through `route`
    ///
    /// `route` gets the method and the request target (path and query) and
    /// returns the status code and JSON body. Returns the v4 base URL.
    fn serve<R>(route: R) -> String
    where
        R: Fn(&str, &str) -> (u16, String) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/v4", listener.local_addr().unwrap());

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let (method, target) = read_request(&mut stream);
                let (status, body) = route(&method, &target);
                let response = format!(
                    concat!(
                        "HTTP/1.1 {} Stub\r\n",
                        "Content-Type: application/json\r\n",
                        "Content-Length: {}\r\n",
                        "Connection: close\r\n\r\n{}"
                    ),
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        base_url
    }

    /// Answers the login, and hands everything else to `route`
    fn serve_logged_in<R>(route: R) -> String
    where
        R: Fn(&str) -> (u16, String) + Send + 'static,
    {
        serve(move |method, target| match (method, target) {
            ("POST", "/v4/login") => (
                200,
                r#"{"status":"success","data":{"token":"secret"}}"#.to_string(),
            ),
            _ => route(target),
        })
    }

    fn episode_page(ids: &[u64], next: Option<&str>) -> String {
        let episodes: Vec<String> = ids
            .iter()
            .map(|id| {
                format!(
                    r#"{{"id":{},"seasonNumber":1,"number":{},"runtime":null,"image":null}}"#,
                    id, id
                )
            })
            .collect();
        let next = next
            .map(|url| format!("\"{}\"", url))
            .unwrap_or_else(|| "null".to_string());
        format!(
            r#"{{"status":"success","data":{{"episodes":[{}]}},"links":{{"next":{}}}}}"#,
            episodes.join(","),
            next
        )
    }

    #[test]
    fn test_connect_to_unreachable_service() {
        // Nothing listens on port 1 locally, the login is refused
        let result = TvdbClient::connect_to("http://127.0.0.1:1/v4/", &credentials());

        assert!(matches!(
            result,
            Err(MetadataRetrievalError::ConnectionFailed(_))
        ));
    }

    #[test]
    fn test_connect_with_rejected_credentials() {
        let base_url = serve(|_, _| {
            (
                401,
                r#"{"status":"failure","message":"Unauthorized"}"#.to_string(),
            )
        });

        match TvdbClient::connect_to(&base_url, &credentials()) {
            Err(MetadataRetrievalError::ConnectionFailed(message)) => {
                assert!(message.contains("401"), "unexpected message: {}", message)
            }
            Err(other) => panic!("expected ConnectionFailed, got {:?}", other),
            Ok(_) => panic!("expected ConnectionFailed, got a client"),
        }
    }

    #[test]
    fn test_null_favourites_are_unavailable() {
        let base_url = serve_logged_in(|target| match target {
            "/v4/user/favorites" => (200, r#"{"status":"success","data":null}"#.to_string()),
            _ => (404, "{}".to_string()),
        });
        let client = TvdbClient::connect_to(&base_url, &credentials()).unwrap();

        assert!(matches!(
            client.fetch_favourites(),
            Err(MetadataRetrievalError::FavouritesUnavailable)
        ));
    }

    #[test]
    fn test_favourites() {
        let base_url = serve_logged_in(|target| match target {
            "/v4/user/favorites" => (
                200,
                r#"{"status":"success","data":{"series":[411469],"movies":[7606]}}"#.to_string(),
            ),
            _ => (404, "{}".to_string()),
        });
        let client = TvdbClient::connect_to(&base_url, &credentials()).unwrap();

        let favourites = client.fetch_favourites().unwrap();

        assert_eq!(favourites.series, vec![411469]);
        assert_eq!(favourites.movies, vec![7606]);
    }

    #[test]
    fn test_missing_translation_fails_request() {
        let base_url = serve_logged_in(|_| (404, r#"{"status":"failure"}"#.to_string()));
        let client = TvdbClient::connect_to(&base_url, &credentials()).unwrap();

        match client.fetch_movie_translation(7606, "eng") {
            Err(MetadataRetrievalError::RequestFailed { endpoint, message }) => {
                assert_eq!(endpoint, "movies/7606/translations/eng");
                assert!(message.contains("404"), "unexpected message: {}", message);
            }
            other => panic!("expected RequestFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_episodes_follow_next_links() {
        let base_url = serve_logged_in(|target| match target {
            "/v4/series/1/episodes/default?page=0" => (
                200,
                episode_page(&[1], Some("https://example.org/series/1/episodes/default?page=1")),
            ),
            "/v4/series/1/episodes/default?page=1" => (200, episode_page(&[2], None)),
            _ => (404, "{}".to_string()),
        });
        let client = TvdbClient::connect_to(&base_url, &credentials()).unwrap();

        let ids: Vec<u64> = client
            .fetch_series_episodes(1)
            .unwrap()
            .iter()
            .map(|episode| episode.id)
            .collect();

        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_episodes_beyond_page_limit_fail() {
        // Every page claims there is another one
        let base_url = serve_logged_in(|_| {
            (
                200,
                episode_page(&[1], Some("https://example.org/series/1/episodes/default")),
            )
        });
        let mut client = TvdbClient::connect_to(&base_url, &credentials()).unwrap();
        client.max_episode_pages = 3;

        match client.fetch_series_episodes(1) {
            Err(MetadataRetrievalError::RequestFailed { endpoint, message }) => {
                assert_eq!(endpoint, "series/1/episodes/default");
                assert_eq!(message, "more than 3 episode pages");
            }
            other => panic!("expected RequestFailed, got {:?}", other),
        }
    }
}
