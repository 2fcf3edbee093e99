//! TMDB movie search client.
//!
//! A standalone lookup capability: it is not wired into the chat request
//! path. Failures come back as placeholder strings inside the result list,
//! never as errors, so callers can surface them directly.

use serde::Deserialize;

/// Default TMDB endpoint.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org";

/// Maximum number of titles returned per search.
const MAX_RESULTS: usize = 4;

/// Client for the TMDB movie search API.
#[derive(Clone)]
pub struct MovieClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl std::fmt::Debug for MovieClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovieClient")
            .field("base_url", &self.base_url)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<MovieResult>,
}

#[derive(Debug, Deserialize)]
struct MovieResult {
    title: Option<String>,
    #[serde(default)]
    overview: String,
}

impl MovieClient {
    /// Create a client against the public TMDB endpoint.
    ///
    /// The credential is optional; searches without one return a
    /// configuration-error placeholder.
    #[must_use]
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self::with_base_url(http, api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom endpoint.
    #[must_use]
    pub fn with_base_url(
        http: reqwest::Client,
        api_key: Option<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            api_key,
            base_url: base_url.into(),
        }
    }

    /// Search movies by free text, optionally keeping only results whose
    /// title or synopsis contains `filter` (case-insensitive). At most four
    /// titles are returned.
    pub async fn search(&self, query: &str, filter: Option<&str>) -> Vec<String> {
        let Some(api_key) = &self.api_key else {
            return vec!["Error: TMDB API Key not configured".to_string()];
        };

        let url = format!("{}/3/search/movie", self.base_url.trim_end_matches('/'));

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("api_key", api_key.as_str()),
                ("query", query),
                ("language", "en-US"),
            ])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        let resp = match resp {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "movie search request failed");
                return vec!["Error fetching movie data".to_string()];
            }
        };

        match resp.json::<SearchResponse>().await {
            Ok(parsed) => filter_titles(parsed.results, filter),
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "movie search payload malformed");
                vec!["Error processing movie data".to_string()]
            }
        }
    }
}

/// Apply the optional keyword filter and truncate to [`MAX_RESULTS`] titles.
fn filter_titles(results: Vec<MovieResult>, filter: Option<&str>) -> Vec<String> {
    let matches = |m: &MovieResult| {
        let Some(needle) = filter else { return true };
        let needle = needle.to_lowercase();
        m.title
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(&needle))
            || m.overview.to_lowercase().contains(&needle)
    };

    results
        .into_iter()
        .filter(matches)
        .take(MAX_RESULTS)
        .map(|m| m.title.unwrap_or_else(|| "Unknown Title".to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(title: &str, overview: &str) -> MovieResult {
        MovieResult {
            title: Some(title.to_string()),
            overview: overview.to_string(),
        }
    }

    #[test]
    fn no_filter_truncates_to_four() {
        let results = (0..6).map(|i| movie(&format!("Movie {i}"), "")).collect();
        let titles = filter_titles(results, None);
        assert_eq!(titles, vec!["Movie 0", "Movie 1", "Movie 2", "Movie 3"]);
    }

    #[test]
    fn filter_matches_title_or_overview_case_insensitively() {
        let results = vec![
            movie("Space Heist", "a robbery beyond the stars"),
            movie("Quiet Village", "a thriller set in space"),
            movie("Ground Story", "no match here"),
        ];
        let titles = filter_titles(results, Some("SPACE"));
        assert_eq!(titles, vec!["Space Heist", "Quiet Village"]);
    }

    #[test]
    fn missing_title_renders_placeholder() {
        let results = vec![MovieResult {
            title: None,
            overview: String::new(),
        }];
        assert_eq!(filter_titles(results, None), vec!["Unknown Title"]);
    }

    #[tokio::test]
    async fn missing_credential_is_a_config_error() {
        let client = MovieClient::new(reqwest::Client::new(), None);
        assert_eq!(
            client.search("inception", None).await,
            vec!["Error: TMDB API Key not configured"]
        );
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_fetch_error() {
        let client = MovieClient::with_base_url(
            reqwest::Client::new(),
            Some("k".to_string()),
            "http://127.0.0.1:1",
        );
        assert_eq!(
            client.search("inception", None).await,
            vec!["Error fetching movie data"]
        );
    }
}
