//! TMDB Client Implementation
//!
//! Title searcher backed by the TMDB REST API, with request rate
//! limiting. External ids are opaque strings: `tt`-prefixed IMDB ids are
//! resolved through the find endpoint, everything else is treated as a
//! native TMDB id.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::dto::{
    year_of, TmdbFindResponse, TmdbMovieDetail, TmdbSearchResponse, TmdbSearchResult,
    TmdbTvDetail,
};
use crate::domain::value_objects::{TitleCandidate, TitleKind};
use crate::interfaces::external_services::{TitleQuery, TitleSearcher};
use crate::shared::error::SearchError;

/// Requests allowed against the TMDB API per second
const REQUESTS_PER_SECOND: u32 = 4;

/// TMDB API client with request pacing
pub struct TmdbClient {
    api_key: String,
    http_client: Client,
    base_url: String,
    pacer: RequestPacer,
}

impl TmdbClient {
    /// Creates a new TMDB client.
    ///
    /// # Errors
    /// Returns error if the api key is empty or the HTTP client cannot
    /// be built.
    pub fn new(api_key: &str) -> Result<Self, SearchError> {
        Self::with_base_url(api_key, "https://api.themoviedb.org/3")
    }

    /// Creates a client against a custom base url (tests).
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, SearchError> {
        if api_key.is_empty() {
            return Err(SearchError::InvalidApiKey);
        }

        Ok(Self {
            api_key: api_key.to_string(),
            http_client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|e| SearchError::Network(e.to_string()))?,
            base_url: base_url.trim_end_matches('/').to_string(),
            pacer: RequestPacer::per_second(REQUESTS_PER_SECOND),
        })
    }

    /// Makes a GET request to the TMDB API.
    async fn make_request<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<T, SearchError> {
        self.pacer.wait_turn().await;

        let separator = if endpoint.contains('?') { '&' } else { '?' };
        let url = format!(
            "{}{}{}api_key={}",
            self.base_url, endpoint, separator, self.api_key
        );

        let response = self.http_client.get(&url).send().await?;
        let status = response.status();

        if status.as_u16() == 429 {
            return Err(SearchError::RateLimitExceeded);
        }
        if status.as_u16() == 401 {
            return Err(SearchError::InvalidApiKey);
        }
        if status.as_u16() == 404 {
            return Err(SearchError::NotFound(endpoint.to_string()));
        }
        if !status.is_success() {
            return Err(SearchError::ApiError(status.as_u16()));
        }

        let data = response.json().await?;
        Ok(data)
    }

    fn movie_candidate(result: TmdbSearchResult) -> Option<TitleCandidate> {
        Some(TitleCandidate {
            tmdb_id: result.id.to_string(),
            kind: TitleKind::Movie,
            title: result.title?,
            year: year_of(result.release_date.as_deref()),
            overview: result.overview,
            genres: Vec::new(),
        })
    }

    fn series_candidate(result: TmdbSearchResult) -> Option<TitleCandidate> {
        Some(TitleCandidate {
            tmdb_id: result.id.to_string(),
            kind: TitleKind::Series,
            title: result.name?,
            year: year_of(result.first_air_date.as_deref()),
            overview: result.overview,
            genres: Vec::new(),
        })
    }

    async fn fetch_movie_detail(&self, id: &str) -> Result<TitleCandidate, SearchError> {
        let detail: TmdbMovieDetail = self.make_request(&format!("/movie/{id}")).await?;
        Ok(TitleCandidate {
            tmdb_id: detail.imdb_id.unwrap_or_else(|| detail.id.to_string()),
            kind: TitleKind::Movie,
            title: detail.title,
            year: year_of(detail.release_date.as_deref()),
            overview: detail.overview,
            genres: detail.genres.into_iter().map(|g| g.name).collect(),
        })
    }

    async fn fetch_tv_detail(&self, id: &str) -> Result<TitleCandidate, SearchError> {
        let detail: TmdbTvDetail = self.make_request(&format!("/tv/{id}")).await?;
        Ok(TitleCandidate {
            tmdb_id: detail.id.to_string(),
            kind: TitleKind::Series,
            title: detail.name,
            year: year_of(detail.first_air_date.as_deref()),
            overview: detail.overview,
            genres: detail.genres.into_iter().map(|g| g.name).collect(),
        })
    }

    /// Resolves a `tt`-prefixed IMDB id via the find endpoint.
    async fn find_by_external_id(&self, imdb_id: &str) -> Result<TitleCandidate, SearchError> {
        let endpoint = format!("/find/{imdb_id}?external_source=imdb_id");
        let response: TmdbFindResponse = self.make_request(&endpoint).await?;

        if let Some(movie) = response.movie_results.into_iter().next() {
            let mut candidate = Self::movie_candidate(movie)
                .ok_or_else(|| SearchError::Deserialization("movie without title".to_string()))?;
            candidate.tmdb_id = imdb_id.to_string();
            return Ok(candidate);
        }
        if let Some(tv) = response.tv_results.into_iter().next() {
            let mut candidate = Self::series_candidate(tv)
                .ok_or_else(|| SearchError::Deserialization("series without name".to_string()))?;
            candidate.tmdb_id = imdb_id.to_string();
            return Ok(candidate);
        }
        Err(SearchError::NotFound(imdb_id.to_string()))
    }
}

#[async_trait]
impl TitleSearcher for TmdbClient {
    async fn search(&self, query: &TitleQuery) -> Result<Vec<TitleCandidate>, SearchError> {
        let encoded = urlencoding::encode(&query.title);
        let endpoint = match (query.kind, query.year) {
            (TitleKind::Movie, Some(y)) => format!("/search/movie?query={encoded}&year={y}"),
            (TitleKind::Movie, None) => format!("/search/movie?query={encoded}"),
            (TitleKind::Series, Some(y)) => {
                format!("/search/tv?query={encoded}&first_air_date_year={y}")
            }
            (TitleKind::Series, None) => format!("/search/tv?query={encoded}"),
        };

        let response: TmdbSearchResponse = self.make_request(&endpoint).await?;
        debug!(
            "TMDB search {:?} ({}) returned {} result(s)",
            query.title,
            query.kind,
            response.results.len()
        );

        let candidates = response
            .results
            .into_iter()
            .filter_map(|r| match query.kind {
                TitleKind::Movie => Self::movie_candidate(r),
                TitleKind::Series => Self::series_candidate(r),
            })
            .collect();
        Ok(candidates)
    }

    async fn fetch(&self, tmdb_id: &str) -> Result<TitleCandidate, SearchError> {
        if tmdb_id.starts_with("tt") {
            return self.find_by_external_id(tmdb_id).await;
        }

        match self.fetch_movie_detail(tmdb_id).await {
            Ok(candidate) => Ok(candidate),
            Err(SearchError::NotFound(_)) => self.fetch_tv_detail(tmdb_id).await,
            Err(e) => Err(e),
        }
    }
}

/// Spaces outbound API calls at least one gap apart.
///
/// Callers queue on the mutex; each takes its departure slot by pushing
/// the shared `next_slot` forward before sleeping until its own slot
/// arrives. A burst therefore drains at the configured rate instead of
/// firing together.
struct RequestPacer {
    gap: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestPacer {
    fn per_second(rate: u32) -> Self {
        Self {
            gap: Duration::from_secs(1) / rate.max(1),
            next_slot: Mutex::new(None),
        }
    }

    /// Waits until this caller's departure slot arrives.
    async fn wait_turn(&self) {
        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next_slot = Some(slot + self.gap);
            slot
        };
        tokio::time::sleep_until(slot).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacer_gap_follows_the_rate() {
        let pacer = RequestPacer::per_second(4);
        assert_eq!(pacer.gap, Duration::from_millis(250));

        // A zero rate must not divide by zero
        let pacer = RequestPacer::per_second(0);
        assert_eq!(pacer.gap, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn burst_drains_at_the_configured_rate() {
        let pacer = RequestPacer::per_second(2);

        let start = Instant::now();
        pacer.wait_turn().await;
        let first = start.elapsed();
        pacer.wait_turn().await;
        let second = start.elapsed();
        pacer.wait_turn().await;
        let third = start.elapsed();

        assert!(first < Duration::from_millis(10));
        assert!(second >= Duration::from_millis(500));
        assert!(third >= Duration::from_millis(1000));
    }
}
