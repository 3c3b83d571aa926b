//! Integration tests for the TMDB title searcher
//!
//! Runs the real client against a wiremock server to pin the wire
//! behaviour: candidate mapping, transport fault classification and
//! external-id lookup.

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mediamill::domain::value_objects::TitleKind;
use mediamill::infrastructure::external::TmdbClient;
use mediamill::interfaces::external_services::{TitleQuery, TitleSearcher};
use mediamill::shared::error::SearchError;

fn movie_query(title: &str, year: Option<i32>) -> TitleQuery {
    TitleQuery {
        title: title.to_string(),
        year,
        kind: TitleKind::Movie,
    }
}

#[tokio::test]
async fn search_maps_results_to_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("query", "Shaun of the Dead"))
        .and(query_param("year", "2004"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "id": 747,
                "title": "Shaun of the Dead",
                "release_date": "2004-04-09",
                "overview": "A man decides to turn his moribund life around."
            }]
        })))
        .mount(&server)
        .await;

    let client = TmdbClient::with_base_url("test-key", &server.uri()).unwrap();
    let candidates = client
        .search(&movie_query("Shaun of the Dead", Some(2004)))
        .await
        .unwrap();

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].tmdb_id, "747");
    assert_eq!(candidates[0].title, "Shaun of the Dead");
    assert_eq!(candidates[0].year, Some(2004));
    assert_eq!(candidates[0].kind, TitleKind::Movie);
}

#[tokio::test]
async fn results_without_a_title_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": 1, "release_date": "2000-01-01"}]
        })))
        .mount(&server)
        .await;

    let client = TmdbClient::with_base_url("test-key", &server.uri()).unwrap();
    let candidates = client.search(&movie_query("whatever", None)).await.unwrap();
    assert!(candidates.is_empty());
}

#[tokio::test]
async fn server_errors_classify_as_transport_faults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = TmdbClient::with_base_url("test-key", &server.uri()).unwrap();
    let error = client
        .search(&movie_query("anything", None))
        .await
        .unwrap_err();

    assert_matches!(error, SearchError::ApiError(500));
    assert!(error.is_transport());
}

#[tokio::test]
async fn rate_limit_response_is_its_own_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let client = TmdbClient::with_base_url("test-key", &server.uri()).unwrap();
    let error = client
        .search(&movie_query("anything", None))
        .await
        .unwrap_err();

    assert_matches!(error, SearchError::RateLimitExceeded);
    assert!(error.is_transport());
}

#[tokio::test]
async fn fetch_resolves_imdb_style_ids_through_find() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/find/tt0365748"))
        .and(query_param("external_source", "imdb_id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "movie_results": [{
                "id": 747,
                "title": "Shaun of the Dead",
                "release_date": "2004-04-09"
            }],
            "tv_results": []
        })))
        .mount(&server)
        .await;

    let client = TmdbClient::with_base_url("test-key", &server.uri()).unwrap();
    let candidate = client.fetch("tt0365748").await.unwrap();

    // The caller-supplied external id stays the canonical key
    assert_eq!(candidate.tmdb_id, "tt0365748");
    assert_eq!(candidate.title, "Shaun of the Dead");
}

#[tokio::test]
async fn fetch_unknown_external_id_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/find/tt9999999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "movie_results": [],
            "tv_results": []
        })))
        .mount(&server)
        .await;

    let client = TmdbClient::with_base_url("test-key", &server.uri()).unwrap();
    let error = client.fetch("tt9999999").await.unwrap_err();
    assert_matches!(error, SearchError::NotFound(_));
}
