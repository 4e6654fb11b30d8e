//! Integration tests for the hybrid search path
//!
//! These tests run real queries against a temporary index with a mock
//! search-engine endpoint standing in for the live web.

use kumo::config::LiveSearchConfig;
use kumo::search::{HybridSearch, SearchSession};
use kumo::storage::{Document, SqliteStorage, Storage};
use kumo::TextAnalyzer;
use std::path::Path;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RESULTS_PAGE: &str = r#"
<html><body>
    <div class="result">
        <a class="result__a" href="https://example.com/first">First Result</a>
        <div class="result__snippet">Rust makes reliable crawlers</div>
    </div>
    <div class="result">
        <a class="result__a" href="https://example.org/second">Second Result</a>
        <div class="result__snippet">Another snippet entirely</div>
    </div>
</body></html>
"#;

fn open_storage(db_path: &Path) -> Arc<Mutex<SqliteStorage>> {
    Arc::new(Mutex::new(
        SqliteStorage::new(db_path).expect("Failed to open DB"),
    ))
}

fn live_config(server: &MockServer) -> LiveSearchConfig {
    LiveSearchConfig {
        endpoint: format!("{}/html", server.uri()),
        max_results: 10,
        fetch_timeout_secs: 5,
    }
}

fn engine(storage: Arc<Mutex<SqliteStorage>>, server: &MockServer) -> HybridSearch {
    HybridSearch::new(storage, Arc::new(TextAnalyzer::new()), &live_config(server))
        .expect("Failed to build search engine")
}

fn stored_document(url: &str, excerpt: &str, term: &str) -> Document {
    Document {
        url: url.to_string(),
        title: Some("Stored".to_string()),
        body_excerpt: excerpt.to_string(),
        term_frequencies: [(term.to_string(), 0.1)].into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_empty_index_falls_back_to_live_search() {
    let server = MockServer::start().await;
    // The live search always carries the raw query text.
    Mock::given(method("GET"))
        .and(path("/html/"))
        .and(query_param("q", "helo"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let storage = open_storage(&dir.path().join("live.db"));
    let engine = engine(storage.clone(), &server);
    let mut session = SearchSession::new();

    let response = engine.search("helo", None, &mut session).await.unwrap();

    assert_eq!(response.corrected_query, "hello");
    assert!(response.spelling_corrected);
    assert_eq!(response.total_count, 2);
    assert!(response.results.iter().all(|document| document.uses == 1));

    // Live hits were stored for future queries
    let stored = storage
        .lock()
        .unwrap()
        .get_document("https://example.com/first")
        .unwrap()
        .expect("live result should be stored");
    assert_eq!(stored.uses, 1);
    assert_eq!(stored.title.as_deref(), Some("First Result"));
    assert!(stored.term_frequencies.contains_key("crawlers"));
}

#[tokio::test]
async fn test_repeat_live_sightings_increment_uses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let storage = open_storage(&dir.path().join("uses.db"));
    let engine = engine(storage.clone(), &server);
    let mut session = SearchSession::new();

    // Neither query matches the stored snippets, so both go live.
    engine.search("zzyzx", None, &mut session).await.unwrap();
    let response = engine.search("qwxyz", None, &mut session).await.unwrap();

    assert!(response.results.iter().all(|document| document.uses == 2));
}

#[tokio::test]
async fn test_cached_results_answer_the_query() {
    let server = MockServer::start().await;
    // Background enrichment may still hit the endpoint; give it an empty
    // page so it stores nothing.
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let storage = open_storage(&dir.path().join("cached.db"));
    {
        let mut guard = storage.lock().unwrap();
        guard
            .upsert_document(&stored_document(
                "https://example.com/quokkas",
                "all about the quokka",
                "quokka",
            ))
            .unwrap();
    }

    let engine = engine(storage.clone(), &server);
    let mut session = SearchSession::new();

    let response = engine.search("quokka", None, &mut session).await.unwrap();

    assert_eq!(response.total_count, 1);
    assert_eq!(response.results[0].url, "https://example.com/quokkas");
}

#[tokio::test]
async fn test_live_failure_degrades_to_zero_results() {
    let dir = tempfile::tempdir().unwrap();
    let storage = open_storage(&dir.path().join("degrade.db"));

    // nothing is listening on this endpoint
    let config = LiveSearchConfig {
        endpoint: "http://127.0.0.1:1/html".to_string(),
        max_results: 10,
        fetch_timeout_secs: 1,
    };
    let engine = HybridSearch::new(storage, Arc::new(TextAnalyzer::new()), &config).unwrap();
    let mut session = SearchSession::new();

    let response = engine
        .search("unmatchable", None, &mut session)
        .await
        .expect("live failure must not surface as an error");

    assert_eq!(response.total_count, 0);
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn test_pagination_clamps_to_last_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let storage = open_storage(&dir.path().join("pages.db"));
    {
        let mut guard = storage.lock().unwrap();
        for n in 0..23 {
            guard
                .upsert_document(&stored_document(
                    &format!("https://example.com/widget-{:02}", n),
                    "a widget page",
                    "widget",
                ))
                .unwrap();
        }
    }

    let engine = engine(storage, &server);
    let mut session = SearchSession::new();

    let first = engine.search("widget", Some(1), &mut session).await.unwrap();
    assert_eq!(first.results.len(), 10);
    assert_eq!(first.total_count, 23);
    assert_eq!(first.total_pages, 3);

    let clamped = engine.search("widget", Some(99), &mut session).await.unwrap();
    assert_eq!(clamped.page, 3);
    assert_eq!(clamped.results.len(), 3);

    let defaulted = engine.search("widget", Some(0), &mut session).await.unwrap();
    assert_eq!(defaulted.page, 1);
    assert_eq!(defaulted.results.len(), 10);
}

#[tokio::test]
async fn test_suggestions_accumulate_across_a_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let storage = open_storage(&dir.path().join("session.db"));
    let engine = engine(storage, &server);
    let mut session = SearchSession::new();

    engine.search("helo", None, &mut session).await.unwrap();
    let response = engine.search("hello", None, &mut session).await.unwrap();

    assert_eq!(
        response.suggestions,
        vec!["helo".to_string(), "hello".to_string(), "hello".to_string()]
    );
}
