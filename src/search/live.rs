//! Live web search: fetching and parsing a search-engine results page
//!
//! When the stored index cannot answer a query (or as background
//! enrichment when it can), the HTML results endpoint is fetched with a
//! rotated user agent and each result block is parsed into a candidate
//! document: link, title, and snippet.

use crate::config::LiveSearchConfig;
use crate::crawler::random_user_agent;
use crate::KumoError;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

/// One parsed result block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveResult {
    pub url: String,
    pub title: Option<String>,
    pub snippet: Option<String>,
}

/// Fetches and parses live search results.
pub struct LiveSearch {
    client: Client,
    endpoint: String,
    max_results: usize,
}

impl LiveSearch {
    pub fn new(config: &LiveSearchConfig) -> Result<Self, KumoError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            max_results: config.max_results,
        })
    }

    /// Fetches the results page for a query and parses its result blocks.
    pub async fn search(&self, query: &str) -> Result<Vec<LiveResult>, KumoError> {
        let url = format!("{}/?q={}", self.endpoint, urlencoding::encode(query));

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, random_user_agent())
            .send()
            .await
            .map_err(|e| KumoError::Fetch {
                url: url.clone(),
                source: e,
            })?;

        let html = response.text().await.map_err(|e| KumoError::Fetch {
            url: url.clone(),
            source: e,
        })?;

        Ok(parse_results(&html, self.max_results))
    }
}

/// Parses result blocks out of a results page.
///
/// The markup follows the classic HTML-endpoint layout: a `.result`
/// container per hit, a `.result__a` anchor carrying link and title, and
/// a `.result__snippet` body. Blocks missing an anchor are skipped.
pub fn parse_results(html: &str, limit: usize) -> Vec<LiveResult> {
    let document = Html::parse_document(html);

    let Ok(result_selector) = Selector::parse(".result") else {
        return Vec::new();
    };
    let Ok(anchor_selector) = Selector::parse(".result__a") else {
        return Vec::new();
    };
    let Ok(snippet_selector) = Selector::parse(".result__snippet") else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for block in document.select(&result_selector) {
        if results.len() >= limit {
            break;
        }

        let Some(anchor) = block.select(&anchor_selector).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(url) = clean_result_url(href) else {
            continue;
        };

        results.push(LiveResult {
            url,
            title: element_text(anchor),
            snippet: block.select(&snippet_selector).next().and_then(element_text),
        });
    }

    results
}

fn element_text(element: ElementRef) -> Option<String> {
    let text = element
        .text()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Unwraps redirect-wrapped result links and normalizes scheme-relative
/// ones. The HTML endpoint wraps destinations as `/l/?uddg=<encoded>`.
fn clean_result_url(href: &str) -> Option<String> {
    if let Some(index) = href.find("uddg=") {
        let encoded = &href[index + 5..];
        let encoded = encoded.split('&').next().unwrap_or(encoded);
        return urlencoding::decode(encoded).ok().map(|url| url.into_owned());
    }

    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }

    if href.starts_with("//") {
        return Some(format!("https:{}", href));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
    <html><body>
        <div class="results">
            <div class="result">
                <h2 class="result__title">
                    <a class="result__a" href="https://example.com/first">First Result</a>
                </h2>
                <a class="result__snippet" href="https://example.com/first">A snippet about the first hit</a>
            </div>
            <div class="result">
                <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.org%2Fsecond&amp;rut=abc">Second</a>
                <div class="result__snippet">Second snippet</div>
            </div>
            <div class="result">
                <span>no anchor here</span>
            </div>
        </div>
    </body></html>
    "#;

    #[test]
    fn test_parse_results_extracts_blocks() {
        let results = parse_results(RESULTS_PAGE, 10);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://example.com/first");
        assert_eq!(results[0].title.as_deref(), Some("First Result"));
        assert_eq!(
            results[0].snippet.as_deref(),
            Some("A snippet about the first hit")
        );
        assert_eq!(results[1].url, "https://example.org/second");
    }

    #[test]
    fn test_parse_results_respects_limit() {
        let results = parse_results(RESULTS_PAGE, 1);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_parse_results_on_garbage_is_empty() {
        assert!(parse_results("<html><body>nothing here</body></html>", 10).is_empty());
    }

    #[test]
    fn test_clean_result_url_unwraps_redirect() {
        assert_eq!(
            clean_result_url("//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rut=x"),
            Some("https://example.com/page".to_string())
        );
    }

    #[test]
    fn test_clean_result_url_passes_absolute() {
        assert_eq!(
            clean_result_url("https://example.com/page"),
            Some("https://example.com/page".to_string())
        );
    }

    #[test]
    fn test_clean_result_url_rejects_relative() {
        assert_eq!(clean_result_url("/local/path"), None);
    }

    #[tokio::test]
    async fn test_live_search_fetches_endpoint() {
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html/"))
            .and(query_param("q", "rust crawler"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
            .mount(&server)
            .await;

        let config = LiveSearchConfig {
            endpoint: format!("{}/html", server.uri()),
            max_results: 10,
            fetch_timeout_secs: 5,
        };
        let live = LiveSearch::new(&config).unwrap();

        let results = live.search("rust crawler").await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_live_search_unreachable_endpoint_is_an_error() {
        let config = LiveSearchConfig {
            endpoint: "http://127.0.0.1:1/html".to_string(),
            max_results: 10,
            fetch_timeout_secs: 1,
        };
        let live = LiveSearch::new(&config).unwrap();

        assert!(live.search("anything").await.is_err());
    }
}
