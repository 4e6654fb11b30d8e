//! HTTP fetcher implementation
//!
//! This module handles outbound page fetches for the crawler, including:
//! - Building HTTP clients with bounded timeouts
//! - Rotating plausible browser user-agent strings per request
//! - Capturing status, remote address, and body for enrichment

use crate::config::CrawlerConfig;
use crate::KumoError;
use rand::Rng;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::time::Duration;

/// Browser user-agent strings rotated across requests.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 Edg/119.0.2151.97",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Picks a user-agent string at random.
pub fn random_user_agent() -> &'static str {
    let index = rand::thread_rng().gen_range(0..USER_AGENTS.len());
    USER_AGENTS[index]
}

/// A successfully completed GET request, regardless of status code.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status: u16,

    /// Remote address the response came from
    pub source_ip: Option<String>,

    /// Content-Type header value, if any
    pub content_type: Option<String>,

    /// Response body
    pub body: String,
}

/// Builds an HTTP client with bounded timeouts
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with a freshly rotated user agent.
///
/// Network failures and timeouts are errors; HTTP error statuses are not.
/// A non-200 response still yields a [`FetchedPage`] so callers decide
/// what a 404 or 500 means for them.
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, KumoError> {
    let response = client
        .get(url)
        .header(USER_AGENT, random_user_agent())
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let source_ip = response.remote_addr().map(|addr| addr.ip().to_string());
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let body = response
        .text()
        .await
        .map_err(|e| classify_error(url, e))?;

    Ok(FetchedPage {
        final_url,
        status,
        source_ip,
        content_type,
        body,
    })
}

fn classify_error(url: &str, error: reqwest::Error) -> KumoError {
    if error.is_timeout() {
        KumoError::Timeout {
            url: url.to_string(),
        }
    } else {
        KumoError::Fetch {
            url: url.to_string(),
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlerConfig;

    #[test]
    fn test_build_http_client() {
        let config = CrawlerConfig::default();
        assert!(build_http_client(&config).is_ok());
    }

    #[test]
    fn test_random_user_agent_looks_like_a_browser() {
        for _ in 0..20 {
            assert!(random_user_agent().starts_with("Mozilla/5.0"));
        }
    }

    #[tokio::test]
    async fn test_fetch_captures_status_and_body() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let client = build_http_client(&CrawlerConfig::default()).unwrap();
        let page = fetch_page(&client, &format!("{}/page", server.uri()))
            .await
            .unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.body, "hello");
        assert!(page.source_ip.is_some());
    }

    #[tokio::test]
    async fn test_fetch_reports_non_200_statuses() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = build_http_client(&CrawlerConfig::default()).unwrap();
        let page = fetch_page(&client, &format!("{}/missing", server.uri()))
            .await
            .unwrap();

        assert_eq!(page.status, 404);
    }

    #[tokio::test]
    async fn test_fetch_fails_on_unreachable_host() {
        let client = build_http_client(&CrawlerConfig::default()).unwrap();
        let result = fetch_page(&client, "http://127.0.0.1:1/never").await;
        assert!(result.is_err());
    }
}
