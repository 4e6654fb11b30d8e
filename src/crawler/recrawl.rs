//! Periodic re-crawl of already-indexed documents
//!
//! This module implements the refresh pass: every stored document is
//! re-fetched and re-enriched in place. When the structured fetch path
//! fails, a plain fetch with a default client is tried before the URL is
//! given up on for the cycle.

use crate::config::Config;
use crate::crawler::fetcher::FetchedPage;
use crate::crawler::processor::PageProcessor;
use crate::storage::{SqliteStorage, Storage};
use crate::{KumoError, TextAnalyzer};
use reqwest::Client;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Outcome of one refresh pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecrawlSummary {
    /// Documents successfully re-enriched
    pub refreshed: u64,

    /// URLs skipped because the page no longer returns 200
    pub skipped: u64,

    /// URLs where both fetch paths failed this cycle
    pub failed: u64,
}

/// Re-processes every stored document.
pub struct Recrawler {
    storage: Arc<Mutex<SqliteStorage>>,
    processor: Arc<PageProcessor>,
    fallback_client: Client,
}

impl Recrawler {
    pub fn new(config: &Config) -> Result<Self, KumoError> {
        let storage = Arc::new(Mutex::new(SqliteStorage::new(Path::new(
            &config.output.database_path,
        ))?));
        Self::with_storage(config, storage)
    }

    pub fn with_storage(
        config: &Config,
        storage: Arc<Mutex<SqliteStorage>>,
    ) -> Result<Self, KumoError> {
        let analyzer = Arc::new(TextAnalyzer::new());
        let client = super::build_http_client(&config.crawler)?;
        let processor = Arc::new(PageProcessor::new(client, storage.clone(), analyzer));

        // The fallback path uses a plain client: default headers, no
        // rotated user agent.
        let fallback_client = Client::builder()
            .timeout(Duration::from_secs(config.crawler.fetch_timeout_secs))
            .build()?;

        Ok(Self {
            storage,
            processor,
            fallback_client,
        })
    }

    /// Refreshes every stored document once.
    ///
    /// Per-URL failures are logged and the pass continues with the next
    /// URL; only storage-level failures abort the cycle.
    pub async fn run(&self) -> Result<RecrawlSummary, KumoError> {
        let urls = { self.storage.lock().unwrap().list_document_urls()? };
        tracing::info!("Re-crawling {} stored document(s)", urls.len());

        let mut summary = RecrawlSummary::default();
        for url in urls {
            let scan_flag = {
                let storage = self.storage.lock().unwrap();
                storage
                    .get_document(&url)?
                    .map(|document| document.scan_internal_links)
                    .unwrap_or(false)
            };

            match self.processor.refresh(&url, scan_flag).await {
                Ok(Some(_)) => {
                    tracing::debug!("Refreshed {}", url);
                    summary.refreshed += 1;
                }
                Ok(None) => {
                    tracing::debug!("Skipped {} (non-200)", url);
                    summary.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "Structured fetch failed for {}: {}; retrying with plain fetch",
                        url,
                        e
                    );
                    match self.refresh_plain(&url, scan_flag).await {
                        Ok(true) => summary.refreshed += 1,
                        Ok(false) => summary.skipped += 1,
                        Err(e) => {
                            tracing::error!("Giving up on {} for this cycle: {}", url, e);
                            summary.failed += 1;
                        }
                    }
                }
            }
        }

        tracing::info!(
            "Re-crawl finished: {} refreshed, {} skipped, {} failed",
            summary.refreshed,
            summary.skipped,
            summary.failed
        );
        Ok(summary)
    }

    /// The unstructured fallback path: a bare GET with the default client,
    /// no link expansion.
    async fn refresh_plain(&self, url: &str, scan_flag: bool) -> Result<bool, KumoError> {
        let response = self
            .fallback_client
            .get(url)
            .send()
            .await
            .map_err(|e| KumoError::Fetch {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Ok(false);
        }

        let source_ip = response.remote_addr().map(|addr| addr.ip().to_string());
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| KumoError::Fetch {
            url: url.to_string(),
            source: e,
        })?;

        let page = FetchedPage {
            final_url,
            status,
            source_ip,
            content_type: None,
            body,
        };
        let document = self.processor.enrich(url, scan_flag, &page);

        let mut storage = self.storage.lock().unwrap();
        storage.upsert_document(&document)?;
        Ok(true)
    }
}

/// Runs a complete refresh pass against the configured database.
pub async fn run_recrawl(config: Config) -> Result<RecrawlSummary, KumoError> {
    let recrawler = Recrawler::new(&config)?;
    recrawler.run().await
}
