//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects
//! of the crawling process, including:
//! - Initializing storage and the shared analyzer
//! - Seeding the frontier from a domain or a single submitted URL
//! - Draining the frontier with a pool of concurrent per-URL tasks
//! - Progress reporting

use crate::config::Config;
use crate::crawler::fetcher::build_http_client;
use crate::crawler::processor::PageProcessor;
use crate::frontier::{seed_urls, Frontier};
use crate::storage::SqliteStorage;
use crate::{KumoError, TextAnalyzer};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::Semaphore;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    frontier: Frontier,
    processor: Arc<PageProcessor>,
}

impl Coordinator {
    /// Creates a new coordinator instance, opening the database at the
    /// configured path.
    pub fn new(config: Config) -> Result<Self, KumoError> {
        let storage = Arc::new(Mutex::new(SqliteStorage::new(Path::new(
            &config.output.database_path,
        ))?));
        Self::with_storage(config, storage)
    }

    /// Creates a coordinator over an already-open storage handle.
    pub fn with_storage(
        config: Config,
        storage: Arc<Mutex<SqliteStorage>>,
    ) -> Result<Self, KumoError> {
        let analyzer = Arc::new(TextAnalyzer::new());
        let client = build_http_client(&config.crawler)?;
        let processor = Arc::new(PageProcessor::new(client, storage.clone(), analyzer));
        let frontier = Frontier::new(storage);

        Ok(Self {
            config: Arc::new(config),
            frontier,
            processor,
        })
    }

    /// Seeds the frontier for a domain crawl.
    ///
    /// With `scan_internal` set, the subdomain-enumeration tool expands
    /// the domain and each discovered subdomain is queued; the bare
    /// domain URL is not queued separately. Enumeration failure aborts
    /// seeding entirely. Any pre-existing queue entry for the seed URL is
    /// deleted first so the re-crawl starts clean.
    ///
    /// Returns the number of URLs queued.
    pub async fn seed_domain(&self, domain: &str, scan_internal: bool) -> Result<usize, KumoError> {
        let seeds = seed_urls(&self.config.seeding.subdomain_tool, scan_internal, domain).await?;

        self.frontier.reset_seed(&format!("https://{}", domain))?;

        for seed in &seeds {
            self.frontier.requeue(seed, scan_internal)?;
        }

        tracing::info!("Seeded {} URL(s) for {}", seeds.len(), domain);
        Ok(seeds.len())
    }

    /// Queues a single submitted URL for crawling, replacing any existing
    /// queue entry. Submitted URLs never expand their outbound links.
    pub fn submit_url(&self, url: &str) -> Result<(), KumoError> {
        self.frontier.reset_seed(url)?;
        self.frontier.requeue(url, false)?;
        tracing::info!("Queued {} for crawling", url);
        Ok(())
    }

    /// Runs the main crawl loop until the frontier drains.
    ///
    /// Each frontier entry is processed by an independent task owning
    /// exactly one URL; concurrency is capped by a semaphore. A failed
    /// page is logged and the run continues. Entries are removed after
    /// their processing attempt, so a page that fails permanently does
    /// not wedge the queue.
    ///
    /// Returns the number of pages processed.
    pub async fn run(&self) -> Result<u64, KumoError> {
        let semaphore = Arc::new(Semaphore::new(
            self.config.crawler.max_concurrent_fetches as usize,
        ));
        let start_time = Instant::now();
        let mut pages_processed: u64 = 0;

        loop {
            let batch = self.frontier.drain_batch()?;
            if batch.is_empty() {
                break;
            }

            let mut handles = Vec::with_capacity(batch.len());
            for entry in batch {
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };
                let processor = self.processor.clone();
                let frontier = self.frontier.clone();

                handles.push(tokio::spawn(async move {
                    let _permit = permit;

                    match processor
                        .process(&entry.url, entry.scan_internal_links)
                        .await
                    {
                        Ok(Some(_)) => tracing::debug!("Processed {}", entry.url),
                        Ok(None) => tracing::debug!("Skipped {}", entry.url),
                        Err(e) => tracing::error!("Error processing {}: {}", entry.url, e),
                    }

                    if let Err(e) = frontier.complete(&entry.url) {
                        tracing::error!("Failed to dequeue {}: {}", entry.url, e);
                    }
                }));
            }

            for handle in handles {
                let _ = handle.await;
                pages_processed += 1;
            }

            let elapsed = start_time.elapsed();
            let rate = pages_processed as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
            tracing::info!(
                "Progress: {} pages processed, {} in frontier, {:.2} pages/sec",
                pages_processed,
                self.frontier.len()?,
                rate
            );
        }

        tracing::info!(
            "Crawl completed: {} pages processed in {:?}",
            pages_processed,
            start_time.elapsed()
        );

        Ok(pages_processed)
    }
}
