//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with rotating user agents and bounded timeouts
//! - Per-page enrichment and link extraction
//! - Concurrent crawl coordination
//! - The periodic re-crawl pass over stored documents

mod coordinator;
mod fetcher;
mod processor;
mod recrawl;

pub use coordinator::Coordinator;
pub use fetcher::{build_http_client, fetch_page, random_user_agent, FetchedPage};
pub use processor::PageProcessor;
pub use recrawl::{run_recrawl, RecrawlSummary, Recrawler};

use crate::config::Config;
use crate::KumoError;

/// Runs a complete crawl operation
///
/// This is the main entry point for a domain crawl. It will:
/// 1. Initialize the storage layer
/// 2. Expand the domain into seed URLs
/// 3. Drain the frontier with concurrent per-URL tasks
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `domain` - The domain to crawl
/// * `scan_internal` - Whether to expand subdomains and outbound links
///
/// # Returns
///
/// * `Ok(u64)` - Number of pages processed
/// * `Err(KumoError)` - Seeding or storage failed
pub async fn crawl(config: Config, domain: &str, scan_internal: bool) -> Result<u64, KumoError> {
    let coordinator = Coordinator::new(config)?;
    coordinator.seed_domain(domain, scan_internal).await?;
    coordinator.run().await
}
