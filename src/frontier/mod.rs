//! Crawl frontier: the deduplicated queue of URLs pending crawl
//!
//! This module wraps the storage layer with the frontier contract:
//! - enqueue with atomic dedup against both the queue and the index
//! - seed reset, so a re-crawl of a seed starts clean
//! - batch draining for the crawl loop
//! - seed expansion through an external subdomain-enumeration tool

use crate::storage::{FrontierEntry, SqliteStorage, Storage, StorageResult};
use crate::KumoError;
use std::sync::{Arc, Mutex};
use tokio::process::Command;

/// Handle to the shared frontier queue.
///
/// Cloning is cheap; all clones share one underlying store.
#[derive(Clone)]
pub struct Frontier {
    storage: Arc<Mutex<SqliteStorage>>,
}

impl Frontier {
    pub fn new(storage: Arc<Mutex<SqliteStorage>>) -> Self {
        Self { storage }
    }

    /// Enqueues a discovered URL. No-op if the URL is already queued or
    /// already has a stored document; returns true if a new entry was
    /// created.
    pub fn enqueue(&self, url: &str, scan_internal: bool) -> StorageResult<bool> {
        self.storage
            .lock()
            .unwrap()
            .enqueue_frontier(url, scan_internal)
    }

    /// Queues a seed or resubmitted URL, replacing any existing entry.
    ///
    /// Unlike [`enqueue`](Self::enqueue), an already-indexed URL is still
    /// queued: seeding expresses re-crawl intent.
    pub fn requeue(&self, url: &str, scan_internal: bool) -> StorageResult<()> {
        self.storage
            .lock()
            .unwrap()
            .requeue_frontier(url, scan_internal)
    }

    /// Deletes any pre-existing entry for a seed URL so a fresh crawl of
    /// that seed starts clean.
    pub fn reset_seed(&self, url: &str) -> StorageResult<()> {
        self.storage.lock().unwrap().delete_frontier_entry(url)
    }

    /// Gets the next pending entry, oldest first, without removing it.
    pub fn next(&self) -> StorageResult<Option<FrontierEntry>> {
        self.storage.lock().unwrap().next_frontier_entry()
    }

    /// Takes a snapshot of every pending entry, oldest first.
    pub fn drain_batch(&self) -> StorageResult<Vec<FrontierEntry>> {
        self.storage.lock().unwrap().list_frontier_entries()
    }

    /// Removes an entry after its processing attempt has completed.
    pub fn complete(&self, url: &str) -> StorageResult<()> {
        self.storage.lock().unwrap().delete_frontier_entry(url)
    }

    pub fn len(&self) -> StorageResult<u64> {
        self.storage.lock().unwrap().count_frontier_entries()
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Expands a domain into its seed URLs.
///
/// With `scan_internal` set, the configured enumeration tool is invoked as
/// `<tool> -d <domain>` and each hostname on stdout becomes one
/// `https://<hostname>` seed; the bare domain itself is not queued
/// separately. Without it, the single URL `https://<domain>` is returned.
///
/// Enumeration failure (spawn error or non-zero exit) is fatal to the
/// seeding operation: no partial or guessed seed list is ever used.
pub async fn seed_urls(
    tool: &str,
    scan_internal: bool,
    domain: &str,
) -> Result<Vec<String>, KumoError> {
    if !scan_internal {
        return Ok(vec![format!("https://{}", domain)]);
    }

    let output = Command::new(tool)
        .arg("-d")
        .arg(domain)
        .output()
        .await
        .map_err(|e| KumoError::Enumeration {
            domain: domain.to_string(),
            message: format!("failed to run {}: {}", tool, e),
        })?;

    if !output.status.success() {
        return Err(KumoError::Enumeration {
            domain: domain.to_string(),
            message: format!("{} exited with {}", tool, output.status),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let seeds: Vec<String> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|host| format!("https://{}", host))
        .collect();

    Ok(seeds)
}
