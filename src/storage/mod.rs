//! Storage module for the document index and crawl frontier
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Document upsert and field search
//! - Frontier queue management with atomic dedup-insert
//! - Term vocabulary extraction for spelling correction

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use std::collections::{BTreeSet, HashMap};

/// A stored, enriched record for one crawled or live-search-discovered URL.
///
/// Documents are keyed by URL; upserting an existing URL overwrites every
/// field (last write wins), except the `uses` counter which never moves
/// backwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    /// Unique key
    pub url: String,

    /// HTTP status of the fetch that produced this record; absent for
    /// documents sourced from live search-result snippets
    pub http_status: Option<u16>,

    /// Remote address the page was served from
    pub source_ip: Option<String>,

    /// Whether this URL's outbound links were expanded when it was crawled
    pub scan_internal_links: bool,

    /// Page title
    pub title: Option<String>,

    /// Union of the whitespace and comma tokenizations of the keywords
    /// meta tag
    pub meta_keywords: BTreeSet<String>,

    /// Meta description, or the first 250 characters of body text, or the
    /// full body text, or empty
    pub body_excerpt: String,

    /// Entities in recognizer scan order, duplicates preserved
    pub named_entities: Vec<String>,

    /// Term -> normalized frequency
    pub term_frequencies: HashMap<String, f64>,

    /// Usage counter; live-search-sourced documents start at 1
    pub uses: i64,

    /// RFC 3339 timestamp of the last (re)processing
    pub crawled_at: Option<String>,
}

/// A URL waiting in the crawl frontier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Unique key
    pub url: String,

    /// Whether outbound links of this page should also be enqueued
    pub scan_internal_links: bool,
}
