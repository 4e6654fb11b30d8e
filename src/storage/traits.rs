//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{Document, FrontierEntry};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all persistence operations needed by the crawler
/// and the hybrid search path. Per-key operations (document upsert,
/// frontier dedup-insert) must be atomic so concurrent tasks cannot
/// create duplicates.
pub trait Storage {
    // ===== Document Index =====

    /// Inserts or overwrites the document for its URL (last write wins).
    ///
    /// The `uses` counter is the one field that never decreases: an upsert
    /// keeps the larger of the stored and incoming values.
    fn upsert_document(&mut self, document: &Document) -> StorageResult<()>;

    /// Upserts a live-search-sourced document and bumps its `uses` counter.
    ///
    /// A first sighting stores uses=1; repeat sightings increment the
    /// stored counter. Returns the counter value after the write.
    fn record_live_document(&mut self, document: &Document) -> StorageResult<i64>;

    /// Gets the document for a URL, if present
    fn get_document(&self, url: &str) -> StorageResult<Option<Document>>;

    /// Substring search across url, source_ip, title, meta_keywords,
    /// named_entities, body_excerpt, and term-frequency keys.
    ///
    /// Matching is case-insensitive; results are ordered by descending
    /// `uses` then URL.
    fn search_documents(&self, needle: &str) -> StorageResult<Vec<Document>>;

    /// Lists every stored document URL (for the re-crawl pass)
    fn list_document_urls(&self) -> StorageResult<Vec<String>>;

    /// Counts stored documents
    fn count_documents(&self) -> StorageResult<u64>;

    /// Collects the distinct term-frequency keys across all documents
    fn term_vocabulary(&self) -> StorageResult<Vec<String>>;

    // ===== Frontier =====

    /// Enqueues a URL unless it is already in the frontier or already has
    /// a document. The dedup check and the insert are one atomic
    /// statement. Returns true if a row was inserted.
    fn enqueue_frontier(&mut self, url: &str, scan_internal: bool) -> StorageResult<bool>;

    /// Enqueues a URL unconditionally (replacing any existing frontier
    /// entry), bypassing the document dedup check. Used for seeds and
    /// resubmissions, where a re-crawl is the point.
    fn requeue_frontier(&mut self, url: &str, scan_internal: bool) -> StorageResult<()>;

    /// Gets the oldest frontier entry without removing it
    fn next_frontier_entry(&self) -> StorageResult<Option<FrontierEntry>>;

    /// Removes a frontier entry
    fn delete_frontier_entry(&mut self, url: &str) -> StorageResult<()>;

    /// Lists the whole frontier, oldest first
    fn list_frontier_entries(&self) -> StorageResult<Vec<FrontierEntry>>;

    /// Counts frontier entries
    fn count_frontier_entries(&self) -> StorageResult<u64>;
}
