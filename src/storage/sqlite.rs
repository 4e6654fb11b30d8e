//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::{Document, FrontierEntry};
use crate::KumoError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

const DOCUMENT_COLUMNS: &str = "url, http_status, source_ip, scan_internal_links, title, \
     meta_keywords, body_excerpt, named_entities, term_frequencies, uses, crawled_at";

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(KumoError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, KumoError> {
        let conn = Connection::open(path).map_err(crate::storage::StorageError::from)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(crate::storage::StorageError::from)?;

        initialize_schema(&conn).map_err(crate::storage::StorageError::from)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, KumoError> {
        let conn = Connection::open_in_memory().map_err(crate::storage::StorageError::from)?;
        initialize_schema(&conn).map_err(crate::storage::StorageError::from)?;
        Ok(Self { conn })
    }

    fn row_to_document(row: &Row) -> rusqlite::Result<(Document, String, String, String)> {
        let status: Option<i64> = row.get(1)?;
        Ok((
            Document {
                url: row.get(0)?,
                http_status: status.map(|s| s as u16),
                source_ip: row.get(2)?,
                scan_internal_links: row.get::<_, i64>(3)? != 0,
                title: row.get(4)?,
                meta_keywords: BTreeSet::new(),
                body_excerpt: row.get(6)?,
                named_entities: Vec::new(),
                term_frequencies: HashMap::new(),
                uses: row.get(9)?,
                crawled_at: row.get(10)?,
            },
            row.get::<_, String>(5)?,
            row.get::<_, String>(7)?,
            row.get::<_, String>(8)?,
        ))
    }

    /// Deserializes the JSON-valued columns captured by `row_to_document`.
    fn decode_document(
        parts: (Document, String, String, String),
    ) -> StorageResult<Document> {
        let (mut document, keywords_json, entities_json, frequencies_json) = parts;
        document.meta_keywords = serde_json::from_str(&keywords_json)?;
        document.named_entities = serde_json::from_str(&entities_json)?;
        document.term_frequencies = serde_json::from_str(&frequencies_json)?;
        Ok(document)
    }
}

impl Storage for SqliteStorage {
    // ===== Document Index =====

    fn upsert_document(&mut self, document: &Document) -> StorageResult<()> {
        let keywords_json = serde_json::to_string(&document.meta_keywords)?;
        let entities_json = serde_json::to_string(&document.named_entities)?;
        let frequencies_json = serde_json::to_string(&document.term_frequencies)?;
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO documents (url, http_status, source_ip, scan_internal_links, title,
                 meta_keywords, body_excerpt, named_entities, term_frequencies, uses, crawled_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(url) DO UPDATE SET
                 http_status = excluded.http_status,
                 source_ip = excluded.source_ip,
                 scan_internal_links = excluded.scan_internal_links,
                 title = excluded.title,
                 meta_keywords = excluded.meta_keywords,
                 body_excerpt = excluded.body_excerpt,
                 named_entities = excluded.named_entities,
                 term_frequencies = excluded.term_frequencies,
                 uses = MAX(documents.uses, excluded.uses),
                 crawled_at = excluded.crawled_at",
            params![
                document.url,
                document.http_status.map(i64::from),
                document.source_ip,
                document.scan_internal_links as i64,
                document.title,
                keywords_json,
                document.body_excerpt,
                entities_json,
                frequencies_json,
                document.uses,
                document.crawled_at.clone().unwrap_or(now),
            ],
        )?;

        Ok(())
    }

    fn record_live_document(&mut self, document: &Document) -> StorageResult<i64> {
        let keywords_json = serde_json::to_string(&document.meta_keywords)?;
        let entities_json = serde_json::to_string(&document.named_entities)?;
        let frequencies_json = serde_json::to_string(&document.term_frequencies)?;
        let now = Utc::now().to_rfc3339();

        // Title and excerpt only improve (COALESCE/non-empty guards) so a
        // thin repeat sighting cannot blank out a richer stored record.
        let uses = self.conn.query_row(
            "INSERT INTO documents (url, title, meta_keywords, body_excerpt, named_entities,
                 term_frequencies, uses, crawled_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)
             ON CONFLICT(url) DO UPDATE SET
                 title = COALESCE(excluded.title, documents.title),
                 body_excerpt = CASE WHEN excluded.body_excerpt != ''
                     THEN excluded.body_excerpt ELSE documents.body_excerpt END,
                 named_entities = excluded.named_entities,
                 term_frequencies = excluded.term_frequencies,
                 uses = documents.uses + 1,
                 crawled_at = excluded.crawled_at
             RETURNING uses",
            params![
                document.url,
                document.title,
                keywords_json,
                document.body_excerpt,
                entities_json,
                frequencies_json,
                now,
            ],
            |row| row.get(0),
        )?;

        Ok(uses)
    }

    fn get_document(&self, url: &str) -> StorageResult<Option<Document>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM documents WHERE url = ?1",
            DOCUMENT_COLUMNS
        ))?;

        let parts = stmt
            .query_row(params![url], Self::row_to_document)
            .optional()?;

        parts.map(Self::decode_document).transpose()
    }

    fn search_documents(&self, needle: &str) -> StorageResult<Vec<Document>> {
        // Substring match on every searchable field. Term-frequency keys
        // are matched against the quoted JSON key so "fox" does not match
        // a score value or a fragment of another key's value.
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM documents WHERE
                 instr(lower(url), lower(?1)) > 0
                 OR instr(lower(COALESCE(source_ip, '')), lower(?1)) > 0
                 OR instr(lower(COALESCE(title, '')), lower(?1)) > 0
                 OR instr(lower(meta_keywords), lower(?1)) > 0
                 OR instr(lower(named_entities), lower(?1)) > 0
                 OR instr(lower(body_excerpt), lower(?1)) > 0
                 OR instr(lower(term_frequencies), lower('\"' || ?1 || '\"')) > 0
             ORDER BY uses DESC, url ASC",
            DOCUMENT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![needle], Self::row_to_document)?;

        let mut documents = Vec::new();
        for parts in rows {
            documents.push(Self::decode_document(parts?)?);
        }
        Ok(documents)
    }

    fn list_document_urls(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url FROM documents ORDER BY url ASC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }

    fn count_documents(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn term_vocabulary(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT term_frequencies FROM documents")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut vocabulary = BTreeSet::new();
        for json in rows {
            let frequencies: HashMap<String, f64> = serde_json::from_str(&json?)?;
            vocabulary.extend(frequencies.into_keys());
        }
        Ok(vocabulary.into_iter().collect())
    }

    // ===== Frontier =====

    fn enqueue_frontier(&mut self, url: &str, scan_internal: bool) -> StorageResult<bool> {
        let now = Utc::now().to_rfc3339();

        // Dedup check and insert in one statement: the URL must be new to
        // both the frontier and the document index.
        let inserted = self.conn.execute(
            "INSERT INTO frontier (url, scan_internal, enqueued_at)
             SELECT ?1, ?2, ?3
             WHERE NOT EXISTS (SELECT 1 FROM frontier WHERE url = ?1)
               AND NOT EXISTS (SELECT 1 FROM documents WHERE url = ?1)",
            params![url, scan_internal as i64, now],
        )?;

        Ok(inserted > 0)
    }

    fn requeue_frontier(&mut self, url: &str, scan_internal: bool) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO frontier (url, scan_internal, enqueued_at)
             VALUES (?1, ?2, ?3)",
            params![url, scan_internal as i64, now],
        )?;
        Ok(())
    }

    fn next_frontier_entry(&self) -> StorageResult<Option<FrontierEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, scan_internal FROM frontier ORDER BY enqueued_at ASC, url ASC LIMIT 1",
        )?;

        let entry = stmt
            .query_row([], |row| {
                Ok(FrontierEntry {
                    url: row.get(0)?,
                    scan_internal_links: row.get::<_, i64>(1)? != 0,
                })
            })
            .optional()?;

        Ok(entry)
    }

    fn delete_frontier_entry(&mut self, url: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM frontier WHERE url = ?1", params![url])?;
        Ok(())
    }

    fn list_frontier_entries(&self) -> StorageResult<Vec<FrontierEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, scan_internal FROM frontier ORDER BY enqueued_at ASC, url ASC")?;

        let rows = stmt.query_map([], |row| {
            Ok(FrontierEntry {
                url: row.get(0)?,
                scan_internal_links: row.get::<_, i64>(1)? != 0,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<FrontierEntry>>>()?)
    }

    fn count_frontier_entries(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM frontier", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document(url: &str) -> Document {
        Document {
            url: url.to_string(),
            http_status: Some(200),
            source_ip: Some("93.184.216.34".to_string()),
            scan_internal_links: true,
            title: Some("Example Domain".to_string()),
            meta_keywords: ["example".to_string(), "domain".to_string()].into(),
            body_excerpt: "This domain is for use in illustrative examples".to_string(),
            named_entities: vec!["Example Domain".to_string()],
            term_frequencies: [("domain".to_string(), 0.25), ("examples".to_string(), 0.125)]
                .into(),
            uses: 0,
            crawled_at: Some("2024-01-01T00:00:00+00:00".to_string()),
        }
    }

    #[test]
    fn test_upsert_and_get_roundtrip() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let document = sample_document("https://example.com/");

        storage.upsert_document(&document).unwrap();
        let loaded = storage.get_document("https://example.com/").unwrap().unwrap();

        assert_eq!(loaded, document);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let document = sample_document("https://example.com/");

        storage.upsert_document(&document).unwrap();
        storage.upsert_document(&document).unwrap();

        assert_eq!(storage.count_documents().unwrap(), 1);
        let loaded = storage.get_document("https://example.com/").unwrap().unwrap();
        assert_eq!(loaded, document);
    }

    #[test]
    fn test_upsert_overwrites_fields() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let mut document = sample_document("https://example.com/");
        storage.upsert_document(&document).unwrap();

        document.title = Some("Updated".to_string());
        document.body_excerpt = "fresh excerpt".to_string();
        storage.upsert_document(&document).unwrap();

        let loaded = storage.get_document("https://example.com/").unwrap().unwrap();
        assert_eq!(loaded.title.as_deref(), Some("Updated"));
        assert_eq!(loaded.body_excerpt, "fresh excerpt");
    }

    #[test]
    fn test_upsert_never_decreases_uses() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let mut document = sample_document("https://example.com/");
        document.uses = 3;
        storage.upsert_document(&document).unwrap();

        document.uses = 0;
        storage.upsert_document(&document).unwrap();

        let loaded = storage.get_document("https://example.com/").unwrap().unwrap();
        assert_eq!(loaded.uses, 3);
    }

    #[test]
    fn test_record_live_document_counts_sightings() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let document = Document {
            url: "https://example.com/hit".to_string(),
            title: Some("Hit".to_string()),
            body_excerpt: "snippet text".to_string(),
            ..Default::default()
        };

        assert_eq!(storage.record_live_document(&document).unwrap(), 1);
        assert_eq!(storage.record_live_document(&document).unwrap(), 2);

        let loaded = storage.get_document("https://example.com/hit").unwrap().unwrap();
        assert_eq!(loaded.uses, 2);
        assert_eq!(loaded.http_status, None);
    }

    #[test]
    fn test_search_matches_each_field() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.upsert_document(&sample_document("https://example.com/")).unwrap();

        for needle in [
            "example.com",      // url
            "93.184",           // source_ip
            "Example Domain",   // title
            "domain",           // meta_keywords
            "illustrative",     // body_excerpt
            "examples",         // term_frequencies key
        ] {
            let hits = storage.search_documents(needle).unwrap();
            assert_eq!(hits.len(), 1, "needle {:?} should match", needle);
        }

        assert!(storage.search_documents("zebra").unwrap().is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.upsert_document(&sample_document("https://example.com/")).unwrap();

        assert_eq!(storage.search_documents("EXAMPLE DOMAIN").unwrap().len(), 1);
    }

    #[test]
    fn test_term_frequency_search_matches_keys_not_values() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let mut document = sample_document("https://example.com/");
        document.source_ip = None;
        document.title = None;
        document.meta_keywords = BTreeSet::new();
        document.body_excerpt = String::new();
        document.named_entities = Vec::new();
        document.term_frequencies = [("quokka".to_string(), 0.5)].into();
        storage.upsert_document(&document).unwrap();

        assert_eq!(storage.search_documents("quokka").unwrap().len(), 1);
        // "0.5" only appears as a value, never as a quoted key
        assert!(storage.search_documents("0.5").unwrap().is_empty());
    }

    #[test]
    fn test_frontier_enqueue_dedups_against_frontier() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        assert!(storage.enqueue_frontier("https://a.example.com", true).unwrap());
        assert!(!storage.enqueue_frontier("https://a.example.com", false).unwrap());

        assert_eq!(storage.count_frontier_entries().unwrap(), 1);
        let entry = storage.next_frontier_entry().unwrap().unwrap();
        assert!(entry.scan_internal_links, "first enqueue wins");
    }

    #[test]
    fn test_frontier_enqueue_dedups_against_documents() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.upsert_document(&sample_document("https://example.com/")).unwrap();

        assert!(!storage.enqueue_frontier("https://example.com/", false).unwrap());
        assert_eq!(storage.count_frontier_entries().unwrap(), 0);
    }

    #[test]
    fn test_requeue_bypasses_document_dedup() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.upsert_document(&sample_document("https://example.com/")).unwrap();

        storage.requeue_frontier("https://example.com/", true).unwrap();
        assert_eq!(storage.count_frontier_entries().unwrap(), 1);
    }

    #[test]
    fn test_frontier_delete() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.enqueue_frontier("https://a.example.com", false).unwrap();
        storage.delete_frontier_entry("https://a.example.com").unwrap();

        assert_eq!(storage.count_frontier_entries().unwrap(), 0);
        assert!(storage.next_frontier_entry().unwrap().is_none());
    }

    #[test]
    fn test_list_frontier_oldest_first() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.enqueue_frontier("https://b.example.com", false).unwrap();
        storage.enqueue_frontier("https://a.example.com", false).unwrap();

        let entries = storage.list_frontier_entries().unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_term_vocabulary_collects_distinct_keys() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        storage.upsert_document(&sample_document("https://a.example.com/")).unwrap();
        storage.upsert_document(&sample_document("https://b.example.com/")).unwrap();

        let vocabulary = storage.term_vocabulary().unwrap();
        assert_eq!(vocabulary, vec!["domain".to_string(), "examples".to_string()]);
    }
}
