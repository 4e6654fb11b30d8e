//! Database schema definitions
//!
//! All SQL schema definitions for the Kumo database. Set-valued and
//! map-valued document fields are stored as JSON text.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- The document index: one row per crawled or live-discovered URL
CREATE TABLE IF NOT EXISTS documents (
    url TEXT PRIMARY KEY,
    http_status INTEGER,
    source_ip TEXT,
    scan_internal_links INTEGER NOT NULL DEFAULT 0,
    title TEXT,
    meta_keywords TEXT NOT NULL DEFAULT '[]',
    body_excerpt TEXT NOT NULL DEFAULT '',
    named_entities TEXT NOT NULL DEFAULT '[]',
    term_frequencies TEXT NOT NULL DEFAULT '{}',
    uses INTEGER NOT NULL DEFAULT 0,
    crawled_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_documents_title ON documents(title);
CREATE INDEX IF NOT EXISTS idx_documents_uses ON documents(uses);

-- Crawl frontier queue; at most one live entry per URL
CREATE TABLE IF NOT EXISTS frontier (
    url TEXT PRIMARY KEY,
    scan_internal INTEGER NOT NULL DEFAULT 0,
    enqueued_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_frontier_enqueued ON frontier(enqueued_at);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
