//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the shared crawl database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Crawl work queue, one row per normalized URL
CREATE TABLE IF NOT EXISTS link_queue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL UNIQUE,
    status TEXT NOT NULL CHECK (status IN ('pending', 'processing', 'done', 'unreachable'))
);

CREATE INDEX IF NOT EXISTS idx_link_queue_status ON link_queue(status);

-- Graph nodes
CREATE TABLE IF NOT EXISTS domains (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    domain TEXT NOT NULL UNIQUE,
    processed_links INTEGER NOT NULL DEFAULT 0
);

-- Graph edges (parent links to child)
CREATE TABLE IF NOT EXISTS domain_relationships (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    parent_id INTEGER NOT NULL REFERENCES domains(id) ON DELETE CASCADE,
    child_id INTEGER NOT NULL REFERENCES domains(id) ON DELETE CASCADE,
    UNIQUE(parent_id, child_id)
);

CREATE INDEX IF NOT EXISTS idx_relationships_child ON domain_relationships(child_id);

-- Scalar settings shared by all workers
CREATE TABLE IF NOT EXISTS settings (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Domain aggregation rules used by ranking
CREATE TABLE IF NOT EXISTS static_domain_mappings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    old_domain TEXT NOT NULL,
    new_domain TEXT NOT NULL,
    wildcard INTEGER NOT NULL DEFAULT 0
);
"#;

/// SQL that removes every table created by [`SCHEMA_SQL`]
pub const DROP_SQL: &str = r#"
DROP TABLE IF EXISTS domain_relationships;
DROP TABLE IF EXISTS link_queue;
DROP TABLE IF EXISTS domains;
DROP TABLE IF EXISTS settings;
DROP TABLE IF EXISTS static_domain_mappings;
"#;

/// Settings key holding the per-domain link limit
pub const DOMAIN_LINK_LIMIT_KEY: &str = "domain_link_limit";

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

/// Drops every table of the schema
pub fn drop_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(DROP_SQL)?;
    Ok(())
}
