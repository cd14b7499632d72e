//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.
//! Several worker processes may open the same database file; the claim step
//! takes the write lock up front so that selection and status flip are atomic.

use crate::config::StoreConfig;
use crate::state::{DomainRecord, QueueStatus};
use crate::storage::schema::{drop_schema, initialize_schema, DOMAIN_LINK_LIMIT_KEY};
use crate::storage::traits::{
    CrawlQueue, DomainRegistry, Maintenance, RelationshipStore, Reporting, SettingsStore,
    StorageError, StorageResult,
};
use crate::storage::{DomainMapping, QueueEntry};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Busy timeout used when none is configured
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path` with the default busy timeout
    pub fn new(path: &Path) -> StorageResult<Self> {
        Self::open(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Opens (or creates) the database using the store section of the configuration
    pub fn from_config(config: &StoreConfig) -> StorageResult<Self> {
        Self::open(Path::new(&config.database_path), config.busy_timeout())
    }

    /// Opens (or creates) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `busy_timeout` - How long a statement waits on a locked database
    ///   before failing with `SQLITE_BUSY`
    pub fn open(path: &Path, busy_timeout: Duration) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn domain_from_row(row: &Row<'_>) -> rusqlite::Result<DomainRecord> {
        Ok(DomainRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            processed_links: row.get(2)?,
        })
    }

    fn read_status(raw: String) -> StorageResult<QueueStatus> {
        QueueStatus::from_db_string(&raw).ok_or(StorageError::UnknownStatus(raw))
    }
}

impl CrawlQueue for SqliteStorage {
    fn enqueue(&mut self, url: &str) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO link_queue (url, status) VALUES (?1, ?2)",
            params![url, QueueStatus::Pending.to_db_string()],
        )?;
        Ok(inserted > 0)
    }

    fn claim(&mut self) -> StorageResult<Option<String>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let candidate: Option<String> = tx
            .query_row(
                "SELECT url FROM link_queue WHERE status = ?1 ORDER BY id LIMIT 1",
                params![QueueStatus::Pending.to_db_string()],
                |row| row.get(0),
            )
            .optional()?;

        let url = match candidate {
            Some(url) => url,
            None => {
                tx.commit()?;
                return Ok(None);
            }
        };

        QueueStatus::Pending.validate_transition(QueueStatus::Processing)?;
        tx.execute(
            "UPDATE link_queue SET status = ?1 WHERE url = ?2 AND status = ?3",
            params![
                QueueStatus::Processing.to_db_string(),
                url,
                QueueStatus::Pending.to_db_string()
            ],
        )?;
        tx.commit()?;

        Ok(Some(url))
    }

    fn complete(&mut self, url: &str, status: QueueStatus) -> StorageResult<()> {
        let current = self
            .get_entry(url)?
            .ok_or_else(|| StorageError::EntryNotFound(url.to_string()))?
            .status;
        current.validate_transition(status)?;

        self.conn.execute(
            "UPDATE link_queue SET status = ?1 WHERE url = ?2 AND status = ?3",
            params![status.to_db_string(), url, current.to_db_string()],
        )?;
        Ok(())
    }

    fn get_entry(&self, url: &str) -> StorageResult<Option<QueueEntry>> {
        let row: Option<(i64, String, String)> = self
            .conn
            .query_row(
                "SELECT id, url, status FROM link_queue WHERE url = ?1",
                params![url],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        match row {
            Some((id, url, status)) => Ok(Some(QueueEntry {
                id,
                url,
                status: Self::read_status(status)?,
            })),
            None => Ok(None),
        }
    }
}

impl DomainRegistry for SqliteStorage {
    fn resolve(&mut self, domain: &str) -> StorageResult<DomainRecord> {
        self.conn.execute(
            "INSERT OR IGNORE INTO domains (domain, processed_links) VALUES (?1, 0)",
            params![domain],
        )?;

        let record = self.conn.query_row(
            "SELECT id, domain, processed_links FROM domains WHERE domain = ?1",
            params![domain],
            Self::domain_from_row,
        )?;

        Ok(record)
    }

    fn try_reserve(&self, domain_id: i64, limit: u64) -> StorageResult<bool> {
        if limit == 0 {
            return Ok(true);
        }

        let record = self
            .conn
            .query_row(
                "SELECT id, domain, processed_links FROM domains WHERE id = ?1",
                params![domain_id],
                Self::domain_from_row,
            )
            .optional()?
            .ok_or(StorageError::DomainNotFound(domain_id))?;

        Ok(!record.has_reached_limit(limit))
    }

    fn increment_processed(&mut self, domain_id: i64, limit: u64) -> StorageResult<bool> {
        let updated = self.conn.execute(
            "UPDATE domains SET processed_links = processed_links + 1
             WHERE id = ?1 AND (?2 = 0 OR processed_links < ?2)",
            params![domain_id, limit],
        )?;
        Ok(updated > 0)
    }
}

impl RelationshipStore for SqliteStorage {
    fn record(&mut self, parent_id: i64, child_id: i64) -> StorageResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO domain_relationships (parent_id, child_id) VALUES (?1, ?2)",
            params![parent_id, child_id],
        )?;
        Ok(inserted > 0)
    }
}

impl SettingsStore for SqliteStorage {
    fn domain_link_limit(&self) -> StorageResult<u64> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE name = ?1",
                params![DOMAIN_LINK_LIMIT_KEY],
                |row| row.get(0),
            )
            .optional()?;

        let Some(raw) = raw else {
            return Ok(0);
        };

        match raw.trim().parse::<u64>() {
            Ok(limit) => Ok(limit),
            Err(_) => {
                tracing::warn!(
                    "Setting {} has unparsable value {:?}, treating as unlimited",
                    DOMAIN_LINK_LIMIT_KEY,
                    raw
                );
                Ok(0)
            }
        }
    }

    fn set_domain_link_limit(&mut self, limit: u64) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO settings (name, value) VALUES (?1, ?2)
             ON CONFLICT(name) DO UPDATE SET value = excluded.value",
            params![DOMAIN_LINK_LIMIT_KEY, limit.to_string()],
        )?;
        Ok(())
    }
}

impl Maintenance for SqliteStorage {
    fn reset_stuck(&mut self) -> StorageResult<u64> {
        let reset = self.conn.execute(
            "UPDATE link_queue SET status = ?1 WHERE status = ?2",
            params![
                QueueStatus::Pending.to_db_string(),
                QueueStatus::Processing.to_db_string()
            ],
        )?;
        Ok(reset as u64)
    }

    fn purge_done(&mut self) -> StorageResult<u64> {
        let purged = self.conn.execute(
            "DELETE FROM link_queue WHERE status = ?1",
            params![QueueStatus::Done.to_db_string()],
        )?;
        Ok(purged as u64)
    }

    fn add_domain_mapping(&mut self, mapping: &DomainMapping) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO static_domain_mappings (old_domain, new_domain, wildcard) VALUES (?1, ?2, ?3)",
            params![mapping.old_domain, mapping.new_domain, mapping.wildcard],
        )?;
        Ok(())
    }

    fn drop_all(&mut self) -> StorageResult<()> {
        drop_schema(&self.conn)?;
        Ok(())
    }
}

impl Reporting for SqliteStorage {
    fn count_by_status(&self) -> StorageResult<HashMap<QueueStatus, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM link_queue GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;

        let mut counts: HashMap<QueueStatus, u64> = QueueStatus::all_statuses()
            .into_iter()
            .map(|status| (status, 0))
            .collect();
        for row in rows {
            let (status, count) = row?;
            counts.insert(Self::read_status(status)?, count);
        }

        Ok(counts)
    }

    fn count_domains(&self) -> StorageResult<u64> {
        let count: u64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM domains", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_relationships(&self) -> StorageResult<u64> {
        let count: u64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM domain_relationships", [], |row| {
                    row.get(0)
                })?;
        Ok(count)
    }

    fn get_domain(&self, domain: &str) -> StorageResult<Option<DomainRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, domain, processed_links FROM domains WHERE domain = ?1",
                params![domain],
                Self::domain_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn list_relationships(&self) -> StorageResult<Vec<(String, String)>> {
        let query = "
            SELECT p.domain, c.domain
            FROM domain_relationships r
            JOIN domains p ON p.id = r.parent_id
            JOIN domains c ON c.id = r.child_id
            ORDER BY r.id
        ";

        let mut stmt = self.conn.prepare(query)?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(pairs)
    }

    fn parent_counts(&self) -> StorageResult<Vec<(String, u64)>> {
        let query = "
            SELECT c.domain, COUNT(DISTINCT r.parent_id) AS parents
            FROM domain_relationships r
            JOIN domains c ON c.id = r.child_id
            WHERE r.parent_id != r.child_id
            GROUP BY c.domain
            ORDER BY parents DESC, c.domain
        ";

        let mut stmt = self.conn.prepare(query)?;
        let counts = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn load_domain_mappings(&self) -> StorageResult<Vec<DomainMapping>> {
        let mut stmt = self.conn.prepare(
            "SELECT old_domain, new_domain, wildcard FROM static_domain_mappings ORDER BY id",
        )?;

        let mappings = stmt
            .query_map([], |row| {
                Ok(DomainMapping {
                    old_domain: row.get(0)?,
                    new_domain: row.get(1)?,
                    wildcard: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(mappings)
    }
}
