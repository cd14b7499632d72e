//! Storage traits and error types
//!
//! The crawler talks to the store through one trait per component
//! (queue, domain registry, relationships, settings). Administrative and
//! reporting access used by the CLI lives in separate traits.

use crate::state::{DomainRecord, InvalidTransition, QueueStatus};
use crate::storage::{DomainMapping, QueueEntry};
use rusqlite::ErrorCode;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("Unknown queue status in database: {0}")]
    UnknownStatus(String),

    #[error("Queue entry not found: {0}")]
    EntryNotFound(String),

    #[error("Domain not found: {0}")]
    DomainNotFound(i64),
}

impl StorageError {
    /// Returns true if the error is transient lock contention
    ///
    /// SQLite reports a conflicting writer as `SQLITE_BUSY` (another
    /// connection holds the lock) or `SQLITE_LOCKED` (conflict inside a
    /// shared cache). Both clear up once the other transaction finishes.
    pub fn is_contention(&self) -> bool {
        match self {
            Self::Sqlite(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persisted, status-tagged work list
pub trait CrawlQueue {
    /// Inserts a normalized URL as `pending`
    ///
    /// Returns true if a new row was inserted, false if the URL was already
    /// known in any status.
    fn enqueue(&mut self, url: &str) -> StorageResult<bool>;

    /// Claims one `pending` entry and flips it to `processing`
    ///
    /// The select and the update run in one exclusive transaction so that no
    /// two claimants can receive the same URL. Returns None when nothing is
    /// claimable.
    fn claim(&mut self) -> StorageResult<Option<String>>;

    /// Moves a claimed entry to a terminal status
    ///
    /// The transition is checked against the queue state machine.
    fn complete(&mut self, url: &str, status: QueueStatus) -> StorageResult<()>;

    /// Looks up a queue entry by URL
    fn get_entry(&self, url: &str) -> StorageResult<Option<QueueEntry>>;
}

/// Domain name → identifier and processed-link counter
pub trait DomainRegistry {
    /// Returns the domain record, creating it with a zero counter if absent
    ///
    /// Creation is insert-or-ignore followed by a read-back, so concurrent
    /// first sightings converge on one row.
    fn resolve(&mut self, domain: &str) -> StorageResult<DomainRecord>;

    /// Checks whether another link may be attributed to the domain
    ///
    /// Returns false without mutating anything if `limit > 0` and the counter
    /// has reached it. A limit of 0 means unlimited.
    fn try_reserve(&self, domain_id: i64, limit: u64) -> StorageResult<bool>;

    /// Increments the processed-link counter by one
    ///
    /// The increment is skipped when it would push the counter past `limit`.
    /// Returns true if the counter changed.
    fn increment_processed(&mut self, domain_id: i64, limit: u64) -> StorageResult<bool>;
}

/// Deduplicated parent → child domain edges
pub trait RelationshipStore {
    /// Records the ordered pair, ignoring duplicates
    ///
    /// Returns true if the pair was new.
    fn record(&mut self, parent_id: i64, child_id: i64) -> StorageResult<bool>;
}

/// Shared scalar settings
pub trait SettingsStore {
    /// Reads `domain_link_limit`, defaulting to 0 (unlimited)
    fn domain_link_limit(&self) -> StorageResult<u64>;

    /// Writes `domain_link_limit`
    fn set_domain_link_limit(&mut self, limit: u64) -> StorageResult<()>;
}

/// Everything the worker loop needs from the store
pub trait CrawlStore: CrawlQueue + DomainRegistry + RelationshipStore + SettingsStore {}

impl<T> CrawlStore for T where T: CrawlQueue + DomainRegistry + RelationshipStore + SettingsStore {}

/// Administrative operations used by provisioning and cleanup commands
pub trait Maintenance {
    /// Resets every `processing` entry back to `pending`
    ///
    /// Used to recover entries left behind by crashed workers.
    fn reset_stuck(&mut self) -> StorageResult<u64>;

    /// Deletes every `done` entry
    fn purge_done(&mut self) -> StorageResult<u64>;

    /// Adds a static domain mapping
    fn add_domain_mapping(&mut self, mapping: &DomainMapping) -> StorageResult<()>;

    /// Drops every table
    fn drop_all(&mut self) -> StorageResult<()>;
}

/// Read-only queries over the crawl graph
pub trait Reporting {
    /// Counts queue entries per status
    fn count_by_status(&self) -> StorageResult<HashMap<QueueStatus, u64>>;

    /// Counts registered domains
    fn count_domains(&self) -> StorageResult<u64>;

    /// Counts recorded relationships
    fn count_relationships(&self) -> StorageResult<u64>;

    /// Looks up a domain by name
    fn get_domain(&self, domain: &str) -> StorageResult<Option<DomainRecord>>;

    /// Lists every relationship as (parent name, child name)
    fn list_relationships(&self) -> StorageResult<Vec<(String, String)>>;

    /// Number of distinct parent domains linking to each domain, self-loops excluded
    fn parent_counts(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Loads all static domain mappings
    fn load_domain_mappings(&self) -> StorageResult<Vec<DomainMapping>>;
}
