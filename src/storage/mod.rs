//! Storage module for the shared crawl database
//!
//! This module handles all database operations for the workers, including:
//! - SQLite database initialization and schema management
//! - The URL work queue and its atomic claim step
//! - Domain registration and per-domain link counters
//! - Domain relationship (graph edge) recording
//! - Shared settings, static domain mappings and reporting queries

mod schema;
mod sqlite;
mod traits;

pub use schema::DOMAIN_LINK_LIMIT_KEY;
pub use sqlite::SqliteStorage;
pub use traits::{
    CrawlQueue, CrawlStore, DomainRegistry, Maintenance, RelationshipStore, Reporting,
    SettingsStore, StorageError, StorageResult,
};

use crate::state::QueueStatus;

/// A row of the work queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: i64,
    pub url: String,
    pub status: QueueStatus,
}

/// Aggregation rule applied to domain names when ranking
///
/// With `wildcard` set, `old_domain` is a glob pattern (`*`, `?`) matched
/// against the full domain name; otherwise it must match exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainMapping {
    pub old_domain: String,
    pub new_domain: String,
    pub wildcard: bool,
}

impl DomainMapping {
    /// Returns true if this rule applies to `domain`
    pub fn applies_to(&self, domain: &str) -> bool {
        if self.wildcard {
            crate::url::matches_wildcard(&self.old_domain, domain)
        } else {
            self.old_domain.eq_ignore_ascii_case(domain)
        }
    }
}
