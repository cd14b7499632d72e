//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! queue and graph statistics from the storage layer.

use crate::state::QueueStatus;
use crate::storage::{Reporting, SettingsStore};
use crate::MapperError;
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of queue entries
    pub total_entries: u64,

    /// Count of queue entries by status
    pub entries_by_status: HashMap<QueueStatus, u64>,

    /// Number of registered domains
    pub unique_domains: u64,

    /// Number of distinct parent → child domain pairs
    pub total_relationships: u64,

    /// Configured per-domain link limit (0 = unlimited)
    pub domain_link_limit: u64,
}

impl CrawlStatistics {
    /// Count for one status (0 if absent)
    pub fn count(&self, status: QueueStatus) -> u64 {
        self.entries_by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Loads statistics from storage
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(MapperError)` - Failed to query statistics
pub fn load_statistics<S>(storage: &S) -> Result<CrawlStatistics, MapperError>
where
    S: Reporting + SettingsStore,
{
    let entries_by_status = storage.count_by_status()?;
    let total_entries = entries_by_status.values().sum();

    Ok(CrawlStatistics {
        total_entries,
        entries_by_status,
        unique_domains: storage.count_domains()?,
        total_relationships: storage.count_relationships()?,
        domain_link_limit: storage.domain_link_limit()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Queue entries: {}", stats.total_entries);
    println!("  Domains: {}", stats.unique_domains);
    println!("  Domain relationships: {}", stats.total_relationships);
    if stats.domain_link_limit == 0 {
        println!("  Domain link limit: unlimited");
    } else {
        println!("  Domain link limit: {}", stats.domain_link_limit);
    }
    println!();

    println!("Queue by Status:");
    for status in QueueStatus::all_statuses() {
        let count = stats.count(status);
        let percentage = if stats.total_entries > 0 {
            (count as f64 / stats.total_entries as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    let remaining: u64 = QueueStatus::all_statuses()
        .into_iter()
        .filter(|status| status.is_claimable())
        .map(|status| stats.count(status))
        .sum();
    let finished: u64 = QueueStatus::all_statuses()
        .into_iter()
        .filter(|status| status.is_terminal())
        .map(|status| stats.count(status))
        .sum();

    println!("Remaining to crawl: {}", remaining);
    let success_rate = if finished > 0 {
        (stats.count(QueueStatus::Done) as f64 / finished as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} finished entries reachable)",
        success_rate,
        stats.count(QueueStatus::Done),
        finished
    );
}
