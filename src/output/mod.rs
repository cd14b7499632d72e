//! Output module for reports over the crawl database
//!
//! This module handles:
//! - Queue and graph statistics
//! - Domain ranking by inbound links

pub mod ranking;
pub mod stats;

pub use ranking::{find_domain, load_ranking, print_ranking, DomainAggregator, RankEntry, Ranking};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
