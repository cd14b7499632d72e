//! Crawler module for the worker process
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching
//! - HTML parsing and link extraction
//! - Bounded retry of store operations
//! - The worker loop and its progress reporting

mod fetcher;
mod parser;
mod progress;
mod retry;
mod worker;

pub use fetcher::{build_http_client, fetch_page, FetchResult};
pub use parser::{extract_links, LinkPolicy};
pub use progress::ProgressReporter;
pub use retry::RetryPolicy;
pub use worker::{LinkOutcome, PageSummary, Worker};

use crate::config::Config;
use crate::storage::{CrawlQueue, SqliteStorage};
use crate::url::normalize_url;

/// Opens the configured store and runs one worker until the queue is empty
///
/// # Returns
///
/// * `Ok(u64)` - Number of queue entries finalized
/// * `Err(MapperError)` - The store could not be opened or the worker could not start
///
/// # Example
///
/// ```no_run
/// use domain_mapper::config::default_config;
/// use domain_mapper::crawler::run_worker;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = default_config()?;
/// let processed = run_worker(&config).await?;
/// println!("{} pages processed", processed);
/// # Ok(())
/// # }
/// ```
pub async fn run_worker(config: &Config) -> crate::Result<u64> {
    let store = SqliteStorage::from_config(&config.store)?;
    let mut worker = Worker::new(store, config)?;
    Ok(worker.run().await)
}

/// Normalizes a seed URL and adds it to the queue
///
/// Returns the normalized URL and whether a new `pending` row was created.
pub fn enqueue_seed<Q: CrawlQueue>(queue: &mut Q, seed: &str) -> crate::Result<(String, bool)> {
    let seed = normalize_url(seed)?;
    let created = queue.enqueue(&seed)?;
    Ok((seed, created))
}
