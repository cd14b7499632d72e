//! Worker loop
//!
//! A worker repeatedly claims one queue entry, checks robots.txt, fetches the
//! page, and feeds every discovered link through the domain registry and the
//! queue. It stops when nothing is left to claim. Any number of workers may
//! share one store; all coordination happens through the store.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchResult};
use crate::crawler::parser::{extract_links, LinkPolicy};
use crate::crawler::progress::ProgressReporter;
use crate::crawler::retry::RetryPolicy;
use crate::robots::RobotsFilter;
use crate::state::{DomainRecord, QueueStatus};
use crate::storage::CrawlStore;
use crate::url::{domain_of, normalize_url};
use reqwest::Client;
use std::time::Instant;
use url::Url;

/// What happened to a single discovered link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Newly enqueued, relationship recorded
    Queued,
    /// URL was already in the queue
    AlreadyKnown,
    /// Child domain reached the link limit
    OverLimit,
    /// Malformed link or abandoned store operation
    Failed,
}

/// Per-page processing summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub url: String,
    pub status: QueueStatus,
    pub links_found: usize,
    pub queued: usize,
    pub already_known: usize,
    pub over_limit: usize,
    pub failed: usize,
}

impl PageSummary {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            status: QueueStatus::Done,
            links_found: 0,
            queued: 0,
            already_known: 0,
            over_limit: 0,
            failed: 0,
        }
    }

    fn record(&mut self, outcome: LinkOutcome) {
        match outcome {
            LinkOutcome::Queued => self.queued += 1,
            LinkOutcome::AlreadyKnown => self.already_known += 1,
            LinkOutcome::OverLimit => self.over_limit += 1,
            LinkOutcome::Failed => self.failed += 1,
        }
    }
}

/// A single crawl worker bound to one store connection
pub struct Worker<S> {
    store: S,
    client: Client,
    robots: RobotsFilter,
    policy: LinkPolicy,
    retry: RetryPolicy,
    progress: ProgressReporter,
    domain_link_limit: u64,
}

impl<S: CrawlStore> Worker<S> {
    /// Creates a worker and reads the domain link limit from the store
    ///
    /// # Returns
    ///
    /// * `Ok(Worker)` - Ready to run
    /// * `Err(MapperError)` - The HTTP client could not be built or the
    ///   settings could not be read
    pub fn new(store: S, config: &Config) -> crate::Result<Self> {
        let client = build_http_client(&config.user_agent, &config.http)?;
        let robots = RobotsFilter::new(
            client.clone(),
            &config.user_agent.user_agent_string(),
            config.http.robots_timeout(),
        );
        let domain_link_limit = store.domain_link_limit()?;

        tracing::info!(
            "Worker starting as {:?}, domain link limit {}",
            config.user_agent.user_agent_string(),
            if domain_link_limit == 0 {
                "unlimited".to_string()
            } else {
                domain_link_limit.to_string()
            }
        );

        Ok(Self {
            store,
            client,
            robots,
            policy: LinkPolicy::new(&config.http.document_extensions),
            retry: RetryPolicy::from_config(&config.retry),
            progress: ProgressReporter::new(config.worker.report_interval()),
            domain_link_limit,
        })
    }

    /// The limit read at startup (0 = unlimited)
    pub fn domain_link_limit(&self) -> u64 {
        self.domain_link_limit
    }

    /// Borrows the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the worker, returning the store
    pub fn into_store(self) -> S {
        self.store
    }

    /// Processes entries until the queue is empty
    ///
    /// Returns the number of entries finalized.
    pub async fn run(&mut self) -> u64 {
        let mut total = 0;

        while self.run_once().await.is_some() {
            total += 1;
            self.progress.record();
            self.progress.maybe_report(Instant::now());
        }

        tracing::info!("Queue empty, worker finished after {} entries", total);
        total
    }

    /// Claims and processes a single entry
    ///
    /// Returns None when nothing could be claimed.
    pub async fn run_once(&mut self) -> Option<PageSummary> {
        let url = self.claim_next().await?;
        tracing::info!("Claimed {}", url);

        let summary = self.process_page(&url).await;
        tracing::info!(
            "Finished {} as {}: {} links found, {} queued, {} already known, {} over limit, {} failed",
            summary.url,
            summary.status,
            summary.links_found,
            summary.queued,
            summary.already_known,
            summary.over_limit,
            summary.failed
        );

        Some(summary)
    }

    async fn claim_next(&mut self) -> Option<String> {
        let store = &mut self.store;
        match self.retry.run("claim", || store.claim()).await {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Failed to claim next queue entry: {}", e);
                None
            }
        }
    }

    async fn process_page(&mut self, url: &str) -> PageSummary {
        let mut summary = PageSummary::new(url);
        let mut parent = self.resolve_parent(url).await;

        let base_url = match Url::parse(url) {
            Ok(base_url) => base_url,
            Err(e) => {
                tracing::warn!("Claimed URL {} does not parse: {}", url, e);
                summary.status = QueueStatus::Unreachable;
                self.finalize(url, summary.status).await;
                return summary;
            }
        };

        if !self.robots.is_allowed(url).await {
            tracing::info!("URL {} disallowed by robots.txt", url);
            summary.status = QueueStatus::Unreachable;
            self.finalize(url, summary.status).await;
            return summary;
        }

        let body = match fetch_page(&self.client, url).await {
            FetchResult::Success { body } => body,
            FetchResult::HttpError { status_code } => {
                tracing::info!("Fetching {} returned HTTP {}", url, status_code);
                summary.status = QueueStatus::Unreachable;
                self.finalize(url, summary.status).await;
                return summary;
            }
            FetchResult::NetworkError { error } => {
                tracing::info!("Fetching {} failed: {}", url, error);
                summary.status = QueueStatus::Unreachable;
                self.finalize(url, summary.status).await;
                return summary;
            }
        };

        let links = extract_links(&body, &base_url, &self.policy);
        summary.links_found = links.len();

        for link in &links {
            let outcome = self.process_link(url, &mut parent, link).await;
            summary.record(outcome);
        }

        self.finalize(url, summary.status).await;
        summary
    }

    async fn resolve_parent(&mut self, url: &str) -> Option<DomainRecord> {
        let domain = match domain_of(url) {
            Ok(domain) => domain,
            Err(e) => {
                tracing::warn!("Cannot derive domain of {}: {}", url, e);
                return None;
            }
        };

        let store = &mut self.store;
        match self
            .retry
            .run("resolve parent domain", || store.resolve(&domain))
            .await
        {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::error!("Failed to resolve domain {}: {}", domain, e);
                None
            }
        }
    }

    /// Handles one discovered link of `page_url`
    ///
    /// A parent that failed to resolve earlier is resolved again before the
    /// relationship is recorded, and kept for the page's remaining links.
    async fn process_link(
        &mut self,
        page_url: &str,
        parent: &mut Option<DomainRecord>,
        link: &str,
    ) -> LinkOutcome {
        let normalized = match normalize_url(link) {
            Ok(normalized) => normalized,
            Err(e) => {
                tracing::warn!("Dropping link {}: {}", link, e);
                return LinkOutcome::Failed;
            }
        };

        let domain = match domain_of(&normalized) {
            Ok(domain) => domain,
            Err(e) => {
                tracing::warn!("Dropping link {}: {}", normalized, e);
                return LinkOutcome::Failed;
            }
        };

        let limit = self.domain_link_limit;
        let retry = self.retry;
        let store = &mut self.store;

        let child = match retry.run("resolve domain", || store.resolve(&domain)).await {
            Ok(child) => child,
            Err(e) => {
                tracing::error!("Failed to resolve domain {}: {}", domain, e);
                return LinkOutcome::Failed;
            }
        };

        match retry
            .run("check domain limit", || store.try_reserve(child.id, limit))
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("Domain {} reached its link limit, skipping {}", domain, normalized);
                return LinkOutcome::OverLimit;
            }
            Err(e) => {
                tracing::error!("Failed to check link limit for {}: {}", domain, e);
                return LinkOutcome::Failed;
            }
        }

        match retry.run("enqueue", || store.enqueue(&normalized)).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("Already known: {}", normalized);
                return LinkOutcome::AlreadyKnown;
            }
            Err(e) => {
                tracing::error!("Failed to enqueue {}: {}", normalized, e);
                return LinkOutcome::Failed;
            }
        }

        if parent.is_none() {
            *parent = self.resolve_parent(page_url).await;
        }
        let store = &mut self.store;

        match parent {
            Some(parent) => {
                if let Err(e) = retry
                    .run("record relationship", || store.record(parent.id, child.id))
                    .await
                {
                    tracing::error!(
                        "Failed to record relationship {} -> {}: {}",
                        parent.name,
                        domain,
                        e
                    );
                }
            }
            None => tracing::warn!("No parent domain, relationship to {} not recorded", domain),
        }

        match retry
            .run("increment processed links", || {
                store.increment_processed(child.id, limit)
            })
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::debug!("Domain {} reached its link limit concurrently", domain),
            Err(e) => tracing::error!("Failed to increment link count for {}: {}", domain, e),
        }

        LinkOutcome::Queued
    }

    async fn finalize(&mut self, url: &str, status: QueueStatus) {
        let store = &mut self.store;
        if let Err(e) = self
            .retry
            .run("complete", || store.complete(url, status))
            .await
        {
            tracing::error!("Failed to mark {} as {}: {}", url, status, e);
        }
    }
}
