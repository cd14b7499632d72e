//! Robots.txt handling module
//!
//! This module fetches and interprets a site's robots.txt before a page is
//! crawled. Every failure along the way degrades to "allowed".

mod parser;

pub use parser::{agent_tokens, ParsedRobots};

use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Decides whether a page may be crawled by this client
#[derive(Debug, Clone)]
pub struct RobotsFilter {
    client: Client,
    agent_tokens: Vec<String>,
    timeout: Duration,
}

impl RobotsFilter {
    /// Creates a filter that fetches robots.txt through `client`
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client already carrying the crawler's user agent
    /// * `user_agent` - The configured user agent string, used to pick rule groups
    /// * `timeout` - Per-request timeout for robots.txt
    pub fn new(client: Client, user_agent: &str, timeout: Duration) -> Self {
        Self {
            client,
            agent_tokens: agent_tokens(user_agent),
            timeout,
        }
    }

    /// Returns the robots.txt location for a page
    pub fn robots_url(url: &Url) -> Option<Url> {
        url.join("/robots.txt").ok()
    }

    /// Fetches robots.txt for the site of `url`
    ///
    /// # Returns
    ///
    /// * `Ok(ParsedRobots)` - Parsed rules, or allow-all when the server
    ///   answers with a non-success status
    /// * `Err(reqwest::Error)` - The request or body read failed
    pub async fn fetch(&self, url: &Url) -> Result<ParsedRobots, reqwest::Error> {
        let Some(robots_url) = Self::robots_url(url) else {
            return Ok(ParsedRobots::allow_all());
        };

        let response = self
            .client
            .get(robots_url.as_str())
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!(
                "robots.txt for {} returned {}, allowing",
                robots_url,
                response.status()
            );
            return Ok(ParsedRobots::allow_all());
        }

        let body = response.text().await?;
        Ok(ParsedRobots::from_content(&body, &self.agent_tokens))
    }

    /// Checks if `url` may be crawled
    ///
    /// Unparsable URLs and fetch failures are treated as allowed, the latter
    /// with a warning.
    pub async fn is_allowed(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Cannot check robots.txt for {}: {}", url, e);
                return true;
            }
        };

        match self.fetch(&parsed).await {
            Ok(robots) => robots.is_allowed(&parsed),
            Err(e) => {
                tracing::warn!("Failed to fetch robots.txt for {}: {}", url, e);
                true
            }
        }
    }
}
