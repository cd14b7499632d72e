//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for page content:
//! - Building the shared HTTP client with the crawler's user agent
//! - GET requests to fetch page content
//! - Error classification

use crate::config::{HttpConfig, UserAgentConfig};
use reqwest::Client;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Page body content
        body: String,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Builds an HTTP client with proper configuration
///
/// The client carries the crawler's user agent on every request and uses the
/// page timeout by default. Redirects are followed with reqwest's default
/// policy.
///
/// # Example
///
/// ```no_run
/// use domain_mapper::config::{HttpConfig, UserAgentConfig};
/// use domain_mapper::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    http: &HttpConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.user_agent_string())
        .timeout(http.page_timeout())
        .connect_timeout(http.page_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page body
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx | Success |
/// | Any other status | HttpError |
/// | Timeout, connection or body read failure | NetworkError |
pub async fn fetch_page(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            let error = if e.is_timeout() {
                "Request timeout".to_string()
            } else if e.is_connect() {
                format!("Connection failed: {}", e)
            } else {
                e.to_string()
            };
            return FetchResult::NetworkError { error };
        }
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success { body },
        Err(e) => FetchResult::NetworkError {
            error: e.to_string(),
        },
    }
}
