//! Domain-mapper: a domain graph crawler
//!
//! This crate implements a crawl-queue worker that maps hyperlink relationships
//! between Internet domains. Workers claim URLs from a shared SQLite work queue,
//! respect robots.txt, extract outbound links and record a directed graph of
//! parent → child domains. Any number of worker processes may share one database.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for domain-mapper operations
#[derive(Debug, Error)]
pub enum MapperError {
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for domain-mapper operations
pub type Result<T> = std::result::Result<T, MapperError>;

// Re-export commonly used types
pub use crate::config::Config;
pub use crate::state::{DomainRecord, QueueStatus};
pub use crate::url::{extract_domain, normalize_url};
