//! Configuration module for domain-mapper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every setting has a default, so the file is optional; the database path can
//! also be supplied through the `DOMAIN_MAPPER_DATABASE` environment variable.
//!
//! # Example
//!
//! ```no_run
//! use domain_mapper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Retrying store operations {} times", config.retry.max_attempts);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, HttpConfig, RetryConfig, StoreConfig, UserAgentConfig, WorkerConfig,
    DEFAULT_DOCUMENT_EXTENSIONS,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, default_config, load_config, load_config_with_hash,
    DATABASE_ENV_VAR,
};
