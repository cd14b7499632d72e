//! URL handling module
//!
//! This module provides URL normalization, domain extraction and wildcard
//! matching for static domain mappings.

mod domain;
mod matcher;
mod normalize;

pub use domain::{domain_of, extract_domain, registrable_domain};
pub use matcher::matches_wildcard;
pub use normalize::normalize_url;
