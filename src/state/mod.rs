//! State module for queue entries and domains
//!
//! # Components
//!
//! - `QueueStatus`: Status of a URL in the crawl queue, with its transition table
//! - `DomainRecord`: A registered domain and its processed-link counter

mod domain_state;
mod queue_status;

// Re-export main types
pub use domain_state::DomainRecord;
pub use queue_status::{InvalidTransition, QueueStatus};
