//! Queue status definitions and the transition table for queue entries
//!
//! The store only guarantees row-level atomicity, so every status change the
//! crawler makes is checked against [`QueueStatus::validate_transition`] first.

use std::fmt;
use thiserror::Error;

/// Represents the status of a URL in the crawl queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueStatus {
    /// Waiting to be claimed by a worker
    Pending,

    /// Claimed by exactly one worker and currently being crawled
    Processing,

    /// Crawled successfully (terminal)
    Done,

    /// Could not be fetched or crawling was not permitted (terminal)
    Unreachable,
}

/// Error returned when a status change is not part of the queue state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid queue transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: QueueStatus,
    pub to: QueueStatus,
}

impl QueueStatus {
    /// Returns true if this is a terminal status for the crawler
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Unreachable)
    }

    /// Returns true if the entry may be claimed
    pub fn is_claimable(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Returns true if `next` is a legal successor of this status
    ///
    /// | From | To |
    /// |------|----|
    /// | pending | processing (claim) |
    /// | processing | done (complete ok) |
    /// | processing | unreachable (complete fail) |
    pub fn can_transition_to(&self, next: QueueStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Done)
                | (Self::Processing, Self::Unreachable)
        )
    }

    /// Checks a transition against the state machine
    pub fn validate_transition(&self, next: QueueStatus) -> Result<(), InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: *self,
                to: next,
            })
        }
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Unreachable => "unreachable",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "done" => Some(Self::Done),
            "unreachable" => Some(Self::Unreachable),
            _ => None,
        }
    }

    /// Returns all queue statuses
    pub fn all_statuses() -> [Self; 4] {
        [Self::Pending, Self::Processing, Self::Done, Self::Unreachable]
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
