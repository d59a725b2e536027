//! Advisory module: the external decision oracle
//!
//! This module contains:
//! - The [`Action`] / [`Decision`] types produced once per loop iteration
//! - A strict parser for the oracle's plain-text reply format
//! - An HTTP client for OpenAI-compatible chat-completions services
//! - A retrying wrapper that converts every failure mode into "no advice"
//!
//! The oracle is treated as untrusted and unreliable: every failure mode
//! (transport, API, malformed reply) degrades to the decision policy's
//! deterministic fallback rather than surfacing an error to the control loop.

mod client;
mod parser;

pub use client::{AdvisoryError, AdvisoryService, HttpAdvisoryClient, RetryingAdvisory};
pub use parser::{parse_reply, ParseError};

use std::fmt;

/// The next action for a crawl session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Advance to the next results page
    Paginate,

    /// Extract candidates from the current page
    Extract,

    /// End the session
    Stop,
}

impl Action {
    /// Canonical lowercase name, as used in prompts and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paginate => "paginate",
            Self::Extract => "extract",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decision for one loop iteration
///
/// Ephemeral: produced per iteration, logged, never persisted. The
/// `reasoning` string is diagnostic only and never drives control flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub action: Action,
    pub reasoning: String,
}

impl Decision {
    /// Creates a decision with the given action and reasoning
    pub fn new(action: Action, reasoning: impl Into<String>) -> Self {
        Self {
            action,
            reasoning: reasoning.into(),
        }
    }

    /// The deterministic decision used when the oracle is unreachable
    /// or structurally broken after all attempts
    pub fn advisory_unavailable() -> Self {
        Self::new(Action::Extract, "default due to advisory unavailability")
    }
}
