//! Page driver abstraction
//!
//! The [`PageDriver`] trait is the seam between the crawl controller and the
//! underlying page automation (browser, HTTP session, replay fixture). The
//! controller only consumes abstract observations and extraction results;
//! DOM selectors, credential entry, and navigation mechanics live entirely
//! behind this trait.

mod scripted;

pub use scripted::{ScriptedDriver, ScriptedPage};

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced by page driver operations
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("login failed: {0}")]
    Login(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("pagination failed: {0}")]
    Pagination(String),

    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("operation timed out: {0}")]
    Timeout(String),
}

/// An unvalidated extracted item, before dedup and quota filtering
#[derive(Debug, Clone)]
pub struct RawCandidate {
    /// Source URL of the item
    pub url: String,

    /// Display name as rendered on the results page
    pub display_name: String,

    /// Optional structured fields, present when the page exposes them
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub connection_degree: Option<String>,
}

impl RawCandidate {
    /// Creates a candidate with only the required fields
    pub fn new(url: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            display_name: display_name.into(),
            title: None,
            company: None,
            location: None,
            connection_degree: None,
        }
    }
}

/// Abstraction over the page automation backing a single session
///
/// One driver instance is owned by exactly one session; implementations do
/// not need to be shareable. All operations are fallible: the controller
/// maps failures onto its retry and termination rules, never panics.
#[async_trait]
pub trait PageDriver: Send {
    /// Authenticates the underlying session
    async fn login(&mut self) -> Result<(), DriverError>;

    /// Navigates to the results listing and submits the search query
    async fn navigate_to_search(&mut self, query: &str) -> Result<(), DriverError>;

    /// An identifier for the current page, recorded in crawl memory
    fn current_location(&self) -> String;

    /// Content-derived hash of the current page state
    ///
    /// Two observations with equal fingerprints are treated as the same
    /// underlying page by stall detection.
    async fn page_fingerprint(&mut self) -> Result<String, DriverError>;

    /// Whether the page shows an anti-automation challenge or warning
    async fn defensive_signal_detected(&mut self) -> Result<bool, DriverError>;

    /// Whether a next results page is available
    async fn has_next_page(&mut self) -> Result<bool, DriverError>;

    /// Advances to the next results page
    async fn click_next(&mut self) -> Result<(), DriverError>;

    /// Extracts raw candidates from the current page
    async fn extract_candidates(&mut self) -> Result<Vec<RawCandidate>, DriverError>;

    /// Releases underlying resources; called on every session exit path
    async fn close(&mut self) {}
}
