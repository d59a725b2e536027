//! Trawline: an advisory-guided results harvester
//!
//! This crate implements the control loop for a bounded data-collection crawl:
//! it drives paginated results sessions, combines an external advisory signal
//! with local heuristics to choose the next action, detects stalls, enforces a
//! record quota, and persists deduplicated records incrementally so partial
//! results survive any failure mode.
//!
//! Page automation and the advisory transport are external collaborators
//! behind the [`driver::PageDriver`] and [`advisory::AdvisoryService`] traits.

pub mod advisory;
pub mod config;
pub mod driver;
pub mod harvest;
pub mod output;
pub mod policy;
pub mod session;
pub mod storage;

use thiserror::Error;

/// Main error type for Trawline operations
#[derive(Debug, Error)]
pub enum TrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Page driver error: {0}")]
    Driver(#[from] driver::DriverError),

    #[error("Login failed after {attempts} attempts: {last_error}")]
    LoginFailed { attempts: u32, last_error: String },

    #[error("Export error: {0}")]
    Export(#[from] output::ExportError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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
}

/// Result type alias for Trawline operations
pub type Result<T> = std::result::Result<T, TrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use advisory::{Action, Decision};
pub use config::Config;
pub use driver::{PageDriver, RawCandidate};
pub use session::CrawlMemory;
pub use storage::Record;
