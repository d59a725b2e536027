//! Configuration module for Trawline
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use trawline::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Record quota: {}", config.harvest.max_records);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AdvisoryConfig, Config, HarvestConfig, OutputConfig, PacingConfig, SearchEntry,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
