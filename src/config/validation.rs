use crate::config::types::{AdvisoryConfig, Config, HarvestConfig, PacingConfig, SearchEntry};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvest_config(&config.harvest)?;
    validate_pacing_config(&config.pacing)?;
    validate_advisory_config(&config.advisory)?;
    validate_output_config(&config.output)?;
    validate_searches(&config.searches)?;
    Ok(())
}

/// Validates harvest configuration
fn validate_harvest_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.max_records < 1 {
        return Err(ConfigError::Validation(format!(
            "max-records must be >= 1, got {}",
            config.max_records
        )));
    }

    if config.max_concurrent_sessions < 1 || config.max_concurrent_sessions > 16 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-sessions must be between 1 and 16, got {}",
            config.max_concurrent_sessions
        )));
    }

    if config.max_session_runtime_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "max-session-runtime-secs must be >= 1, got {}",
            config.max_session_runtime_secs
        )));
    }

    if config.max_iterations < 1 {
        return Err(ConfigError::Validation(format!(
            "max-iterations must be >= 1, got {}",
            config.max_iterations
        )));
    }

    if config.login_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "login-retries must be >= 1, got {}",
            config.login_retries
        )));
    }

    if config.pagination_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "pagination-retries must be >= 1, got {}",
            config.pagination_retries
        )));
    }

    Ok(())
}

/// Validates pacing configuration
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    if config.base_delay_min_ms > config.base_delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "base-delay-min-ms ({}) must not exceed base-delay-max-ms ({})",
            config.base_delay_min_ms, config.base_delay_max_ms
        )));
    }

    if config.long_pause_min_ms > config.long_pause_max_ms {
        return Err(ConfigError::Validation(format!(
            "long-pause-min-ms ({}) must not exceed long-pause-max-ms ({})",
            config.long_pause_min_ms, config.long_pause_max_ms
        )));
    }

    if !(0.0..=1.0).contains(&config.long_pause_chance) {
        return Err(ConfigError::Validation(format!(
            "long-pause-chance must be between 0.0 and 1.0, got {}",
            config.long_pause_chance
        )));
    }

    Ok(())
}

/// Validates advisory configuration
fn validate_advisory_config(config: &AdvisoryConfig) -> Result<(), ConfigError> {
    Url::parse(&config.base_url).map_err(|e| {
        ConfigError::Validation(format!("Invalid advisory base-url '{}': {}", config.base_url, e))
    })?;

    if config.model.is_empty() {
        return Err(ConfigError::Validation(
            "advisory model cannot be empty".to_string(),
        ));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "advisory max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &crate::config::types::OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.export_path.is_empty() {
        return Err(ConfigError::Validation(
            "export-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates search entries
fn validate_searches(searches: &[SearchEntry]) -> Result<(), ConfigError> {
    if searches.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[search]] entry is required".to_string(),
        ));
    }

    for entry in searches {
        if entry.keyword.trim().is_empty() {
            return Err(ConfigError::Validation(
                "search keyword cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::OutputConfig;

    fn base_config() -> Config {
        Config {
            harvest: HarvestConfig {
                max_records: 200,
                max_concurrent_sessions: 2,
                max_session_runtime_secs: 10_800,
                max_iterations: 200,
                stall_threshold: 5,
                login_retries: 3,
                login_retry_delay_ms: 5_000,
                pagination_retries: 3,
                pagination_retry_delay_ms: 5_000,
            },
            pacing: PacingConfig::default(),
            advisory: AdvisoryConfig {
                base_url: "https://openrouter.ai/api/v1".to_string(),
                model: "openai/gpt-3.5-turbo".to_string(),
                api_key_env: "TRAWLINE_ADVISORY_KEY".to_string(),
                max_attempts: 3,
                backoff_base_ms: 500,
                request_timeout_secs: 30,
            },
            output: OutputConfig {
                database_path: "./test.db".to_string(),
                export_path: "./records.json".to_string(),
            },
            searches: vec![SearchEntry {
                keyword: "Data Scientist".to_string(),
                location: "New Delhi".to_string(),
            }],
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_zero_quota_rejected() {
        let mut config = base_config();
        config.harvest.max_records = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_sessions_rejected() {
        let mut config = base_config();
        config.harvest.max_concurrent_sessions = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_advisory_url_rejected() {
        let mut config = base_config();
        config.advisory.base_url = "not a url".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_inverted_pacing_bounds_rejected() {
        let mut config = base_config();
        config.pacing.base_delay_min_ms = 10_000;
        config.pacing.base_delay_max_ms = 1_000;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_no_searches_rejected() {
        let mut config = base_config();
        config.searches.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_keyword_rejected() {
        let mut config = base_config();
        config.searches[0].keyword = "  ".to_string();
        assert!(validate(&config).is_err());
    }
}
