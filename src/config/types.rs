use serde::Deserialize;

/// Main configuration structure for Trawline
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub harvest: HarvestConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    pub advisory: AdvisoryConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "search")]
    pub searches: Vec<SearchEntry>,
}

/// Harvest behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestConfig {
    /// Maximum number of records to collect across all sessions
    #[serde(rename = "max-records")]
    pub max_records: u64,

    /// Maximum number of sessions running concurrently
    #[serde(rename = "max-concurrent-sessions", default = "default_max_sessions")]
    pub max_concurrent_sessions: u32,

    /// Maximum wall-clock runtime for a single session (seconds)
    #[serde(
        rename = "max-session-runtime-secs",
        default = "default_session_runtime"
    )]
    pub max_session_runtime_secs: u64,

    /// Hard ceiling on loop iterations per session
    #[serde(rename = "max-iterations", default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Repeated (action, fingerprint) observations tolerated before a
    /// session is considered stalled
    #[serde(rename = "stall-threshold", default = "default_stall_threshold")]
    pub stall_threshold: u32,

    /// Login attempts before the session is abandoned
    #[serde(rename = "login-retries", default = "default_login_retries")]
    pub login_retries: u32,

    /// Base delay between login attempts (milliseconds); doubles per attempt
    #[serde(rename = "login-retry-delay-ms", default = "default_login_delay")]
    pub login_retry_delay_ms: u64,

    /// Pagination attempts before the session loop is terminated
    #[serde(rename = "pagination-retries", default = "default_pagination_retries")]
    pub pagination_retries: u32,

    /// Fixed delay between pagination attempts (milliseconds)
    #[serde(
        rename = "pagination-retry-delay-ms",
        default = "default_pagination_delay"
    )]
    pub pagination_retry_delay_ms: u64,
}

/// Humanized pacing configuration
///
/// Delays injected after page actions to emulate human browsing rhythm.
/// Not correctness-critical; the loop works with all values at zero.
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Lower bound of the base delay (milliseconds)
    #[serde(rename = "base-delay-min-ms")]
    pub base_delay_min_ms: u64,

    /// Upper bound of the base delay (milliseconds)
    #[serde(rename = "base-delay-max-ms")]
    pub base_delay_max_ms: u64,

    /// Probability of an occasional much longer pause
    #[serde(rename = "long-pause-chance")]
    pub long_pause_chance: f64,

    /// Lower bound of the long pause (milliseconds)
    #[serde(rename = "long-pause-min-ms")]
    pub long_pause_min_ms: u64,

    /// Upper bound of the long pause (milliseconds)
    #[serde(rename = "long-pause-max-ms")]
    pub long_pause_max_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            base_delay_min_ms: 3_000,
            base_delay_max_ms: 7_000,
            long_pause_chance: 0.1,
            long_pause_min_ms: 15_000,
            long_pause_max_ms: 30_000,
        }
    }
}

/// Advisory service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisoryConfig {
    /// Base URL of an OpenAI-compatible chat-completions API
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Model identifier passed through to the service
    pub model: String,

    /// Environment variable holding the API key
    ///
    /// An unset key is not an error: the client degrades to its
    /// deterministic default decision without calling the network.
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Attempts per advisory query before falling back to the default
    #[serde(rename = "max-attempts", default = "default_advisory_attempts")]
    pub max_attempts: u32,

    /// Base backoff between attempts (milliseconds); doubles per attempt
    #[serde(rename = "backoff-base-ms", default = "default_advisory_backoff")]
    pub backoff_base_ms: u64,

    /// Per-attempt request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_advisory_timeout")]
    pub request_timeout_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the merged JSON export file
    #[serde(rename = "export-path")]
    pub export_path: String,
}

/// A single search session specification
#[derive(Debug, Clone, Deserialize)]
pub struct SearchEntry {
    /// Search keyword (e.g. a role or topic)
    pub keyword: String,

    /// Location qualifier appended to the keyword
    pub location: String,
}

fn default_max_sessions() -> u32 {
    2
}

fn default_session_runtime() -> u64 {
    10_800 // 3 hours
}

fn default_max_iterations() -> u32 {
    200
}

fn default_stall_threshold() -> u32 {
    5
}

fn default_login_retries() -> u32 {
    3
}

fn default_login_delay() -> u64 {
    5_000
}

fn default_pagination_retries() -> u32 {
    3
}

fn default_pagination_delay() -> u64 {
    5_000
}

fn default_api_key_env() -> String {
    "TRAWLINE_ADVISORY_KEY".to_string()
}

fn default_advisory_attempts() -> u32 {
    3
}

fn default_advisory_backoff() -> u64 {
    500
}

fn default_advisory_timeout() -> u64 {
    30
}
