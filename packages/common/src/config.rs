use serde::Deserialize;

/// Duel lifecycle settings.
#[derive(Debug, Deserialize, Clone)]
pub struct DuelConfig {
    /// Time limit applied when a create request omits one, in minutes. Default: 30.
    #[serde(default = "default_time_limit")]
    pub default_time_limit: i32,
    /// Smallest accepted time limit, in minutes. Default: 5.
    #[serde(default = "default_min_time_limit")]
    pub min_time_limit: i32,
    /// Largest accepted time limit, in minutes. Default: 120.
    #[serde(default = "default_max_time_limit")]
    pub max_time_limit: i32,
    /// Record solutions arriving after `end_time` as timeouts. Default: true.
    #[serde(default = "default_enforce_deadline")]
    pub enforce_deadline: bool,
    /// How often the expiry sweeper scans for overdue duels. 0 disables it. Default: 30.
    #[serde(default = "default_expiry_sweep_interval_secs")]
    pub expiry_sweep_interval_secs: u64,
    /// Extra time past `end_time` before the sweeper closes a duel. Default: 60.
    #[serde(default = "default_expiry_grace_secs")]
    pub expiry_grace_secs: i64,
    /// Attempts for a duel write before giving up on contention. Default: 3.
    #[serde(default = "default_max_write_attempts")]
    pub max_write_attempts: u8,
}

fn default_time_limit() -> i32 {
    30
}
fn default_min_time_limit() -> i32 {
    5
}
fn default_max_time_limit() -> i32 {
    120
}
fn default_enforce_deadline() -> bool {
    true
}
fn default_expiry_sweep_interval_secs() -> u64 {
    30
}
fn default_expiry_grace_secs() -> i64 {
    60
}
fn default_max_write_attempts() -> u8 {
    3
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            default_time_limit: default_time_limit(),
            min_time_limit: default_min_time_limit(),
            max_time_limit: default_max_time_limit(),
            enforce_deadline: default_enforce_deadline(),
            expiry_sweep_interval_secs: default_expiry_sweep_interval_secs(),
            expiry_grace_secs: default_expiry_grace_secs(),
            max_write_attempts: default_max_write_attempts(),
        }
    }
}

/// Settings for the Judge0-compatible code execution API.
#[derive(Debug, Deserialize, Clone)]
pub struct JudgeConfig {
    /// Whether submissions are sent to the judge at all. Default: true.
    #[serde(default = "default_judge_enabled")]
    pub enabled: bool,
    /// Base URL of the Judge0 API. Default: "https://judge0-ce.p.rapidapi.com".
    #[serde(default = "default_judge_base_url")]
    pub base_url: String,
    /// RapidAPI key, sent as `X-RapidAPI-Key` when present.
    #[serde(default)]
    pub api_key: Option<String>,
    /// RapidAPI host, sent as `X-RapidAPI-Host` when present.
    #[serde(default)]
    pub api_host: Option<String>,
    /// Maximum number of result polls per submission. Default: 10.
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u8,
    /// Initial poll delay in milliseconds. Default: 500.
    #[serde(default = "default_poll_base_ms")]
    pub poll_base_ms: u64,
    /// Poll delay cap in milliseconds. Default: 4000.
    #[serde(default = "default_poll_max_ms")]
    pub poll_max_ms: u64,
    /// Overall deadline for one submission, in seconds. Default: 60.
    ///
    /// Raised to the full poll schedule plus one request timeout when set lower.
    #[serde(default = "default_judge_timeout_secs")]
    pub timeout_secs: u64,
    /// Timeout for each HTTP call to the judge, in seconds. Default: 10.
    #[serde(default = "default_judge_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_judge_enabled() -> bool {
    true
}
fn default_judge_base_url() -> String {
    "https://judge0-ce.p.rapidapi.com".into()
}
fn default_poll_attempts() -> u8 {
    10
}
fn default_poll_base_ms() -> u64 {
    500
}
fn default_poll_max_ms() -> u64 {
    4000
}
fn default_judge_timeout_secs() -> u64 {
    60
}
fn default_judge_request_timeout_secs() -> u64 {
    10
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            enabled: default_judge_enabled(),
            base_url: default_judge_base_url(),
            api_key: None,
            api_host: None,
            poll_attempts: default_poll_attempts(),
            poll_base_ms: default_poll_base_ms(),
            poll_max_ms: default_poll_max_ms(),
            timeout_secs: default_judge_timeout_secs(),
            request_timeout_secs: default_judge_request_timeout_secs(),
        }
    }
}
