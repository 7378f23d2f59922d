use std::path::PathBuf;

/// Deployment environment, selected by `DROPWATCH_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

/// Process-wide configuration, loaded once at startup from environment
/// variables (see [`crate::load_app_config`]).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Telegram bot credential. Opaque; never logged.
    pub telegram_bot_token: String,

    pub env: Environment,
    pub log_level: String,

    /// Path of the persisted alert document.
    pub data_path: PathBuf,

    /// Minutes between scheduled scan cycles, measured from the end of the
    /// previous cycle. At least 1.
    pub check_interval_minutes: u64,

    pub fetch_timeout_secs: u64,
    pub fetch_user_agent: String,
    /// Additional fetch attempts after the first failure.
    pub fetch_max_retries: u32,
    pub fetch_backoff_base_ms: u64,
    /// Upper bound on in-flight product fetches within one scan cycle.
    pub max_concurrent_fetches: usize,

    pub telegram_timeout_secs: u64,
    /// Long-poll timeout passed to `getUpdates`. Must stay below the HTTP
    /// client timeout or every idle poll ends in a client-side timeout.
    pub telegram_poll_timeout_secs: u64,
}
