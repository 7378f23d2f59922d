use std::path::PathBuf;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Loads the bot configuration, reading a `.env` file first if one exists.
///
/// # Errors
///
/// Returns `ConfigError` if a required variable is absent or a value fails
/// validation.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Loads configuration from the process environment alone, skipping `.env`
/// discovery. Callers that manage the environment themselves use this.
///
/// # Errors
///
/// Returns `ConfigError` if a required variable is absent or a value fails
/// validation.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Parsing and validation over an injected variable lookup, so tests can
/// drive it with a plain `HashMap` instead of mutating the real environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let telegram_bot_token = require("TELEGRAM_BOT_TOKEN")?;

    let env = parse_environment(&or_default("DROPWATCH_ENV", "development"));
    let log_level = or_default("DROPWATCH_LOG_LEVEL", "info");
    let data_path = PathBuf::from(or_default("DROPWATCH_DATA_PATH", "./product_alerts.json"));

    let check_interval_minutes = parse_u64("DROPWATCH_CHECK_INTERVAL_MINUTES", "60")?;
    if check_interval_minutes == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "DROPWATCH_CHECK_INTERVAL_MINUTES".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let fetch_timeout_secs = parse_u64("DROPWATCH_FETCH_TIMEOUT_SECS", "10")?;
    let fetch_user_agent = or_default(
        "DROPWATCH_FETCH_USER_AGENT",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    );
    let fetch_max_retries = parse_u32("DROPWATCH_FETCH_MAX_RETRIES", "2")?;
    let fetch_backoff_base_ms = parse_u64("DROPWATCH_FETCH_BACKOFF_BASE_MS", "500")?;
    let max_concurrent_fetches = parse_usize("DROPWATCH_MAX_CONCURRENT_FETCHES", "4")?.max(1);

    let telegram_timeout_secs = parse_u64("DROPWATCH_TELEGRAM_TIMEOUT_SECS", "65")?;
    let telegram_poll_timeout_secs = parse_u64("DROPWATCH_TELEGRAM_POLL_TIMEOUT_SECS", "50")?;
    if telegram_poll_timeout_secs >= telegram_timeout_secs {
        return Err(ConfigError::InvalidEnvVar {
            var: "DROPWATCH_TELEGRAM_POLL_TIMEOUT_SECS".to_string(),
            reason: format!(
                "must be below DROPWATCH_TELEGRAM_TIMEOUT_SECS ({telegram_timeout_secs})"
            ),
        });
    }

    Ok(AppConfig {
        telegram_bot_token,
        env,
        log_level,
        data_path,
        check_interval_minutes,
        fetch_timeout_secs,
        fetch_user_agent,
        fetch_max_retries,
        fetch_backoff_base_ms,
        max_concurrent_fetches,
        telegram_timeout_secs,
        telegram_poll_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
