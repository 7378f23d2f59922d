use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod app_config;
mod config;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};

/// Chat identity that owns a list of alerts. Telegram chat ids are numeric,
/// but the persisted document keys them as strings.
pub type UserId = String;

/// The full persisted collection: one ordered alert list per user.
///
/// `BTreeMap` keeps user ordering deterministic so that saving an unchanged
/// book reproduces an identical document.
pub type AlertBook = BTreeMap<UserId, Vec<Alert>>;

/// One user's tracked product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Stable identifier within the owning user's list. Derived from the
    /// product URL where possible, else a positional fallback. Not unique
    /// across users.
    pub id: String,

    /// Display name, last value seen from a successful fetch.
    pub name: String,

    /// Product URL, immutable after creation.
    pub url: String,

    /// Last observed price in whole currency units.
    pub current_price: i64,

    /// User-chosen threshold, immutable after creation.
    pub target_price: i64,

    pub added_at: DateTime<Utc>,
}

/// A single fetch's observation of a product page. Never persisted directly;
/// only folded into an [`Alert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub name: String,
    pub price: i64,
    pub url: String,
    pub image: Option<String>,
}

/// A threshold crossing detected during a scan cycle. Ephemeral: produced by
/// the engine, delivered once, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub user_id: UserId,
    pub alert_name: String,
    pub old_price: i64,
    pub new_price: i64,
    pub target_price: i64,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
