//! Minimal typed client for the Telegram Bot API.
//!
//! Covers exactly what the bot needs: `sendMessage` for outbound replies and
//! notifications, and `getUpdates` long polling for inbound commands.
//! API-level failures (`ok: false` envelopes) surface as typed errors.

mod client;
mod error;
mod types;

pub use client::TelegramClient;
pub use error::TelegramError;
pub use types::{Chat, Message, Update};
