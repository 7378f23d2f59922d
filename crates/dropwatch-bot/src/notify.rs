//! Outbound price-drop messages.

use dropwatch_core::Notification;
use dropwatch_telegram::{TelegramClient, TelegramError};

use crate::engine::Notifier;

/// Delivers a cycle's crossings to their user over Telegram, all of one
/// user's crossings folded into a single message.
pub struct TelegramNotifier {
    client: TelegramClient,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

impl Notifier for TelegramNotifier {
    async fn notify(&self, user_id: &str, events: &[Notification]) -> Result<(), TelegramError> {
        self.client
            .send_message(user_id, &format_price_drops(events))
            .await
    }
}

fn format_price_drops(events: &[Notification]) -> String {
    use std::fmt::Write as _;

    let mut message =
        String::from("🔔 Price Alert! The following products have reached your target price:\n\n");
    for event in events {
        let _ = write!(
            message,
            "🛒 {}\n   Old Price: ₹{}\n   Current Price: ₹{} ✅\n   Target Price: ₹{}\n   Link: {}\n\n",
            event.alert_name, event.old_price, event.new_price, event.target_price, event.url,
        );
    }
    message
}
