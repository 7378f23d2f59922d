//! Long-poll loop for inbound Telegram commands.

use std::time::Duration;

use dropwatch_telegram::{TelegramError, Update};

use crate::commands::{self, Command};
use crate::BotCtx;

/// Pause after a transient polling failure before trying again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Polls `getUpdates` forever, dispatching each command message.
///
/// Handler and delivery failures are replied to or logged per message and
/// never stop the loop.
///
/// # Errors
///
/// Returns an error only when Telegram rejects the poll at the API level
/// (`ok: false`) — in practice a bad bot token, which no amount of retrying
/// will fix.
pub async fn run(ctx: &BotCtx) -> anyhow::Result<()> {
    let mut offset: Option<i64> = None;

    loop {
        let updates = match ctx
            .telegram
            .get_updates(offset, ctx.config.telegram_poll_timeout_secs)
            .await
        {
            Ok(updates) => updates,
            Err(e @ TelegramError::Api(_)) => {
                return Err(anyhow::Error::from(e)
                    .context("Telegram rejected getUpdates; check TELEGRAM_BOT_TOKEN"));
            }
            Err(e) => {
                tracing::warn!(error = %e, "getUpdates failed — retrying");
                tokio::time::sleep(POLL_RETRY_DELAY).await;
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);
            handle_update(ctx, update).await;
        }
    }
}

async fn handle_update(ctx: &BotCtx, update: Update) {
    let Some(message) = update.message else {
        return;
    };
    let Some(text) = message.text.as_deref() else {
        return;
    };
    let Some(command) = commands::parse(text) else {
        return;
    };
    let chat_id = message.chat.id.to_string();

    // The slow commands get an interim notice, like any human operator
    // would send, before the fetch work starts.
    let interim = match &command {
        Command::Add(_) => Some("Fetching product details, please wait..."),
        Command::Check => Some("Checking prices for your alerts, please wait..."),
        _ => None,
    };
    if let Some(notice) = interim {
        if let Err(e) = ctx.telegram.send_message(&chat_id, notice).await {
            tracing::warn!(chat_id = %chat_id, error = %e, "failed to send interim reply");
        }
    }

    let reply = match commands::handle(&ctx.engine, &chat_id, command).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(chat_id = %chat_id, error = %e, "command failed");
            e.user_reply()
        }
    };

    if let Err(e) = ctx.telegram.send_message(&chat_id, &reply).await {
        tracing::error!(chat_id = %chat_id, error = %e, "failed to send reply");
    }
}
