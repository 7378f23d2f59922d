//! Chat command handlers.
//!
//! Thin request/response glue over the engine and store: parse the message
//! text, validate arguments, mutate or query the alert collection, reply.
//! Handlers never touch the network for replies — the poller owns delivery.

use chrono::Utc;
use dropwatch_core::Alert;
use dropwatch_scraper::{extract_product_id, is_marketplace_url, ScrapeError};
use dropwatch_store::StoreError;
use thiserror::Error;

use crate::engine::{AlertStore, EngineError, MonitorEngine, Notifier, ProductFetcher, UserFilter};

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Add(Vec<String>),
    List,
    Remove(Vec<String>),
    Check,
    Unknown,
}

/// Parses message text into a [`Command`].
///
/// Returns `None` for plain text — the bot only reacts to `/commands`.
/// A `@botname` suffix (group chats) is stripped from the command word.
#[must_use]
pub fn parse(text: &str) -> Option<Command> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?;
    let name = head.strip_prefix('/')?;
    let name = name.split('@').next().unwrap_or(name);
    let args: Vec<String> = parts.map(str::to_owned).collect();

    Some(match name {
        "start" => Command::Start,
        "help" => Command::Help,
        "add" => Command::Add(args),
        "list" => Command::List,
        "remove" => Command::Remove(args),
        "check" => Command::Check,
        _ => Command::Unknown,
    })
}

#[derive(Debug, Error)]
pub enum CommandError {
    /// Bad arguments; the message is shown to the user verbatim.
    #[error("{0}")]
    Validation(String),

    /// `/remove` referenced an id the user does not have.
    #[error("no price alert found with id {0}")]
    NotFound(String),

    /// The initial fetch for `/add` failed.
    #[error("product fetch failed: {0}")]
    Fetch(#[source] ScrapeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl CommandError {
    /// The reply shown to the requesting user. Internal failures stay vague
    /// here and detailed in the logs.
    #[must_use]
    pub fn user_reply(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::NotFound(id) => format!("❌ No price alert found with ID: {id}"),
            Self::Fetch(_) => {
                "Failed to fetch product details. Please check the URL and try again.".to_string()
            }
            Self::Store(_) | Self::Engine(_) => {
                "Something went wrong on our side. Please try again later.".to_string()
            }
        }
    }
}

/// Dispatches one parsed command for `user_id` and produces the reply text.
///
/// # Errors
///
/// Returns [`CommandError`] for validation failures, unknown ids, fetch
/// failures during `/add`, and store/engine failures. Callers turn these
/// into user replies via [`CommandError::user_reply`].
pub async fn handle<F, S, N>(
    engine: &MonitorEngine<F, S, N>,
    user_id: &str,
    command: Command,
) -> Result<String, CommandError>
where
    F: ProductFetcher,
    S: AlertStore,
    N: Notifier,
{
    match command {
        Command::Start | Command::Help => Ok(usage_text()),
        Command::Add(args) => handle_add(engine, user_id, &args).await,
        Command::List => handle_list(engine, user_id).await,
        Command::Remove(args) => handle_remove(engine, user_id, &args).await,
        Command::Check => handle_check(engine, user_id).await,
        Command::Unknown => Ok("Unknown command. Send /help to see what I can do.".to_string()),
    }
}

fn usage_text() -> String {
    "Welcome to the price alert bot!\n\n\
     Commands:\n\
     /add <Flipkart URL> <target price> - Add a new price alert\n\
     /list - List all your price alerts\n\
     /remove <alert id> - Remove a price alert\n\
     /check - Manually check all your price alerts"
        .to_string()
}

/// `/add <url> <target>`: validate, fetch once, persist immediately.
async fn handle_add<F, S, N>(
    engine: &MonitorEngine<F, S, N>,
    user_id: &str,
    args: &[String],
) -> Result<String, CommandError>
where
    F: ProductFetcher,
    S: AlertStore,
    N: Notifier,
{
    let (Some(url), Some(raw_target)) = (args.first(), args.get(1)) else {
        return Err(CommandError::Validation(
            "Please provide a Flipkart URL and target price. \
             Example: /add https://www.flipkart.com/product-page 1000"
                .to_string(),
        ));
    };

    let target_price: i64 = raw_target.parse().map_err(|_| {
        CommandError::Validation("Invalid price. Please provide a numeric value.".to_string())
    })?;

    if !is_marketplace_url(url) {
        return Err(CommandError::Validation(
            "Please provide a valid Flipkart URL.".to_string(),
        ));
    }

    let snapshot = engine
        .fetcher()
        .fetch(url)
        .await
        .map_err(CommandError::Fetch)?;

    let mut book = engine.store().load_all().await?;
    let alerts = book.entry(user_id.to_string()).or_default();
    let id = extract_product_id(url).unwrap_or_else(|| alerts.len().to_string());
    alerts.push(Alert {
        id,
        name: snapshot.name.clone(),
        url: url.clone(),
        current_price: snapshot.price,
        target_price,
        added_at: Utc::now(),
    });
    engine.store().save_all(&book).await?;

    Ok(format!(
        "✅ Price alert added!\n\n\
         Product: {}\n\
         Current Price: ₹{}\n\
         Target Price: ₹{}\n\n\
         You will be notified when the price drops below your target.",
        snapshot.name, snapshot.price, target_price,
    ))
}

async fn handle_list<F, S, N>(
    engine: &MonitorEngine<F, S, N>,
    user_id: &str,
) -> Result<String, CommandError>
where
    F: ProductFetcher,
    S: AlertStore,
    N: Notifier,
{
    use std::fmt::Write as _;

    let book = engine.store().load_all().await?;
    let alerts = book.get(user_id).map(Vec::as_slice).unwrap_or_default();
    if alerts.is_empty() {
        return Ok("You have no active price alerts.".to_string());
    }

    let mut message = String::from("Your active price alerts:\n\n");
    for (position, alert) in alerts.iter().enumerate() {
        let _ = write!(
            message,
            "{}. {}\n   Current Price: ₹{}\n   Target Price: ₹{}\n   ID: {}\n\n",
            position + 1,
            alert.name,
            alert.current_price,
            alert.target_price,
            alert.id,
        );
    }
    Ok(message)
}

/// `/remove <id>`: drops the first alert with a matching id. An unknown id
/// writes nothing — the persisted document stays untouched.
async fn handle_remove<F, S, N>(
    engine: &MonitorEngine<F, S, N>,
    user_id: &str,
    args: &[String],
) -> Result<String, CommandError>
where
    F: ProductFetcher,
    S: AlertStore,
    N: Notifier,
{
    let Some(alert_id) = args.first() else {
        return Err(CommandError::Validation(
            "Please provide the alert ID to remove. Use /list to see all your alerts with IDs."
                .to_string(),
        ));
    };

    let mut book = engine.store().load_all().await?;
    let Some(alerts) = book.get_mut(user_id) else {
        return Err(CommandError::NotFound(alert_id.clone()));
    };
    let Some(position) = alerts.iter().position(|a| &a.id == alert_id) else {
        return Err(CommandError::NotFound(alert_id.clone()));
    };

    let removed = alerts.remove(position);
    engine.store().save_all(&book).await?;

    Ok(format!("✅ Price alert removed: {}", removed.name))
}

/// `/check`: run a scan cycle for just the caller. Queues behind any
/// in-flight scheduled cycle; crossings are delivered through the normal
/// notification path before this summary reply.
async fn handle_check<F, S, N>(
    engine: &MonitorEngine<F, S, N>,
    user_id: &str,
) -> Result<String, CommandError>
where
    F: ProductFetcher,
    S: AlertStore,
    N: Notifier,
{
    let outcome = engine.run_cycle(&UserFilter::single(user_id)).await?;

    if outcome.scanned == 0 {
        return Ok("You have no active price alerts.".to_string());
    }

    let mut message = format!(
        "Checked {} alert(s): {} price drop(s) found.",
        outcome.scanned,
        outcome.notifications.len(),
    );
    if outcome.fetch_failures > 0 {
        use std::fmt::Write as _;
        let _ = write!(
            message,
            " {} product(s) could not be checked right now.",
            outcome.fetch_failures
        );
    }
    Ok(message)
}

#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;
