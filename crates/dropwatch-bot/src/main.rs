mod commands;
mod engine;
mod notify;
mod poller;
mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dropwatch_core::AppConfig;
use dropwatch_scraper::FlipkartClient;
use dropwatch_store::JsonAlertStore;
use dropwatch_telegram::TelegramClient;

use crate::engine::{MonitorEngine, UserFilter};
use crate::notify::TelegramNotifier;

/// The fully wired engine used by the running process.
pub(crate) type LiveEngine = MonitorEngine<FlipkartClient, JsonAlertStore, TelegramNotifier>;

/// Everything the poller needs to serve commands.
pub(crate) struct BotCtx {
    pub config: AppConfig,
    pub engine: Arc<LiveEngine>,
    pub telegram: TelegramClient,
}

#[derive(Debug, Parser)]
#[command(name = "dropwatch-bot")]
#[command(about = "Flipkart price-drop alerts over Telegram")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve commands and run the scheduled price monitor (default)
    Run,
    /// Run one scan cycle, print a summary, and exit
    Scan {
        /// Restrict the cycle to a single user id
        #[arg(long)]
        user: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = dropwatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let fetcher = FlipkartClient::new(
        config.fetch_timeout_secs,
        &config.fetch_user_agent,
        config.fetch_max_retries,
        config.fetch_backoff_base_ms,
    )?;
    let store = JsonAlertStore::new(config.data_path.clone());
    let telegram = TelegramClient::new(&config.telegram_bot_token, config.telegram_timeout_secs)?;
    let engine = Arc::new(MonitorEngine::new(
        fetcher,
        store,
        TelegramNotifier::new(telegram.clone()),
        config.max_concurrent_fetches,
    ));

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let interval = Duration::from_secs(config.check_interval_minutes * 60);
            scheduler::spawn_price_monitor(Arc::clone(&engine), interval);
            tracing::info!(
                env = ?config.env,
                interval_minutes = config.check_interval_minutes,
                data_path = %config.data_path.display(),
                "dropwatch bot started"
            );

            let ctx = BotCtx {
                config,
                engine,
                telegram,
            };
            tokio::select! {
                result = poller::run(&ctx) => result,
                () = shutdown_signal() => {
                    tracing::info!("received shutdown signal, exiting");
                    Ok(())
                }
            }
        }
        Commands::Scan { user } => {
            let filter = user.map_or(UserFilter::All, UserFilter::single);
            let outcome = engine.run_cycle(&filter).await?;
            println!(
                "scanned {} alert(s): {} notification(s) sent, {} fetch failure(s)",
                outcome.scanned,
                outcome.notifications.len(),
                outcome.fetch_failures,
            );
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
