//! The price-monitoring engine: one scan cycle over tracked alerts.
//!
//! A cycle loads the whole alert collection, re-fetches every tracked
//! product for the selected users, applies the crossing rule, persists the
//! mutated collection in a single save, and only then requests delivery of
//! the detected crossings. Cycles are serialized by an internal lock, so a
//! manual check issued while a scheduled cycle is running queues behind it.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use dropwatch_core::{AlertBook, Notification, ProductSnapshot, UserId};
use dropwatch_scraper::{FlipkartClient, ScrapeError};
use dropwatch_store::{JsonAlertStore, StoreError};
use dropwatch_telegram::TelegramError;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tokio::sync::Mutex;

/// Fetches a point-in-time product snapshot. Failures are per-alert events
/// inside a cycle, never cycle aborts.
pub trait ProductFetcher {
    async fn fetch(&self, url: &str) -> Result<ProductSnapshot, ScrapeError>;
}

/// Whole-collection persistence. There is deliberately no per-alert API:
/// a cycle replaces the full book at most once.
pub trait AlertStore {
    async fn load_all(&self) -> Result<AlertBook, StoreError>;
    async fn save_all(&self, book: &AlertBook) -> Result<(), StoreError>;
}

/// Delivers one user's crossings for a cycle as a single outbound message.
/// Best-effort: the engine logs failures and moves on.
pub trait Notifier {
    async fn notify(&self, user_id: &str, events: &[Notification]) -> Result<(), TelegramError>;
}

impl ProductFetcher for FlipkartClient {
    async fn fetch(&self, url: &str) -> Result<ProductSnapshot, ScrapeError> {
        self.fetch_product(url).await
    }
}

impl AlertStore for JsonAlertStore {
    async fn load_all(&self) -> Result<AlertBook, StoreError> {
        JsonAlertStore::load_all(self).await
    }

    async fn save_all(&self, book: &AlertBook) -> Result<(), StoreError> {
        JsonAlertStore::save_all(self, book).await
    }
}

impl<T: ProductFetcher + Sync> ProductFetcher for Arc<T> {
    async fn fetch(&self, url: &str) -> Result<ProductSnapshot, ScrapeError> {
        (**self).fetch(url).await
    }
}

impl<T: AlertStore + Sync> AlertStore for Arc<T> {
    async fn load_all(&self) -> Result<AlertBook, StoreError> {
        (**self).load_all().await
    }

    async fn save_all(&self, book: &AlertBook) -> Result<(), StoreError> {
        (**self).save_all(book).await
    }
}

impl<T: Notifier + Sync> Notifier for Arc<T> {
    async fn notify(&self, user_id: &str, events: &[Notification]) -> Result<(), TelegramError> {
        (**self).notify(user_id, events).await
    }
}

/// Which users a cycle scans. The filter restricts scanning only; the whole
/// collection is always loaded and, when a save happens, saved.
#[derive(Debug, Clone)]
pub enum UserFilter {
    All,
    Users(BTreeSet<UserId>),
}

impl UserFilter {
    /// Filter for a single user's manual check.
    #[must_use]
    pub fn single(user_id: impl Into<UserId>) -> Self {
        Self::Users(BTreeSet::from([user_id.into()]))
    }

    fn includes(&self, user_id: &str) -> bool {
        match self {
            Self::All => true,
            Self::Users(users) => users.contains(user_id),
        }
    }
}

/// What one cycle did, returned for callers and tests. The persisted store
/// remains the source of truth for the next cycle.
#[derive(Debug)]
pub struct CycleOutcome {
    /// The updated in-memory collection, including users outside the filter.
    pub alerts: AlertBook,
    /// Crossings detected this cycle, in stored order, delivery attempted.
    pub notifications: Vec<Notification>,
    /// Number of alerts whose product page was fetched.
    pub scanned: usize,
    /// Fetches that failed and left their alert untouched.
    pub fetch_failures: usize,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("alert store failure: {0}")]
    Store(#[from] StoreError),
}

/// `true` iff the price moved from above target to at-or-below target.
///
/// This is a strict one-way edge trigger: an alert whose price is already
/// at-or-below target stays silent until the price rises above target and
/// drops again. Intentional, load-bearing behavior — do not widen it.
#[must_use]
pub fn crossed(old_price: i64, new_price: i64, target_price: i64) -> bool {
    new_price <= target_price && old_price > target_price
}

pub struct MonitorEngine<F, S, N> {
    fetcher: F,
    store: S,
    notifier: N,
    max_concurrent_fetches: usize,
    /// Serializes cycles: timer, manual checks, and one-shot scans all queue
    /// here, so two cycles can never race on `save_all`.
    cycle_lock: Mutex<()>,
}

impl<F, S, N> MonitorEngine<F, S, N>
where
    F: ProductFetcher,
    S: AlertStore,
    N: Notifier,
{
    pub fn new(fetcher: F, store: S, notifier: N, max_concurrent_fetches: usize) -> Self {
        Self {
            fetcher,
            store,
            notifier,
            max_concurrent_fetches: max_concurrent_fetches.max(1),
            cycle_lock: Mutex::new(()),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one scan cycle for the users selected by `filter`.
    ///
    /// Fetches fan out over a bounded worker pool and are joined before any
    /// mutation is persisted. A failed fetch leaves its alert untouched and
    /// never aborts the cycle. If at least one crossing was detected, the
    /// entire mutated collection is saved exactly once, and only after that
    /// save succeeds are notifications delivered (one aggregated message per
    /// user). A cycle with no crossings writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] if the collection cannot be loaded, or
    /// if the post-cycle save fails — in which case no notification delivery
    /// was attempted, and the next cycle will re-detect any crossing that is
    /// still in effect.
    pub async fn run_cycle(&self, filter: &UserFilter) -> Result<CycleOutcome, EngineError> {
        let _cycle = self.cycle_lock.lock().await;

        let mut book = self.store.load_all().await?;

        let jobs: Vec<(UserId, usize, String)> = book
            .iter()
            .filter(|(user_id, _)| filter.includes(user_id))
            .flat_map(|(user_id, alerts)| {
                alerts
                    .iter()
                    .enumerate()
                    .map(move |(idx, alert)| (user_id.clone(), idx, alert.url.clone()))
            })
            .collect();
        let scanned = jobs.len();

        // Join point: every fetch completes before any state is applied, so
        // a partial cycle can never reach the store.
        let mut results: HashMap<(UserId, usize), Result<ProductSnapshot, ScrapeError>> =
            stream::iter(jobs)
                .map(|(user_id, idx, url)| async move {
                    let result = self.fetcher.fetch(&url).await;
                    ((user_id, idx), result)
                })
                .buffer_unordered(self.max_concurrent_fetches)
                .collect()
                .await;

        let mut notifications = Vec::new();
        let mut fetch_failures = 0usize;

        for (user_id, alerts) in &mut book {
            if !filter.includes(user_id) {
                continue;
            }
            for (idx, alert) in alerts.iter_mut().enumerate() {
                match results.remove(&(user_id.clone(), idx)) {
                    Some(Ok(snapshot)) => {
                        let old_price = alert.current_price;
                        let new_price = snapshot.price;
                        alert.current_price = new_price;
                        alert.name = snapshot.name;

                        if crossed(old_price, new_price, alert.target_price) {
                            notifications.push(Notification {
                                user_id: user_id.clone(),
                                alert_name: alert.name.clone(),
                                old_price,
                                new_price,
                                target_price: alert.target_price,
                                url: alert.url.clone(),
                            });
                        }
                    }
                    Some(Err(e)) => {
                        fetch_failures += 1;
                        tracing::warn!(
                            user_id = %user_id,
                            url = %alert.url,
                            error = %e,
                            "fetch failed — alert left unchanged"
                        );
                    }
                    None => {}
                }
            }
        }

        if notifications.is_empty() {
            return Ok(CycleOutcome {
                alerts: book,
                notifications,
                scanned,
                fetch_failures,
            });
        }

        // Persist before notify: an undelivered crossing is re-detected next
        // cycle, a delivered-but-unsaved one would repeat forever.
        self.store.save_all(&book).await?;

        // Notifications were pushed user-by-user in book order, so one
        // user's crossings are always contiguous.
        for events in notifications.chunk_by(|a, b| a.user_id == b.user_id) {
            let user_id = &events[0].user_id;
            if let Err(e) = self.notifier.notify(user_id, events).await {
                tracing::error!(
                    user_id = %user_id,
                    error = %e,
                    "failed to deliver price alert"
                );
            }
        }

        Ok(CycleOutcome {
            alerts: book,
            notifications,
            scanned,
            fetch_failures,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
