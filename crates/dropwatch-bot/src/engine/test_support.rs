//! Shared fakes for engine and command-handler tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use dropwatch_core::{Alert, AlertBook, Notification, ProductSnapshot};
use dropwatch_scraper::ScrapeError;
use dropwatch_store::StoreError;
use dropwatch_telegram::TelegramError;

use super::{AlertStore, Notifier, ProductFetcher};

pub(crate) fn alert(id: &str, url: &str, current_price: i64, target_price: i64) -> Alert {
    Alert {
        id: id.to_string(),
        name: format!("Product {id}"),
        url: url.to_string(),
        current_price,
        target_price,
        added_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    }
}

/// Scripted fetcher: fixed snapshot per URL, or a scripted failure.
#[derive(Default)]
pub(crate) struct FakeFetcher {
    snapshots: HashMap<String, ProductSnapshot>,
    failures: HashSet<String>,
    delay: Duration,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, url: &str, name: &str, price: i64) -> Self {
        self.snapshots.insert(
            url.to_string(),
            ProductSnapshot {
                name: name.to_string(),
                price,
                url: url.to_string(),
                image: None,
            },
        );
        self
    }

    pub fn with_failure(mut self, url: &str) -> Self {
        self.failures.insert(url.to_string());
        self
    }

    /// Adds latency per fetch, widening race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl ProductFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<ProductSnapshot, ScrapeError> {
        self.fetched.lock().unwrap().push(url.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failures.contains(url) {
            return Err(ScrapeError::MissingPrice {
                url: url.to_string(),
            });
        }
        self.snapshots
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::NotFound {
                url: url.to_string(),
            })
    }
}

/// In-memory store that counts saves and detects overlapping save calls.
#[derive(Default)]
pub(crate) struct FakeStore {
    book: Mutex<AlertBook>,
    fail_save: bool,
    saving: AtomicBool,
    pub save_calls: AtomicUsize,
    pub overlapping_saves: AtomicBool,
}

impl FakeStore {
    pub fn with_book(book: AlertBook) -> Self {
        Self {
            book: Mutex::new(book),
            ..Self::default()
        }
    }

    pub fn failing_saves(book: AlertBook) -> Self {
        Self {
            book: Mutex::new(book),
            fail_save: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> AlertBook {
        self.book.lock().unwrap().clone()
    }
}

impl AlertStore for FakeStore {
    async fn load_all(&self) -> Result<AlertBook, StoreError> {
        Ok(self.book.lock().unwrap().clone())
    }

    async fn save_all(&self, book: &AlertBook) -> Result<(), StoreError> {
        if self.saving.swap(true, Ordering::SeqCst) {
            self.overlapping_saves.store(true, Ordering::SeqCst);
        }
        // Hold the "saving" window open across an await so overlapping
        // cycles would be caught.
        tokio::time::sleep(Duration::from_millis(5)).await;
        let result = if self.fail_save {
            Err(StoreError::Write {
                path: "fake".to_string(),
                source: std::io::Error::other("injected save failure"),
            })
        } else {
            *self.book.lock().unwrap() = book.clone();
            self.save_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        };
        self.saving.store(false, Ordering::SeqCst);
        result
    }
}

/// Records delivery attempts; can refuse delivery for chosen users.
#[derive(Default)]
pub(crate) struct FakeNotifier {
    fail_users: HashSet<String>,
    pub attempts: AtomicUsize,
    pub sent: Mutex<Vec<(String, Vec<Notification>)>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, user_id: &str) -> Self {
        self.fail_users.insert(user_id.to_string());
        self
    }
}

impl Notifier for FakeNotifier {
    async fn notify(&self, user_id: &str, events: &[Notification]) -> Result<(), TelegramError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_users.contains(user_id) {
            return Err(TelegramError::Api("delivery refused".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((user_id.to_string(), events.to_vec()));
        Ok(())
    }
}
