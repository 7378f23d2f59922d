use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use dropwatch_core::AlertBook;

use super::test_support::{alert, FakeFetcher, FakeNotifier, FakeStore};
use super::*;

const URL_A: &str = "https://www.flipkart.com/a/p/itm?pid=AAA";
const URL_B: &str = "https://www.flipkart.com/b/p/itm?pid=BBB";

fn book_with(user_id: &str, alerts: Vec<dropwatch_core::Alert>) -> AlertBook {
    AlertBook::from([(user_id.to_string(), alerts)])
}

fn engine(
    fetcher: FakeFetcher,
    store: &Arc<FakeStore>,
    notifier: &Arc<FakeNotifier>,
) -> MonitorEngine<FakeFetcher, Arc<FakeStore>, Arc<FakeNotifier>> {
    MonitorEngine::new(fetcher, Arc::clone(store), Arc::clone(notifier), 4)
}

#[test]
fn crossing_rule_truth_table() {
    // Fires only on the transition from above target to at-or-below.
    assert!(crossed(1200, 950, 1000));
    assert!(!crossed(900, 850, 1000), "already below: no edge");
    assert!(!crossed(1000, 1000, 1000), "old price not strictly above");
    assert!(!crossed(1200, 1200, 1000), "still above target");
    assert!(crossed(1001, 1000, 1000), "landing exactly on target fires");
}

#[tokio::test]
async fn crossing_produces_notification_with_prices() {
    let store = Arc::new(FakeStore::with_book(book_with(
        "1001",
        vec![alert("AAA", URL_A, 1200, 1000)],
    )));
    let notifier = Arc::new(FakeNotifier::new());
    let fetcher = FakeFetcher::new().with_price(URL_A, "Product AAA", 950);

    let outcome = engine(fetcher, &store, &notifier)
        .run_cycle(&UserFilter::All)
        .await
        .unwrap();

    assert_eq!(outcome.scanned, 1);
    assert_eq!(outcome.notifications.len(), 1);
    let n = &outcome.notifications[0];
    assert_eq!(n.user_id, "1001");
    assert_eq!(n.alert_name, "Product AAA");
    assert_eq!(n.old_price, 1200);
    assert_eq!(n.new_price, 950);
    assert_eq!(n.target_price, 1000);
    assert_eq!(n.url, URL_A);

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "1001");
}

#[tokio::test]
async fn already_below_target_stays_silent() {
    let store = Arc::new(FakeStore::with_book(book_with(
        "1001",
        vec![alert("AAA", URL_A, 900, 1000)],
    )));
    let notifier = Arc::new(FakeNotifier::new());
    let fetcher = FakeFetcher::new().with_price(URL_A, "Product AAA", 850);

    let outcome = engine(fetcher, &store, &notifier)
        .run_cycle(&UserFilter::All)
        .await
        .unwrap();

    assert!(outcome.notifications.is_empty());
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 0);
    // No crossing anywhere — the cycle must not write either.
    assert_eq!(store.save_calls.load(Ordering::SeqCst), 0);
    // The in-memory outcome still carries the fresh price.
    assert_eq!(outcome.alerts["1001"][0].current_price, 850);
}

#[tokio::test]
async fn fetch_failure_leaves_alert_unchanged_and_isolates_others() {
    let store = Arc::new(FakeStore::with_book(book_with(
        "1001",
        vec![alert("AAA", URL_A, 1200, 1000), alert("BBB", URL_B, 700, 600)],
    )));
    let notifier = Arc::new(FakeNotifier::new());
    let fetcher = FakeFetcher::new()
        .with_failure(URL_A)
        .with_price(URL_B, "Product BBB", 550);

    let outcome = engine(fetcher, &store, &notifier)
        .run_cycle(&UserFilter::All)
        .await
        .unwrap();

    assert_eq!(outcome.fetch_failures, 1);
    // B still crossed and was delivered.
    assert_eq!(outcome.notifications.len(), 1);
    assert_eq!(outcome.notifications[0].alert_name, "Product BBB");
    // A kept its pre-cycle state, in memory and in the saved book.
    assert_eq!(outcome.alerts["1001"][0].current_price, 1200);
    assert_eq!(outcome.alerts["1001"][0].name, "Product AAA");
    assert_eq!(store.saved()["1001"][0].current_price, 1200);
    assert_eq!(store.saved()["1001"][1].current_price, 550);
}

#[tokio::test]
async fn save_failure_means_zero_delivery_attempts() {
    let store = Arc::new(FakeStore::failing_saves(book_with(
        "1001",
        vec![alert("AAA", URL_A, 1200, 1000)],
    )));
    let notifier = Arc::new(FakeNotifier::new());
    let fetcher = FakeFetcher::new().with_price(URL_A, "Product AAA", 950);

    let result = engine(fetcher, &store, &notifier)
        .run_cycle(&UserFilter::All)
        .await;

    assert!(matches!(result, Err(EngineError::Store(_))), "got: {result:?}");
    assert_eq!(
        notifier.attempts.load(Ordering::SeqCst),
        0,
        "persist-before-notify: no dispatch may happen after a failed save"
    );
}

#[tokio::test]
async fn exactly_one_save_per_cycle_with_many_crossings() {
    let mut book = book_with(
        "1001",
        vec![alert("AAA", URL_A, 1200, 1000), alert("BBB", URL_B, 700, 600)],
    );
    let url_c = "https://www.flipkart.com/c/p/itm?pid=CCC";
    book.insert("2002".to_string(), vec![alert("CCC", url_c, 5000, 4500)]);

    let store = Arc::new(FakeStore::with_book(book));
    let notifier = Arc::new(FakeNotifier::new());
    let fetcher = FakeFetcher::new()
        .with_price(URL_A, "Product AAA", 950)
        .with_price(URL_B, "Product BBB", 550)
        .with_price(url_c, "Product CCC", 4500);

    let outcome = engine(fetcher, &store, &notifier)
        .run_cycle(&UserFilter::All)
        .await
        .unwrap();

    assert_eq!(outcome.notifications.len(), 3);
    assert_eq!(store.save_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn one_message_per_user_aggregates_all_crossings() {
    let mut book = book_with(
        "1001",
        vec![alert("AAA", URL_A, 1200, 1000), alert("BBB", URL_B, 700, 600)],
    );
    let url_c = "https://www.flipkart.com/c/p/itm?pid=CCC";
    book.insert("2002".to_string(), vec![alert("CCC", url_c, 5000, 4500)]);

    let store = Arc::new(FakeStore::with_book(book));
    let notifier = Arc::new(FakeNotifier::new());
    let fetcher = FakeFetcher::new()
        .with_price(URL_A, "Product AAA", 950)
        .with_price(URL_B, "Product BBB", 550)
        .with_price(url_c, "Product CCC", 4400);

    engine(fetcher, &store, &notifier)
        .run_cycle(&UserFilter::All)
        .await
        .unwrap();

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 2, "one outbound message per user");
    assert_eq!(sent[0].0, "1001");
    assert_eq!(sent[0].1.len(), 2);
    assert_eq!(sent[1].0, "2002");
    assert_eq!(sent[1].1.len(), 1);
}

#[tokio::test]
async fn delivery_failure_for_one_user_does_not_block_others() {
    let mut book = book_with("1001", vec![alert("AAA", URL_A, 1200, 1000)]);
    book.insert("2002".to_string(), vec![alert("BBB", URL_B, 700, 600)]);

    let store = Arc::new(FakeStore::with_book(book));
    let notifier = Arc::new(FakeNotifier::new().failing_for("1001"));
    let fetcher = FakeFetcher::new()
        .with_price(URL_A, "Product AAA", 950)
        .with_price(URL_B, "Product BBB", 550);

    let outcome = engine(fetcher, &store, &notifier)
        .run_cycle(&UserFilter::All)
        .await
        .unwrap();

    // Both deliveries were attempted; the second landed despite the first
    // failing, and the cycle still succeeded.
    assert_eq!(outcome.notifications.len(), 2);
    assert_eq!(notifier.attempts.load(Ordering::SeqCst), 2);
    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "2002");
}

#[tokio::test]
async fn filter_scans_only_selected_users_but_saves_whole_book() {
    let mut book = book_with("1001", vec![alert("AAA", URL_A, 1200, 1000)]);
    book.insert("2002".to_string(), vec![alert("BBB", URL_B, 700, 600)]);

    let store = Arc::new(FakeStore::with_book(book));
    let notifier = Arc::new(FakeNotifier::new());
    let fetcher = FakeFetcher::new()
        .with_price(URL_A, "Product AAA", 950)
        .with_price(URL_B, "Product BBB", 550);

    let outcome = engine(fetcher, &store, &notifier)
        .run_cycle(&UserFilter::single("1001"))
        .await
        .unwrap();

    assert_eq!(outcome.scanned, 1);
    assert_eq!(outcome.notifications.len(), 1);
    // The unscanned user's alert was never fetched...
    let saved = store.saved();
    assert_eq!(saved["2002"][0].current_price, 700);
    // ...but the user and their alerts are still present in the saved book.
    assert!(saved.contains_key("2002"));
    assert_eq!(outcome.alerts.len(), 2);
}

#[tokio::test]
async fn successful_fetch_updates_name_unconditionally() {
    let store = Arc::new(FakeStore::with_book(book_with(
        "1001",
        vec![alert("AAA", URL_A, 1200, 1000)],
    )));
    let notifier = Arc::new(FakeNotifier::new());
    // Price stays above target: no crossing, but the rename is applied.
    let fetcher = FakeFetcher::new().with_price(URL_A, "Renamed Product", 1100);

    let outcome = engine(fetcher, &store, &notifier)
        .run_cycle(&UserFilter::All)
        .await
        .unwrap();

    assert!(outcome.notifications.is_empty());
    assert_eq!(outcome.alerts["1001"][0].name, "Renamed Product");
    assert_eq!(outcome.alerts["1001"][0].current_price, 1100);
}

#[tokio::test]
async fn concurrent_cycles_are_serialized() {
    let mut book = book_with("1001", vec![alert("AAA", URL_A, 1200, 1000)]);
    book.insert("2002".to_string(), vec![alert("BBB", URL_B, 700, 600)]);

    let store = Arc::new(FakeStore::with_book(book));
    let notifier = Arc::new(FakeNotifier::new());
    let fetcher = FakeFetcher::new()
        .with_price(URL_A, "Product AAA", 950)
        .with_price(URL_B, "Product BBB", 550)
        .with_delay(Duration::from_millis(10));

    let engine = engine(fetcher, &store, &notifier);
    let filter_1001 = UserFilter::single("1001");
    let filter_2002 = UserFilter::single("2002");
    let (first, second) = tokio::join!(
        engine.run_cycle(&filter_1001),
        engine.run_cycle(&filter_2002),
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(store.save_calls.load(Ordering::SeqCst), 2);
    assert!(
        !store.overlapping_saves.load(Ordering::SeqCst),
        "cycles must never overlap on save_all"
    );
}
