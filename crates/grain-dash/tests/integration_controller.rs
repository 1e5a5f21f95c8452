//! Integration tests for the dashboard controller against a scripted store.
//!
//! These tests verify the end-to-end flow of:
//! - The three-way data load and its degrade-to-empty behavior
//! - Draft validation, submission, and reset/preserve lifecycle
//! - Teardown discarding late results
//! - Page rendering over loaded state

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;

use grain_common::{
    Commodity, EmbeddedName, Market, NewPriceEntry, PriceEntryRow, QualityGrade, StoreError,
};
use grain_dash::controller::{DashboardController, Draft, Notice, SubmitError};
use grain_dash::page;
use grain_dash::store::PriceStore;

/// Scripted store double.
struct MockStore {
    markets: Vec<Market>,
    commodities: Vec<Commodity>,
    entries: Vec<PriceEntryRow>,
    fail_reads: bool,
    insert_error: Option<String>,
    inserted: Mutex<Vec<NewPriceEntry>>,
    entry_reads: AtomicUsize,
}

impl MockStore {
    fn new() -> Self {
        Self {
            markets: Vec::new(),
            commodities: Vec::new(),
            entries: Vec::new(),
            fail_reads: false,
            insert_error: None,
            inserted: Mutex::new(Vec::new()),
            entry_reads: AtomicUsize::new(0),
        }
    }

    fn seeded() -> Self {
        let mut store = Self::new();
        store.markets = vec![
            Market { id: 1, name: "Bodija".to_string() },
            Market { id: 3, name: "Kano Central".to_string() },
            Market { id: 2, name: "Mile 12".to_string() },
        ];
        store.commodities = vec![
            Commodity { id: 7, name: "Maize".to_string() },
            Commodity { id: 4, name: "Rice".to_string() },
            Commodity { id: 9, name: "Sorghum".to_string() },
        ];
        store.entries = vec![entry(12, Some("Kano Central"), Some("Maize"), 0)];
        store
    }

    fn with_entries(mut self, entries: Vec<PriceEntryRow>) -> Self {
        self.entries = entries;
        self
    }

    fn with_failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    fn with_insert_error(mut self, message: &str) -> Self {
        self.insert_error = Some(message.to_string());
        self
    }

    fn inserted(&self) -> Vec<NewPriceEntry> {
        self.inserted.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceStore for MockStore {
    async fn markets(&self) -> Result<Vec<Market>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Api { status: 500, body: "boom".to_string() });
        }
        let mut markets = self.markets.clone();
        markets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(markets)
    }

    async fn commodities(&self) -> Result<Vec<Commodity>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Api { status: 500, body: "boom".to_string() });
        }
        let mut commodities = self.commodities.clone();
        commodities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(commodities)
    }

    async fn recent_entries(&self, limit: u32) -> Result<Vec<PriceEntryRow>, StoreError> {
        self.entry_reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads {
            return Err(StoreError::Api { status: 500, body: "boom".to_string() });
        }
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(limit as usize);
        Ok(entries)
    }

    async fn insert_entry(&self, entry: &NewPriceEntry) -> Result<(), StoreError> {
        if let Some(message) = &self.insert_error {
            return Err(StoreError::Api { status: 409, body: message.clone() });
        }
        self.inserted.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

fn entry(id: i64, market: Option<&str>, commodity: Option<&str>, minutes_ago: i64) -> PriceEntryRow {
    PriceEntryRow {
        id,
        market_id: 3,
        commodity_id: 7,
        price: dec!(2500.50),
        quality_grade: QualityGrade::B,
        created_at: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap() - Duration::minutes(minutes_ago),
        markets: market.map(|name| EmbeddedName { name: name.to_string() }),
        commodities: commodity.map(|name| EmbeddedName { name: name.to_string() }),
    }
}

fn draft(market: &str, commodity: &str, price: &str, grade: QualityGrade) -> Draft {
    Draft {
        market_id: market.to_string(),
        commodity_id: commodity.to_string(),
        price: price.to_string(),
        quality_grade: grade,
    }
}

fn controller(store: Arc<MockStore>) -> DashboardController {
    DashboardController::new(store, 50)
}

#[tokio::test]
async fn load_populates_sorted_lists() {
    let store = Arc::new(MockStore::seeded());
    let controller = controller(store);

    controller.load().await;
    let state = controller.state().await;

    assert!(state.loaded);
    let market_names: Vec<&str> = state.markets.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(market_names, vec!["Bodija", "Kano Central", "Mile 12"]);
    let commodity_names: Vec<&str> = state.commodities.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(commodity_names, vec!["Maize", "Rice", "Sorghum"]);
    assert_eq!(state.entries.len(), 1);
}

#[tokio::test]
async fn load_caps_entries_and_orders_newest_first() {
    let entries: Vec<PriceEntryRow> = (0..60)
        .map(|i| entry(i, Some("Bodija"), Some("Maize"), i))
        .collect();
    let store = Arc::new(MockStore::seeded().with_entries(entries));
    let controller = controller(store);

    controller.load().await;
    let state = controller.state().await;

    assert_eq!(state.entries.len(), 50);
    for pair in state.entries.windows(2) {
        assert!(pair[0].created_at >= pair[1].created_at);
    }
}

#[tokio::test]
async fn failed_reads_degrade_to_empty_lists() {
    let store = Arc::new(MockStore::seeded().with_failing_reads());
    let controller = controller(store);

    controller.load().await;
    let state = controller.state().await;

    // Empty and failed are indistinguishable on the surface.
    assert!(state.loaded);
    assert!(state.markets.is_empty());
    assert!(state.commodities.is_empty());
    assert!(state.entries.is_empty());
}

#[tokio::test]
async fn submit_inserts_parsed_payload() {
    let store = Arc::new(MockStore::seeded());
    let controller = controller(store.clone());

    controller
        .submit(draft("3", "7", "2500.50", QualityGrade::B))
        .await
        .unwrap();

    let inserted = store.inserted();
    assert_eq!(inserted.len(), 1);
    assert_eq!(
        inserted[0],
        NewPriceEntry {
            market_id: 3,
            commodity_id: 7,
            price: dec!(2500.5),
            quality_grade: QualityGrade::B,
        }
    );
}

#[tokio::test]
async fn successful_submit_resets_draft_and_reloads() {
    let store = Arc::new(MockStore::seeded());
    let controller = controller(store.clone());

    controller.load().await;
    assert_eq!(store.entry_reads.load(Ordering::SeqCst), 1);

    controller
        .submit(draft("3", "7", "1200", QualityGrade::C))
        .await
        .unwrap();

    let state = controller.state().await;
    assert_eq!(state.draft, Draft::default());
    assert_eq!(state.draft.quality_grade, QualityGrade::A);
    assert_eq!(
        state.notice,
        Some(Notice::Success("Price entry recorded".to_string()))
    );
    // The submit re-ran the load.
    assert_eq!(store.entry_reads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_submit_preserves_draft_and_surfaces_error() {
    let store = Arc::new(MockStore::seeded().with_insert_error("duplicate entry"));
    let controller = controller(store.clone());

    let attempted = draft("3", "7", "2500.50", QualityGrade::B);
    let err = controller.submit(attempted.clone()).await.unwrap_err();

    assert!(matches!(err, SubmitError::Store(_)));
    assert!(err.to_string().contains("duplicate entry"));

    let state = controller.state().await;
    assert_eq!(state.draft, attempted);
    match state.notice {
        Some(Notice::Error(text)) => assert!(text.contains("duplicate entry")),
        other => panic!("expected error notice, got {:?}", other),
    }
    // Nothing was recorded.
    assert!(store.inserted().is_empty());
}

#[tokio::test]
async fn missing_market_never_reaches_service() {
    let store = Arc::new(MockStore::seeded());
    let controller = controller(store.clone());

    let err = controller
        .submit(draft("", "7", "100", QualityGrade::A))
        .await
        .unwrap_err();

    assert_eq!(err, SubmitError::MissingField { field: "market" });
    assert!(store.inserted().is_empty());
}

#[tokio::test]
async fn malformed_price_never_reaches_service() {
    let store = Arc::new(MockStore::seeded());
    let controller = controller(store.clone());

    let attempted = draft("3", "7", "2,500", QualityGrade::A);
    let err = controller.submit(attempted.clone()).await.unwrap_err();

    assert!(matches!(err, SubmitError::InvalidPrice { .. }));
    assert!(store.inserted().is_empty());
    // The rejected draft stays put for correction.
    assert_eq!(controller.state().await.draft, attempted);
}

#[tokio::test]
async fn closed_controller_discards_load() {
    let store = Arc::new(MockStore::seeded());
    let controller = controller(store);

    controller.close();
    controller.load().await;

    let state = controller.state().await;
    assert!(!state.loaded);
    assert!(state.markets.is_empty());
}

#[tokio::test]
async fn missing_embed_renders_fallback_without_losing_list() {
    let entries = vec![
        entry(1, Some("Bodija"), Some("Rice"), 0),
        entry(2, None, None, 1),
        entry(3, Some("Mile 12"), Some("Sorghum"), 2),
    ];
    let store = Arc::new(MockStore::seeded().with_entries(entries));
    let controller = controller(store);

    controller.load().await;
    let html = page::render_page(&controller.state().await);

    assert!(html.contains("Bodija"));
    assert!(html.contains("Mile 12"));
    assert!(html.contains("(unknown)"));
}
