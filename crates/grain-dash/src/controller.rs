//! Dashboard controller: view state, draft lifecycle, load and submit.
//!
//! The controller owns the three cached lists (markets, commodities,
//! recent entries), the in-progress draft, and the last user-facing
//! notice. The data-service client is injected at construction behind the
//! `PriceStore` trait. Loading is an explicit join of the three reads;
//! teardown is signalled through a broadcast channel and checked before
//! late-arriving results are applied.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use grain_common::{Commodity, Market, NewPriceEntry, PriceEntryRow, QualityGrade};

use crate::store::PriceStore;

/// In-progress, unsaved form state.
///
/// Numeric fields stay text until submit-time validation; the grade always
/// holds a valid value because the form only offers the three grades.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Draft {
    pub market_id: String,
    pub commodity_id: String,
    pub price: String,
    pub quality_grade: QualityGrade,
}

/// Outcome message surfaced to the user after a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

/// Rejections produced before or during a submit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field} must be a whole number, got {value:?}")]
    InvalidId { field: &'static str, value: String },

    #[error("price must be a number, got {value:?}")]
    InvalidPrice { value: String },

    /// The service rejected or failed the insert; carries the service's
    /// error text verbatim.
    #[error("{0}")]
    Store(String),
}

/// Materialized view state for the dashboard page.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub markets: Vec<Market>,
    pub commodities: Vec<Commodity>,
    pub entries: Vec<PriceEntryRow>,
    pub draft: Draft,
    pub notice: Option<Notice>,
    /// True once a load has applied all three lists.
    pub loaded: bool,
}

/// Dashboard controller.
pub struct DashboardController {
    store: Arc<dyn PriceStore>,
    recent_limit: u32,
    state: RwLock<ViewState>,
    closed: AtomicBool,
    teardown: broadcast::Sender<()>,
}

impl DashboardController {
    /// Create a controller over an injected store.
    pub fn new(store: Arc<dyn PriceStore>, recent_limit: u32) -> Self {
        let (teardown, _) = broadcast::channel(1);

        Self {
            store,
            recent_limit,
            state: RwLock::new(ViewState::default()),
            closed: AtomicBool::new(false),
            teardown,
        }
    }

    /// Snapshot of the current view state.
    pub async fn state(&self) -> ViewState {
        self.state.read().await.clone()
    }

    /// Signal teardown: in-flight loads discard their results and later
    /// loads become no-ops.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let _ = self.teardown.send(());
    }

    /// True once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Run the three reads concurrently and apply them as one replacement.
    ///
    /// A failed read degrades to an empty list for its slot; the surface
    /// does not distinguish empty from failed, it is only logged here.
    pub async fn load(&self) {
        if self.is_closed() {
            debug!("Controller closed, skipping load");
            return;
        }

        let mut teardown = self.teardown.subscribe();
        let fetches = async {
            tokio::join!(
                self.store.markets(),
                self.store.commodities(),
                self.store.recent_entries(self.recent_limit),
            )
        };

        let (markets, commodities, entries) = tokio::select! {
            biased;
            _ = teardown.recv() => {
                debug!("Teardown during load, discarding results");
                return;
            }
            results = fetches => results,
        };

        if self.is_closed() {
            debug!("Teardown during load, discarding results");
            return;
        }

        let markets = markets.unwrap_or_else(|e| {
            warn!(error = %e, "Markets read failed, treating as empty");
            Vec::new()
        });
        let commodities = commodities.unwrap_or_else(|e| {
            warn!(error = %e, "Commodities read failed, treating as empty");
            Vec::new()
        });
        let entries = entries.unwrap_or_else(|e| {
            warn!(error = %e, "Price entries read failed, treating as empty");
            Vec::new()
        });

        debug!(
            markets = markets.len(),
            commodities = commodities.len(),
            entries = entries.len(),
            "Data load complete"
        );

        let mut state = self.state.write().await;
        state.markets = markets;
        state.commodities = commodities;
        state.entries = entries;
        state.loaded = true;
    }

    /// Validate and submit a draft.
    ///
    /// On success the notice records the outcome, the draft resets to
    /// defaults, and a reload runs. On any failure — validation or service
    /// — the draft is preserved verbatim for correction and resubmission.
    pub async fn submit(&self, draft: Draft) -> Result<(), SubmitError> {
        let entry = match validate_draft(&draft) {
            Ok(entry) => entry,
            Err(e) => {
                let mut state = self.state.write().await;
                state.draft = draft;
                state.notice = Some(Notice::Error(e.to_string()));
                return Err(e);
            }
        };

        match self.store.insert_entry(&entry).await {
            Ok(()) => {
                info!(
                    market_id = entry.market_id,
                    commodity_id = entry.commodity_id,
                    price = %entry.price,
                    grade = %entry.quality_grade,
                    "Price entry recorded"
                );

                {
                    let mut state = self.state.write().await;
                    state.draft = Draft::default();
                    state.notice = Some(Notice::Success("Price entry recorded".to_string()));
                }

                self.load().await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Price entry insert failed");
                let err = SubmitError::Store(e.to_string());

                let mut state = self.state.write().await;
                state.draft = draft;
                state.notice = Some(Notice::Error(err.to_string()));
                Err(err)
            }
        }
    }
}

/// Validate a draft into an insert payload.
///
/// Checks run in field order — required fields first, then id parsing,
/// then price parsing — so the rejection names the first offending field.
/// Nothing malformed ever reaches the service.
pub fn validate_draft(draft: &Draft) -> Result<NewPriceEntry, SubmitError> {
    let market = require(&draft.market_id, "market")?;
    let commodity = require(&draft.commodity_id, "commodity")?;
    let price_text = require(&draft.price, "price")?;

    let market_id = parse_id(market, "market")?;
    let commodity_id = parse_id(commodity, "commodity")?;
    let price: Decimal = price_text.parse().map_err(|_| SubmitError::InvalidPrice {
        value: price_text.to_string(),
    })?;

    Ok(NewPriceEntry {
        market_id,
        commodity_id,
        price,
        quality_grade: draft.quality_grade,
    })
}

fn require<'a>(value: &'a str, field: &'static str) -> Result<&'a str, SubmitError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SubmitError::MissingField { field });
    }
    Ok(trimmed)
}

fn parse_id(value: &str, field: &'static str) -> Result<i64, SubmitError> {
    value.parse().map_err(|_| SubmitError::InvalidId {
        field,
        value: value.to_string(),
    })
}
