//! Price store abstraction over the data service.
//!
//! The `PriceStore` trait is the seam between the dashboard controller and
//! the hosted data service: the controller receives an implementation as
//! an injected dependency at construction, and tests substitute a scripted
//! double.

use async_trait::async_trait;

use grain_common::{
    Commodity, Market, NewPriceEntry, Order, PriceEntryRow, RestStore, SelectQuery, StoreError,
};

/// Columns requested for the recent-entries read: every entry column plus
/// the referenced market and commodity names, embedded by table name.
const ENTRY_COLUMNS: &str = "*,markets(name),commodities(name)";

/// Read and insert operations the dashboard consumes.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// All markets, ordered by name ascending.
    async fn markets(&self) -> Result<Vec<Market>, StoreError>;

    /// All commodities, ordered by name ascending.
    async fn commodities(&self) -> Result<Vec<Commodity>, StoreError>;

    /// The most recent price entries, newest first, with embedded names.
    async fn recent_entries(&self, limit: u32) -> Result<Vec<PriceEntryRow>, StoreError>;

    /// Insert one price entry. The service assigns id and timestamp and
    /// enforces referential integrity.
    async fn insert_entry(&self, entry: &NewPriceEntry) -> Result<(), StoreError>;
}

fn markets_query() -> SelectQuery {
    SelectQuery::table("markets").order("name", Order::Asc)
}

fn commodities_query() -> SelectQuery {
    SelectQuery::table("commodities").order("name", Order::Asc)
}

fn entries_query(limit: u32) -> SelectQuery {
    SelectQuery::table("price_entries")
        .columns(ENTRY_COLUMNS)
        .order("created_at", Order::Desc)
        .limit(limit)
}

/// `PriceStore` backed by the hosted data service.
#[derive(Clone)]
pub struct GrainStore {
    rest: RestStore,
}

impl GrainStore {
    /// Wrap a data-service client.
    pub fn new(rest: RestStore) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl PriceStore for GrainStore {
    async fn markets(&self) -> Result<Vec<Market>, StoreError> {
        self.rest.fetch(&markets_query()).await
    }

    async fn commodities(&self) -> Result<Vec<Commodity>, StoreError> {
        self.rest.fetch(&commodities_query()).await
    }

    async fn recent_entries(&self, limit: u32) -> Result<Vec<PriceEntryRow>, StoreError> {
        self.rest.fetch(&entries_query(limit)).await
    }

    async fn insert_entry(&self, entry: &NewPriceEntry) -> Result<(), StoreError> {
        self.rest.insert("price_entries", std::slice::from_ref(entry)).await
    }
}
