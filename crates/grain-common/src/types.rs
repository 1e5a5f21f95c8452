//! Shared types for the grain price tracker.
//!
//! Prices use `rust_decimal::Decimal` (currency units per bag), never f64.
//! Identifiers and creation timestamps are assigned by the data service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quality grade of a price entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum QualityGrade {
    #[default]
    A,
    B,
    C,
}

impl QualityGrade {
    /// All grades, in form-display order.
    pub const ALL: [QualityGrade; 3] = [QualityGrade::A, QualityGrade::B, QualityGrade::C];

    /// Returns the single-letter grade label.
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityGrade::A => "A",
            QualityGrade::B => "B",
            QualityGrade::C => "C",
        }
    }
}

impl std::fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QualityGrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(QualityGrade::A),
            "B" => Ok(QualityGrade::B),
            "C" => Ok(QualityGrade::C),
            other => Err(format!("Unknown quality grade: {}", other)),
        }
    }
}

/// A market where prices are recorded. Read-only for this application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub id: i64,
    pub name: String,
}

/// A traded commodity. Read-only for this application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commodity {
    pub id: i64,
    pub name: String,
}

/// Columns of a related row embedded by table name in a read query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedName {
    pub name: String,
}

/// A stored price entry as returned by the recent-entries read.
///
/// The embedded market and commodity columns are optional at the type
/// level: a row whose reference does not resolve still decodes, and the
/// display layer renders a fallback instead of failing the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntryRow {
    pub id: i64,
    pub market_id: i64,
    pub commodity_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quality_grade: QualityGrade,
    pub created_at: DateTime<Utc>,
    /// Embedded market columns, keyed by table name on the wire.
    #[serde(default)]
    pub markets: Option<EmbeddedName>,
    /// Embedded commodity columns, keyed by table name on the wire.
    #[serde(default)]
    pub commodities: Option<EmbeddedName>,
}

impl PriceEntryRow {
    /// The embedded market name, if the reference resolved.
    pub fn market_name(&self) -> Option<&str> {
        self.markets.as_ref().map(|m| m.name.as_str())
    }

    /// The embedded commodity name, if the reference resolved.
    pub fn commodity_name(&self) -> Option<&str> {
        self.commodities.as_ref().map(|c| c.name.as_str())
    }
}

/// Validated insert payload for a new price entry.
///
/// Identifiers are whole numbers and the price is a JSON number on the
/// wire; the service assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPriceEntry {
    pub market_id: i64,
    pub commodity_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quality_grade: QualityGrade,
}
