//! Shared types and utilities for the grain price tracker.
//!
//! This crate contains:
//! - Domain types (Market, Commodity, QualityGrade, price entry rows)
//! - The generic tabular data-service client (`RestStore`)

pub mod store;
pub mod types;

pub use store::{Order, RestStore, SelectQuery, StoreConfig, StoreError};
pub use types::*;
