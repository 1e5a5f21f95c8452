//! Grain price tracker dashboard.
//!
//! An administrative dashboard for recording and reviewing commodity
//! market prices. Persistence, querying, and referential integrity live in
//! an external hosted data service; this crate provides configuration, the
//! `PriceStore` seam over that service, the dashboard controller (load and
//! submit workflow, draft lifecycle), and the HTTP surface.

pub mod config;
pub mod controller;
pub mod page;
pub mod server;
pub mod store;

pub use config::DashConfig;
pub use controller::{DashboardController, Draft, Notice, SubmitError, ViewState};
pub use server::{spawn_server, ServerConfig};
pub use store::{GrainStore, PriceStore};
