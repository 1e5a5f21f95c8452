//! HTTP surface for the dashboard.
//!
//! Serves the page plus a small JSON API over the controller's cached
//! view state:
//! - `GET /` - the dashboard page
//! - `POST /submit` - form submission (post/redirect/get)
//! - `GET /api/markets` - cached markets list
//! - `GET /api/commodities` - cached commodities list
//! - `GET /api/entries` - cached recent price entries
//! - `GET /api/health` - liveness probe

use std::sync::Arc;

use axum::extract::{Form, State};
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use grain_common::{Commodity, Market, PriceEntryRow, QualityGrade};

use crate::controller::{DashboardController, Draft};
use crate::page;

/// Configuration for the dashboard HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,

    /// Enable CORS for the JSON endpoints.
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            enable_cors: true,
        }
    }
}

/// Form fields posted by the dashboard page.
///
/// Fields default to empty so a submission bypassing the browser's
/// required-field enforcement still reaches controller validation rather
/// than failing to decode.
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub market_id: String,
    #[serde(default)]
    pub commodity_id: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub quality_grade: QualityGrade,
}

impl From<SubmitForm> for Draft {
    fn from(form: SubmitForm) -> Self {
        Self {
            market_id: form.market_id,
            commodity_id: form.commodity_id,
            price: form.price,
            quality_grade: form.quality_grade,
        }
    }
}

async fn show_page(State(controller): State<Arc<DashboardController>>) -> Html<String> {
    let state = controller.state().await;
    Html(page::render_page(&state))
}

async fn submit_entry(
    State(controller): State<Arc<DashboardController>>,
    Form(form): Form<SubmitForm>,
) -> Redirect {
    // The outcome (success notice, or preserved draft plus error notice)
    // is recorded on the controller and rendered on the redirect target.
    let _ = controller.submit(form.into()).await;
    Redirect::to("/")
}

async fn list_markets(State(controller): State<Arc<DashboardController>>) -> Json<Vec<Market>> {
    Json(controller.state().await.markets)
}

async fn list_commodities(
    State(controller): State<Arc<DashboardController>>,
) -> Json<Vec<Commodity>> {
    Json(controller.state().await.commodities)
}

async fn list_entries(
    State(controller): State<Arc<DashboardController>>,
) -> Json<Vec<PriceEntryRow>> {
    Json(controller.state().await.entries)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Create the router with all endpoints.
pub fn create_router(controller: Arc<DashboardController>) -> Router {
    Router::new()
        .route("/", get(show_page))
        .route("/submit", post(submit_entry))
        .route("/api/health", get(health_check))
        .route("/api/markets", get(list_markets))
        .route("/api/commodities", get(list_commodities))
        .route("/api/entries", get(list_entries))
        .with_state(controller)
}

/// Run the dashboard server.
pub async fn run_server(
    config: ServerConfig,
    controller: Arc<DashboardController>,
) -> anyhow::Result<()> {
    let app = create_router(controller);

    let app = if config.enable_cors {
        use tower_http::cors::{Any, CorsLayer};
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app.layer(cors)
    } else {
        app
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(port = config.port, "Dashboard server started");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Spawn the dashboard server as a background task.
pub fn spawn_server(
    config: ServerConfig,
    controller: Arc<DashboardController>,
) -> tokio::task::JoinHandle<anyhow::Result<()>> {
    tokio::spawn(async move { run_server(config, controller).await })
}
