//! Client for the hosted tabular data service.
//!
//! Speaks the service's REST dialect: reads are GET requests against
//! `/rest/v1/{table}` with `select`/`order`/`limit` query parameters, and
//! related rows are embedded by naming their table inside the column list
//! (e.g. `*,markets(name)`). Writes are POST requests with a JSON array
//! body. Every request carries the configured access key.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during data-service operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service error: status {status}, body: {body}")]
    Api { status: u16, body: String },

    #[error("response decode failed: {0}")]
    Decode(String),

    #[error("invalid store configuration: {0}")]
    Config(String),
}

/// Connection parameters for the data service.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Service base URL (e.g. "http://localhost:54321").
    pub url: String,
    /// Access key sent with every request.
    pub key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            key: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Sort direction for a select query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn suffix(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// Builder for a read query against one table.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: String,
    columns: String,
    filters: Vec<(String, String, String)>,
    order: Vec<(String, Order)>,
    limit: Option<u32>,
}

impl SelectQuery {
    /// Start a query selecting all columns of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    /// Set the column list. Embedded relations are requested by naming
    /// their table, e.g. `*,markets(name),commodities(name)`.
    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    /// Add an equality filter on a column.
    pub fn eq(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.filters
            .push((column.into(), "eq".to_string(), value.to_string()));
        self
    }

    /// Add a sort key. Keys apply in insertion order.
    pub fn order(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order.push((column.into(), order));
        self
    }

    /// Cap the number of returned rows.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The table this query reads from.
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Render the query-string pairs in the service's dialect.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.columns.clone())];

        for (column, op, value) in &self.filters {
            params.push((column.clone(), format!("{}.{}", op, value)));
        }

        if !self.order.is_empty() {
            let rendered: Vec<String> = self
                .order
                .iter()
                .map(|(column, order)| format!("{}.{}", column, order.suffix()))
                .collect();
            params.push(("order".to_string(), rendered.join(",")));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }
}

/// Data-service client.
///
/// Cheap to clone; the underlying HTTP client is shared.
#[derive(Clone)]
pub struct RestStore {
    http: Client,
    config: StoreConfig,
}

impl RestStore {
    /// Create a client with the given connection parameters.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(&config.key)
            .map_err(|_| StoreError::Config("access key contains invalid characters".to_string()))?;
        headers.insert("apikey", key);

        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.key))
            .map_err(|_| StoreError::Config("access key contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { http, config })
    }

    /// The configured service base URL.
    pub fn base_url(&self) -> &str {
        &self.config.url
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table)
    }

    /// Fetch all rows matching a select query.
    pub async fn fetch<T: DeserializeOwned>(&self, query: &SelectQuery) -> Result<Vec<T>, StoreError> {
        let url = self.endpoint(query.table_name());
        debug!(url = %url, "Fetching rows");

        let response = self.http.get(&url).query(&query.to_params()).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            StoreError::Decode(format!("{}: {}", query.table_name(), e))
        })
    }

    /// Insert rows into a table.
    ///
    /// The service responds with an error status and a message body on
    /// rejection (e.g. a referential-integrity violation); both are
    /// carried back verbatim.
    pub async fn insert<T: Serialize>(&self, table: &str, rows: &[T]) -> Result<(), StoreError> {
        let url = self.endpoint(table);
        debug!(url = %url, rows = rows.len(), "Inserting rows");

        let response = self
            .http
            .post(&url)
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    /// Connectivity probe against the service root.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let url = format!("{}/rest/v1/", self.config.url.trim_end_matches('/'));
        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.url, "http://localhost:54321");
        assert!(config.key.is_empty());
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_select_query_defaults() {
        let query = SelectQuery::table("markets");
        assert_eq!(query.table_name(), "markets");
        assert_eq!(query.to_params(), vec![("select".to_string(), "*".to_string())]);
    }

    #[test]
    fn test_select_query_order_and_limit() {
        let query = SelectQuery::table("price_entries")
            .columns("*,markets(name),commodities(name)")
            .order("created_at", Order::Desc)
            .limit(50);

        let params = query.to_params();
        assert_eq!(
            params,
            vec![
                (
                    "select".to_string(),
                    "*,markets(name),commodities(name)".to_string()
                ),
                ("order".to_string(), "created_at.desc".to_string()),
                ("limit".to_string(), "50".to_string()),
            ]
        );
    }

    #[test]
    fn test_select_query_ascending_order() {
        let query = SelectQuery::table("markets").order("name", Order::Asc);
        let params = query.to_params();
        assert!(params.contains(&("order".to_string(), "name.asc".to_string())));
    }

    #[test]
    fn test_select_query_eq_filter() {
        let query = SelectQuery::table("price_entries").eq("market_id", 3);
        let params = query.to_params();
        assert!(params.contains(&("market_id".to_string(), "eq.3".to_string())));
    }

    #[test]
    fn test_select_query_multiple_order_keys() {
        let query = SelectQuery::table("price_entries")
            .order("created_at", Order::Desc)
            .order("id", Order::Desc);
        let params = query.to_params();
        assert!(params.contains(&("order".to_string(), "created_at.desc,id.desc".to_string())));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let store = RestStore::new(StoreConfig {
            url: "http://localhost:54321/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(
            store.endpoint("markets"),
            "http://localhost:54321/rest/v1/markets"
        );
    }

    #[test]
    fn test_client_creation_rejects_bad_key() {
        let result = RestStore::new(StoreConfig {
            key: "line\nbreak".to_string(),
            ..Default::default()
        });

        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[test]
    fn test_error_display() {
        let api = StoreError::Api {
            status: 409,
            body: "duplicate entry".to_string(),
        };
        assert!(api.to_string().contains("409"));
        assert!(api.to_string().contains("duplicate entry"));

        let decode = StoreError::Decode("markets: expected value".to_string());
        assert!(decode.to_string().contains("markets"));
    }
}
