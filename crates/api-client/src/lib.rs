use async_trait::async_trait;
use configuration::ServerConfig;
use core_types::{ItemId, ItemSnapshot, TimeSeriesPoint};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use url::Url;

pub mod endpoints;
pub mod error;
pub mod transport;
// --- Public API ---
pub use endpoints::Endpoints;
pub use error::ApiError;
pub use transport::{RawResponse, ReqwestTransport, Transport};

/// The abstract interface to the exchange data service.
/// The session talks to this trait, so the network implementation can be swapped
/// for a scripted one in tests.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Fetches the current snapshot of every item, keyed by item id.
    ///
    /// A single request with no fallback; any failure is returned as-is.
    async fn fetch_catalog(&self) -> Result<HashMap<ItemId, ItemSnapshot>, ApiError>;

    /// Fetches an item's price history.
    ///
    /// The live endpoint is asked for `range` minutes of history. If it cannot be
    /// reached or answers with a non-success status, exactly one request is made to
    /// the static mirror's file for `interval`. No further retries are made.
    async fn fetch_series(
        &self,
        item_id: ItemId,
        range: u32,
        interval: u32,
    ) -> Result<Vec<TimeSeriesPoint>, ApiError>;
}

/// `ApiClient` for the exchange's summary and graph endpoints.
pub struct GeClient<T: Transport = ReqwestTransport> {
    transport: T,
    endpoints: Endpoints,
}

impl GeClient<ReqwestTransport> {
    pub fn new(endpoints: Endpoints) -> Result<Self, ApiError> {
        Ok(Self::with_transport(ReqwestTransport::new()?, endpoints))
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, ApiError> {
        Self::new(Endpoints::from_config(config)?)
    }
}

impl<T: Transport> GeClient<T> {
    pub fn with_transport(transport: T, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// GETs `url` and returns the body of a successful response.
    async fn get_ok(&self, url: &Url) -> Result<String, ApiError> {
        tracing::debug!(%url, "GET");
        let response = self.transport.get(url).await?;
        if !response.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response.body)
    }

    async fn get_json<D: DeserializeOwned>(&self, url: &Url) -> Result<D, ApiError> {
        let body = self.get_ok(url).await?;
        decode(url, &body)
    }
}

#[async_trait]
impl<T: Transport> ApiClient for GeClient<T> {
    async fn fetch_catalog(&self) -> Result<HashMap<ItemId, ItemSnapshot>, ApiError> {
        let url = self.endpoints.summary()?;
        // The summary is keyed by the id as a string; the snapshot carries the same id.
        let raw: HashMap<String, ItemSnapshot> = self.get_json(&url).await?;

        let mut items = HashMap::with_capacity(raw.len());
        for (key, snapshot) in raw {
            // Item ids start at 1; a zero id is a placeholder entry.
            if snapshot.id == 0 {
                tracing::warn!(key = %key, name = %snapshot.name, "Skipping summary entry with item id 0.");
                continue;
            }
            if key != snapshot.id.to_string() {
                tracing::debug!(key = %key, id = snapshot.id, "Summary key does not match item id.");
            }
            if let Some(previous) = items.insert(snapshot.id, snapshot) {
                tracing::warn!(id = previous.id, "Duplicate item id in summary; keeping the later entry.");
            }
        }

        tracing::info!(items = items.len(), "Fetched exchange summary.");
        Ok(items)
    }

    async fn fetch_series(
        &self,
        item_id: ItemId,
        range: u32,
        interval: u32,
    ) -> Result<Vec<TimeSeriesPoint>, ApiError> {
        let primary = self.endpoints.series(item_id, range)?;
        let primary_error = match self.get_ok(&primary).await {
            Ok(body) => return decode(&primary, &body),
            Err(e) if e.is_network() => e,
            Err(e) => return Err(e),
        };

        tracing::warn!(
            item_id,
            error = %primary_error,
            "Live graph endpoint failed; falling back to the static mirror."
        );
        let fallback = self.endpoints.series_fallback(item_id, interval)?;
        match self.get_ok(&fallback).await {
            Ok(body) => decode(&fallback, &body),
            Err(fallback_error) => {
                tracing::error!(item_id, error = %fallback_error, "Static graph mirror failed.");
                Err(ApiError::SeriesUnavailable {
                    item_id,
                    primary: primary_error.to_string(),
                    fallback: fallback_error.to_string(),
                })
            }
        }
    }
}

fn decode<D: DeserializeOwned>(url: &Url, body: &str) -> Result<D, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Parse(format!("{} (url: {})", e, url)))
}
