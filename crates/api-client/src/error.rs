use core_types::ItemId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network request failed: {0}")]
    Network(String),

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Series for item {item_id} unavailable; primary: {primary}; fallback: {fallback}")]
    SeriesUnavailable {
        item_id: ItemId,
        primary: String,
        fallback: String,
    },

    #[error("Failed to deserialize the API response: {0}")]
    Parse(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to build request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// True for transport failures and non-success statuses, the failures a
    /// fallback source can recover from.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Status { .. } | ApiError::SeriesUnavailable { .. }
        )
    }
}
