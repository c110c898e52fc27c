use crate::error::ApiError;
use configuration::ServerConfig;
use core_types::ItemId;
use serde::Serialize;
use url::Url;

/// Query string of the live graph endpoint: `a=graph&i={id}&g={range}`.
#[derive(Serialize)]
struct GraphQuery {
    a: &'static str,
    i: ItemId,
    g: u32,
}

/// Builds the URLs of the three resources the tracker reads.
///
/// The live graph endpoint is keyed by lookback window while the static mirror is
/// bucketed by sampling interval, so the two series URLs take different parameters.
#[derive(Debug, Clone)]
pub struct Endpoints {
    origin: String,
    api_prefix: String,
    static_prefix: String,
    summary_prefix: String,
}

impl Endpoints {
    pub fn new(
        origin: &str,
        api_prefix: &str,
        static_prefix: &str,
        summary_prefix: &str,
    ) -> Result<Self, ApiError> {
        let origin = origin.trim().trim_end_matches('/').to_string();
        // Fail at construction rather than on the first request.
        Url::parse(&origin)?;

        Ok(Self {
            origin,
            api_prefix: clean_prefix(api_prefix),
            static_prefix: clean_prefix(static_prefix),
            summary_prefix: clean_prefix(summary_prefix),
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, ApiError> {
        Self::new(
            &config.origin,
            &config.api_prefix,
            &config.static_prefix,
            config.summary_prefix(),
        )
    }

    /// `{origin}/{summary_prefix}/exchange/summary.json`
    pub fn summary(&self) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!(
            "{}/{}/exchange/summary.json",
            self.origin, self.summary_prefix
        ))?)
    }

    /// `{origin}/{api_prefix}/grandExchange/?a=graph&i={id}&g={range}`
    pub fn series(&self, item_id: ItemId, range: u32) -> Result<Url, ApiError> {
        let query = serde_qs::to_string(&GraphQuery {
            a: "graph",
            i: item_id,
            g: range,
        })
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        Ok(Url::parse(&format!(
            "{}/{}/grandExchange/?{}",
            self.origin, self.api_prefix, query
        ))?)
    }

    /// `{origin}/{static_prefix}/exchange/graphs/{interval}/{id}.json`
    pub fn series_fallback(&self, item_id: ItemId, interval: u32) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!(
            "{}/{}/exchange/graphs/{}/{}.json",
            self.origin, self.static_prefix, interval, item_id
        ))?)
    }
}

fn clean_prefix(prefix: &str) -> String {
    prefix.trim().trim_matches('/').to_string()
}
