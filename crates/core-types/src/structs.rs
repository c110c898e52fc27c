use crate::error::CoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The exchange's numeric identifier for a tradeable item.
pub type ItemId = u32;

/// Lookback window used when no range has been chosen: one day of data.
pub const DEFAULT_RANGE_MINUTES: u32 = 60 * 24;
/// Sampling granularity used when no interval has been chosen.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 30;

/// Point-in-time aggregated trading statistics for one item, as served by the
/// exchange summary endpoint.
///
/// A price of zero means the exchange had no trades to average, not that the item
/// is free. Use the `*_price` accessors to get that distinction as an `Option`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    /// Positive; the client drops summary entries with id 0.
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub buy_average: Decimal,
    #[serde(default)]
    pub sell_average: Decimal,
    #[serde(default)]
    pub overall_average: Decimal,
    #[serde(default)]
    pub buy_quantity: u64,
    #[serde(default)]
    pub sell_quantity: u64,
    #[serde(default)]
    pub overall_quantity: u64,
    #[serde(default)]
    pub members: bool,
    /// Store price of the item.
    #[serde(default)]
    pub sp: Decimal,
}

impl ItemSnapshot {
    /// Average buy price, or `None` when the exchange reported no data.
    pub fn buy_price(&self) -> Option<Decimal> {
        non_zero(self.buy_average)
    }

    /// Average sell price, or `None` when the exchange reported no data.
    pub fn sell_price(&self) -> Option<Decimal> {
        non_zero(self.sell_average)
    }

    /// Overall average price, or `None` when the exchange reported no data.
    pub fn overall_price(&self) -> Option<Decimal> {
        non_zero(self.overall_average)
    }
}

/// A single sample of an item's price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
    #[serde(default)]
    pub buying_price: Decimal,
    #[serde(default)]
    pub selling_price: Decimal,
    #[serde(default)]
    pub buying_quantity: u64,
    #[serde(default)]
    pub selling_quantity: u64,
    #[serde(default)]
    pub overall_price: Decimal,
    #[serde(default)]
    pub overall_quantity: u64,
}

/// The lookback window and sampling granularity for a time-series query, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSelection {
    /// Fetch data from this many minutes ago until now.
    pub range: u32,
    /// Minutes between consecutive samples.
    pub interval: u32,
}

impl RangeSelection {
    pub fn new(range: u32, interval: u32) -> Result<Self, CoreError> {
        if range == 0 {
            return Err(CoreError::InvalidInput(
                "range".to_string(),
                "lookback window must be at least one minute".to_string(),
            ));
        }
        if interval == 0 {
            return Err(CoreError::InvalidInput(
                "interval".to_string(),
                "sampling interval must be at least one minute".to_string(),
            ));
        }
        Ok(Self { range, interval })
    }
}

impl Default for RangeSelection {
    fn default() -> Self {
        Self {
            range: DEFAULT_RANGE_MINUTES,
            interval: DEFAULT_INTERVAL_MINUTES,
        }
    }
}

fn non_zero(value: Decimal) -> Option<Decimal> {
    if value.is_zero() { None } else { Some(value) }
}
