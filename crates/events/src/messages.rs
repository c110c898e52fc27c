use chrono::{DateTime, Utc};
use core_types::{ItemId, RangeSelection};
use serde::{Deserialize, Serialize};

/// The filter inputs a table exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterField {
    Search,
    PriceMin,
    PriceMax,
    MarginMin,
    MarginMax,
    QuantityMin,
    QuantityMax,
}

/// Everything a session announces to its subscribers.
///
/// Serialized with `#[serde(tag = "type", content = "payload")]`, so a range change
/// looks like `{"type": "RangeChanged", "payload": {"range": 1440, "interval": 30}}`.
///
/// Series events carry the request `generation`; a subscriber that tracks the
/// latest `SeriesLoading` generation can ignore anything older.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SessionEvent {
    /// The catalog was wholly replaced by a fresh summary.
    CatalogReplaced {
        item_count: usize,
        loaded_at: DateTime<Utc>,
    },
    /// The graph range selection changed.
    RangeChanged(RangeSelection),
    /// A filter input changed; tables should re-filter.
    FiltersChanged { field: FilterField, value: String },
    /// A series request was issued.
    SeriesLoading { item_id: ItemId, generation: u64 },
    /// The latest series request completed.
    SeriesReady {
        item_id: ItemId,
        generation: u64,
        points: usize,
    },
    /// The latest series request failed on both sources.
    SeriesFailed {
        item_id: ItemId,
        generation: u64,
        message: String,
    },
    /// A series response arrived after a newer request was issued and was dropped.
    SeriesSuperseded { item_id: ItemId, generation: u64 },
    /// The session was closed; no further events follow.
    Closed,
}
