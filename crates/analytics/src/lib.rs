//! # GE Slacker Analytics
//!
//! This crate derives everything the display layer shows from the raw exchange data.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It performs no I/O and depends only
//!   on `core-types` (Layer 0).
//! - **Numeric Safety:** Metrics never fail. Missing or degenerate inputs produce zero,
//!   which callers must not read as "no margin exists".
//!
//! ## Public API
//!
//! - `MetricsEngine`: margin and ROI of an item snapshot.
//! - `SeriesTransformer` / `ChartSeries`: chart-ready price history.
//! - `RangeFilter` / `BoundSource`: min/max predicates over table rows with live bounds.
//! - `TableRow`: the per-item row handed to tabular displays.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod filter;
pub mod series;
pub mod table;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{margin, roi, MetricsEngine};
pub use filter::{parse_bound, parse_cell, BoundSource, RangeFilter};
pub use series::{ChartRow, ChartSeries, SeriesTransformer, CHART_LABELS};
pub use table::{matches_name, TableRow};
