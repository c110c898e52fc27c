use chrono::{DateTime, Utc};
use core_types::TimeSeriesPoint;
use rust_decimal::prelude::*;
use serde::ser::{Serialize, SerializeTuple, Serializer};

/// Column labels of every chart series.
pub const CHART_LABELS: [&str; 3] = ["Time", "Buy Price", "Sell Price"];

/// One chart row. A `None` price is drawn as a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub time: DateTime<Utc>,
    pub buy: Option<Decimal>,
    pub sell: Option<Decimal>,
}

/// Serializes as `[time, buy|null, sell|null]`, the row shape charting libraries take.
impl Serialize for ChartRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut row = serializer.serialize_tuple(3)?;
        row.serialize_element(&self.time)?;
        row.serialize_element(&self.buy.and_then(|p| p.to_f64()))?;
        row.serialize_element(&self.sell.and_then(|p| p.to_f64()))?;
        row.end()
    }
}

/// A price history ready to hand to a chart.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ChartSeries {
    pub labels: [&'static str; 3],
    pub values: Vec<ChartRow>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Reshapes raw time-series payloads into chart series.
#[derive(Debug, Default)]
pub struct SeriesTransformer;

impl SeriesTransformer {
    /// One row per input point, in input order; the points are not re-sorted.
    ///
    /// A zero price is indistinguishable from a missing sample in the exchange's
    /// data, so it becomes a gap rather than a plotted zero.
    pub fn parse(points: &[TimeSeriesPoint]) -> ChartSeries {
        let values = points
            .iter()
            .map(|point| ChartRow {
                time: point.ts,
                buy: gap_if_zero(point.buying_price),
                sell: gap_if_zero(point.selling_price),
            })
            .collect();

        ChartSeries {
            labels: CHART_LABELS,
            values,
        }
    }
}

fn gap_if_zero(price: Decimal) -> Option<Decimal> {
    if price.is_zero() { None } else { Some(price) }
}
