use crate::engine::MetricsEngine;
use core_types::{ItemId, ItemSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const ID_COLUMN: usize = 0;
pub const NAME_COLUMN: usize = 1;
pub const PRICE_COLUMN: usize = 2;
pub const MARGIN_COLUMN: usize = 5;
pub const ROI_COLUMN: usize = 6;
pub const QUANTITY_COLUMN: usize = 9;

/// Header of the item table, index-aligned with [`TableRow::cells`].
pub const TABLE_HEADERS: [&str; 10] = [
    "Id",
    "Name",
    "Average Price",
    "Buy Price",
    "Sell Price",
    "Margin",
    "ROI",
    "Buy Quantity",
    "Sell Quantity",
    "Overall Quantity",
];

/// One item as the table shows it: the snapshot's figures plus derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub id: ItemId,
    pub name: String,
    pub overall_average: Decimal,
    pub buy_average: Decimal,
    pub sell_average: Decimal,
    pub margin: Decimal,
    pub roi: Decimal,
    pub buy_quantity: u64,
    pub sell_quantity: u64,
    pub overall_quantity: u64,
    pub members: bool,
}

impl TableRow {
    pub fn from_snapshot(snapshot: &ItemSnapshot, engine: &MetricsEngine) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name.clone(),
            overall_average: snapshot.overall_average,
            buy_average: snapshot.buy_average,
            sell_average: snapshot.sell_average,
            margin: engine.margin(snapshot),
            roi: engine.roi(snapshot),
            buy_quantity: snapshot.buy_quantity,
            sell_quantity: snapshot.sell_quantity,
            overall_quantity: snapshot.overall_quantity,
            members: snapshot.members,
        }
    }

    /// The searchable text of each column, in [`TABLE_HEADERS`] order.
    ///
    /// Numbers are written plainly, without grouping separators, so range filters
    /// read the full value.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.overall_average.to_string(),
            self.buy_average.to_string(),
            self.sell_average.to_string(),
            self.margin.to_string(),
            self.roi.to_string(),
            self.buy_quantity.to_string(),
            self.sell_quantity.to_string(),
            self.overall_quantity.to_string(),
        ]
    }

    /// ROI rounded to one decimal place for display.
    pub fn roi_display(&self) -> String {
        format!("{:.1}", self.roi)
    }

    pub fn matches_name(&self, query: &str) -> bool {
        matches_name(&self.name, query)
    }
}

/// Case-insensitive substring search. Empty queries and unnamed items always match.
pub fn matches_name(name: &str, query: &str) -> bool {
    if name.is_empty() || query.is_empty() {
        return true;
    }
    name.to_lowercase().contains(&query.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::RangeFilter;
    use core_types::RoiBasis;
    use rust_decimal_macros::dec;

    fn cannonball() -> ItemSnapshot {
        ItemSnapshot {
            id: 2,
            name: "Cannonball".to_string(),
            buy_average: dec!(160),
            sell_average: dec!(159),
            overall_average: dec!(159),
            buy_quantity: 401_412,
            sell_quantity: 762_568,
            overall_quantity: 1_163_980,
            members: true,
            sp: dec!(5),
        }
    }

    #[test]
    fn row_carries_derived_metrics() {
        let row = TableRow::from_snapshot(&cannonball(), &MetricsEngine::default());

        assert_eq!(row.margin, dec!(1));
        assert_eq!(row.roi, dec!(0.625));
        assert_eq!(row.roi_display(), "0.6");
    }

    #[test]
    fn sell_basis_changes_only_roi() {
        let row = TableRow::from_snapshot(&cannonball(), &MetricsEngine::new(RoiBasis::SellAverage));

        assert_eq!(row.margin, dec!(1));
        assert_eq!(row.roi_display(), "0.6");
        assert_eq!(row.roi.round_dp(3), dec!(0.629));
    }

    #[test]
    fn cells_line_up_with_headers() {
        let cells = TableRow::from_snapshot(&cannonball(), &MetricsEngine::default()).cells();

        assert_eq!(cells.len(), TABLE_HEADERS.len());
        assert_eq!(cells[NAME_COLUMN], "Cannonball");
        assert_eq!(cells[PRICE_COLUMN], "159");
        assert_eq!(cells[MARGIN_COLUMN], "1");
        assert_eq!(cells[QUANTITY_COLUMN], "1163980");
    }

    #[test]
    fn large_quantities_are_filterable() {
        let cells = TableRow::from_snapshot(&cannonball(), &MetricsEngine::default()).cells();

        assert!(RangeFilter::new(QUANTITY_COLUMN, "1000000", "").accepts(&cells));
        assert!(!RangeFilter::new(QUANTITY_COLUMN, "", "1000000").accepts(&cells));
    }

    #[test]
    fn name_search_ignores_case() {
        assert!(matches_name("Cannonball", "CANNON"));
        assert!(matches_name("Cannonball", ""));
        assert!(matches_name("", "anything"));
        assert!(!matches_name("Cannonball", "rune"));
    }
}
