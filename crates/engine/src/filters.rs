use analytics::table::{MARGIN_COLUMN, PRICE_COLUMN, QUANTITY_COLUMN};
use analytics::{RangeFilter, TableRow};
use events::{FilterField, SessionEvent};
use tokio::sync::{broadcast, watch};

type LiveRangeFilter = RangeFilter<watch::Receiver<String>, watch::Receiver<String>>;

/// The table's filter inputs: a name search plus min/max boxes for average
/// price, margin and overall quantity.
///
/// Each input is a `watch` channel holding its current text. The range filters are
/// built once over receivers of those channels, so they always see the latest
/// values. Every change is also announced as `SessionEvent::FiltersChanged`.
pub struct FilterPanel {
    search: watch::Sender<String>,
    price_min: watch::Sender<String>,
    price_max: watch::Sender<String>,
    margin_min: watch::Sender<String>,
    margin_max: watch::Sender<String>,
    quantity_min: watch::Sender<String>,
    quantity_max: watch::Sender<String>,
    ranges: Vec<LiveRangeFilter>,
    events: broadcast::Sender<SessionEvent>,
}

impl FilterPanel {
    pub fn new(events: broadcast::Sender<SessionEvent>) -> Self {
        let (search, _) = watch::channel(String::new());
        let (price_min, _) = watch::channel(String::new());
        let (price_max, _) = watch::channel(String::new());
        let (margin_min, _) = watch::channel(String::new());
        let (margin_max, _) = watch::channel(String::new());
        let (quantity_min, _) = watch::channel(String::new());
        let (quantity_max, _) = watch::channel(String::new());

        let ranges = vec![
            RangeFilter::new(PRICE_COLUMN, price_min.subscribe(), price_max.subscribe()),
            RangeFilter::new(MARGIN_COLUMN, margin_min.subscribe(), margin_max.subscribe()),
            RangeFilter::new(QUANTITY_COLUMN, quantity_min.subscribe(), quantity_max.subscribe()),
        ];

        Self {
            search,
            price_min,
            price_max,
            margin_min,
            margin_max,
            quantity_min,
            quantity_max,
            ranges,
            events,
        }
    }

    fn input(&self, field: FilterField) -> &watch::Sender<String> {
        match field {
            FilterField::Search => &self.search,
            FilterField::PriceMin => &self.price_min,
            FilterField::PriceMax => &self.price_max,
            FilterField::MarginMin => &self.margin_min,
            FilterField::MarginMax => &self.margin_max,
            FilterField::QuantityMin => &self.quantity_min,
            FilterField::QuantityMax => &self.quantity_max,
        }
    }

    /// Replaces the text of one input and notifies subscribers.
    pub fn set(&self, field: FilterField, value: impl Into<String>) {
        let value = value.into();
        self.input(field).send_replace(value.clone());
        tracing::debug!(?field, value = %value, "Filter changed.");
        // No subscribers is fine; the new value is still stored.
        let _ = self.events.send(SessionEvent::FiltersChanged { field, value });
    }

    pub fn value(&self, field: FilterField) -> String {
        self.input(field).borrow().clone()
    }

    /// A receiver that observes one input; `changed().await` resolves on each edit.
    pub fn watch(&self, field: FilterField) -> watch::Receiver<String> {
        self.input(field).subscribe()
    }

    /// The min/max predicates for price, margin and quantity.
    pub fn range_filters(&self) -> &[LiveRangeFilter] {
        &self.ranges
    }

    /// True when the row passes the name search and every range filter.
    pub fn matches(&self, row: &TableRow) -> bool {
        if !row.matches_name(&self.search.borrow()) {
            return false;
        }
        let cells = row.cells();
        self.ranges.iter().all(|filter| filter.accepts(&cells))
    }

    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a TableRow>) -> Vec<&'a TableRow> {
        rows.into_iter().filter(|row| self.matches(row)).collect()
    }
}
