//! # GE Slacker Engine
//!
//! The session that ties the exchange client, the item catalog, the range selection
//! and the filter panel together, and announces every state change as a
//! [`SessionEvent`].
//!
//! Series requests are generation tagged. Each request started with
//! [`Session::begin_series`] bumps the generation; a completion whose generation is
//! no longer current is dropped, so a slow response can never overwrite the
//! chart of a newer selection.

use crate::error::EngineError;
use analytics::{ChartSeries, MetricsEngine, SeriesTransformer, TableRow};
use api_client::{ApiClient, ApiError};
use configuration::Config;
use core_types::{ItemId, ItemSnapshot, RangeSelection, TimeSeriesPoint};
use events::SessionEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

pub mod catalog;
pub mod error;
pub mod filters;

pub use catalog::ItemCatalog;
pub use filters::FilterPanel;

const EVENT_CAPACITY: usize = 64;

/// A series fetch that has been issued but not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesRequest {
    pub item_id: ItemId,
    pub selection: RangeSelection,
    pub generation: u64,
}

impl SeriesRequest {
    /// Runs the fetch. Holds no session borrow, so several requests may be in
    /// flight while the session keeps serving reads.
    pub async fn fetch(&self, client: &dyn ApiClient) -> Result<Vec<TimeSeriesPoint>, ApiError> {
        client
            .fetch_series(self.item_id, self.selection.range, self.selection.interval)
            .await
    }
}

/// A chart that was applied to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSeries {
    pub item_id: ItemId,
    /// `None` when the catalog had not loaded the item when the series arrived.
    pub name: Option<String>,
    pub selection: RangeSelection,
    pub generation: u64,
    pub chart: ChartSeries,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SeriesState {
    #[default]
    Idle,
    Loading { item_id: ItemId, generation: u64 },
    Ready(LoadedSeries),
    Failed { item_id: ItemId, message: String },
}

/// What happened to a completed series request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesOutcome {
    Applied {
        item_id: ItemId,
        generation: u64,
        points: usize,
    },
    /// A newer request was issued first; this response was discarded.
    Superseded { item_id: ItemId, generation: u64 },
}

/// One user's view of the exchange.
pub struct Session {
    client: Arc<dyn ApiClient>,
    metrics: MetricsEngine,
    catalog: ItemCatalog,
    selection: RangeSelection,
    selected: Option<ItemId>,
    generation: u64,
    series: SeriesState,
    filters: FilterPanel,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    pub fn new(client: Arc<dyn ApiClient>, metrics: MetricsEngine, selection: RangeSelection) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            metrics,
            catalog: ItemCatalog::new(),
            selection,
            selected: None,
            generation: 0,
            series: SeriesState::Idle,
            filters: FilterPanel::new(events.clone()),
            events,
        }
    }

    /// Builds a session with the configured ROI basis and default graph range.
    pub fn from_config(client: Arc<dyn ApiClient>, config: &Config) -> Result<Self, EngineError> {
        let selection = config.graph.selection()?;
        Ok(Self::new(
            client,
            MetricsEngine::new(config.metrics.roi_basis),
            selection,
        ))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // Sending only fails when nobody is subscribed.
        let _ = self.events.send(event);
    }

    pub fn client(&self) -> Arc<dyn ApiClient> {
        Arc::clone(&self.client)
    }

    pub fn metrics(&self) -> &MetricsEngine {
        &self.metrics
    }

    pub fn catalog(&self) -> &ItemCatalog {
        &self.catalog
    }

    pub fn item(&self, id: ItemId) -> Result<&ItemSnapshot, EngineError> {
        self.catalog.get(id)
    }

    pub fn selection(&self) -> RangeSelection {
        self.selection
    }

    pub fn selected_item(&self) -> Option<ItemId> {
        self.selected
    }

    pub fn series(&self) -> &SeriesState {
        &self.series
    }

    pub fn filters(&self) -> &FilterPanel {
        &self.filters
    }

    /// Every catalog item as a table row.
    pub fn rows(&self) -> Vec<TableRow> {
        self.catalog.rows(&self.metrics)
    }

    /// The rows that pass the current search and range filters.
    pub fn visible_rows(&self) -> Vec<TableRow> {
        self.rows()
            .into_iter()
            .filter(|row| self.filters.matches(row))
            .collect()
    }

    // --- Catalog ---

    /// Fetches the summary and replaces the catalog with it.
    /// On failure the previous catalog is kept and the error is returned.
    pub async fn reload_catalog(&mut self) -> Result<usize, EngineError> {
        let result = self.client.fetch_catalog().await;
        self.apply_catalog(result)
    }

    /// Applies a summary fetched outside the session.
    pub fn apply_catalog(
        &mut self,
        result: Result<HashMap<ItemId, ItemSnapshot>, ApiError>,
    ) -> Result<usize, EngineError> {
        let items = result.map_err(|e| {
            tracing::error!(error = %e, "Failed to load the item summary.");
            e
        })?;
        let count = self.catalog.replace(items);
        tracing::info!(items = count, "Item catalog replaced.");
        if let Some(loaded_at) = self.catalog.loaded_at() {
            self.emit(SessionEvent::CatalogReplaced {
                item_count: count,
                loaded_at,
            });
        }
        Ok(count)
    }

    // --- Series ---

    /// Selects an item and starts a new series request for it.
    pub fn begin_series(&mut self, item_id: ItemId) -> SeriesRequest {
        self.generation += 1;
        self.selected = Some(item_id);
        self.series = SeriesState::Loading {
            item_id,
            generation: self.generation,
        };
        if !self.catalog.contains(item_id) {
            tracing::debug!(item_id, "Series requested for an item not in the catalog yet.");
        }
        self.emit(SessionEvent::SeriesLoading {
            item_id,
            generation: self.generation,
        });
        SeriesRequest {
            item_id,
            selection: self.selection,
            generation: self.generation,
        }
    }

    /// Applies the result of `request` if it is still the latest one.
    ///
    /// Stale completions are discarded whether they succeeded or failed. A current
    /// failure moves the series to `Failed` and is returned as the error.
    pub fn complete_series(
        &mut self,
        request: SeriesRequest,
        result: Result<Vec<TimeSeriesPoint>, ApiError>,
    ) -> Result<SeriesOutcome, EngineError> {
        let SeriesRequest {
            item_id,
            selection,
            generation,
        } = request;

        if generation != self.generation {
            tracing::debug!(item_id, generation, current = self.generation, "Dropping superseded series response.");
            self.emit(SessionEvent::SeriesSuperseded { item_id, generation });
            return Ok(SeriesOutcome::Superseded { item_id, generation });
        }

        match result {
            Ok(points) => {
                let chart = SeriesTransformer::parse(&points);
                let name = self.catalog.get(item_id).ok().map(|item| item.name.clone());
                let count = chart.len();
                self.series = SeriesState::Ready(LoadedSeries {
                    item_id,
                    name,
                    selection,
                    generation,
                    chart,
                });
                self.emit(SessionEvent::SeriesReady {
                    item_id,
                    generation,
                    points: count,
                });
                Ok(SeriesOutcome::Applied {
                    item_id,
                    generation,
                    points: count,
                })
            }
            Err(e) => {
                let message = e.to_string();
                tracing::error!(item_id, error = %message, "Series could not be loaded.");
                self.series = SeriesState::Failed {
                    item_id,
                    message: message.clone(),
                };
                self.emit(SessionEvent::SeriesFailed {
                    item_id,
                    generation,
                    message,
                });
                Err(e.into())
            }
        }
    }

    /// Selects an item and loads its series with the current range selection.
    pub async fn select_item(&mut self, item_id: ItemId) -> Result<SeriesOutcome, EngineError> {
        let request = self.begin_series(item_id);
        let result = request.fetch(self.client.as_ref()).await;
        self.complete_series(request, result)
    }

    /// Changes the graph range.
    ///
    /// A zero `range` or `interval` is ignored and returns `Ok(None)`. Otherwise the
    /// selected item, if any, is reloaded with the new selection.
    pub async fn set_range(
        &mut self,
        range: u32,
        interval: u32,
    ) -> Result<Option<SeriesOutcome>, EngineError> {
        let Ok(selection) = RangeSelection::new(range, interval) else {
            tracing::debug!(range, interval, "Ignoring empty range selection.");
            return Ok(None);
        };
        self.selection = selection;
        self.emit(SessionEvent::RangeChanged(selection));

        match self.selected {
            Some(item_id) => self.select_item(item_id).await.map(Some),
            None => Ok(None),
        }
    }

    /// Ends the session. Subscribers see `Closed` and then the channel closes.
    pub fn close(self) {
        self.emit(SessionEvent::Closed);
        tracing::debug!("Session closed.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use core_types::RoiBasis;
    use events::FilterField;
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn snapshot(id: ItemId, name: &str, overall: rust_decimal::Decimal) -> ItemSnapshot {
        ItemSnapshot {
            id,
            name: name.to_string(),
            buy_average: overall + dec!(2),
            sell_average: overall,
            overall_average: overall,
            buy_quantity: 10,
            sell_quantity: 10,
            overall_quantity: 20,
            members: false,
            sp: dec!(1),
        }
    }

    fn point(minute: u32, buy: rust_decimal::Decimal) -> TimeSeriesPoint {
        TimeSeriesPoint {
            ts: Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap(),
            buying_price: buy,
            selling_price: buy,
            buying_quantity: 1,
            selling_quantity: 1,
            overall_price: buy,
            overall_quantity: 2,
        }
    }

    /// Serves queued catalogs and a fixed series per item, recording series calls.
    #[derive(Default)]
    struct StubClient {
        catalogs: Mutex<VecDeque<Option<HashMap<ItemId, ItemSnapshot>>>>,
        series: HashMap<ItemId, Vec<TimeSeriesPoint>>,
        calls: Mutex<Vec<(ItemId, u32, u32)>>,
    }

    impl StubClient {
        fn with_catalogs(catalogs: Vec<Option<Vec<ItemSnapshot>>>) -> Self {
            let catalogs = catalogs
                .into_iter()
                .map(|c| c.map(|items| items.into_iter().map(|s| (s.id, s)).collect()))
                .collect();
            Self {
                catalogs: Mutex::new(catalogs),
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<(ItemId, u32, u32)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ApiClient for StubClient {
        async fn fetch_catalog(&self) -> Result<HashMap<ItemId, ItemSnapshot>, ApiError> {
            self.catalogs
                .lock()
                .unwrap()
                .pop_front()
                .flatten()
                .ok_or_else(|| ApiError::Network("summary unreachable".to_string()))
        }

        async fn fetch_series(
            &self,
            item_id: ItemId,
            range: u32,
            interval: u32,
        ) -> Result<Vec<TimeSeriesPoint>, ApiError> {
            self.calls.lock().unwrap().push((item_id, range, interval));
            self.series
                .get(&item_id)
                .cloned()
                .ok_or_else(|| ApiError::SeriesUnavailable {
                    item_id,
                    primary: "HTTP 500".to_string(),
                    fallback: "HTTP 404".to_string(),
                })
        }
    }

    fn session(client: StubClient) -> (Session, Arc<StubClient>) {
        let client = Arc::new(client);
        let session = Session::new(client.clone(), MetricsEngine::default(), RangeSelection::default());
        (session, client)
    }

    #[tokio::test]
    async fn lookups_before_load_report_not_found() {
        let (session, _) = session(StubClient::default());
        assert!(!session.catalog().is_loaded());
        assert!(matches!(session.item(2), Err(EngineError::NotFound(2))));
        assert!(session.rows().is_empty());
    }

    #[tokio::test]
    async fn reload_replaces_the_catalog_wholesale() {
        let client = StubClient::with_catalogs(vec![
            Some(vec![snapshot(2, "Cannonball", dec!(160)), snapshot(6, "Cannon base", dec!(190_000))]),
            Some(vec![snapshot(8, "Cannon stand", dec!(180_000))]),
        ]);
        let (mut session, _) = session(client);
        let mut events = session.subscribe();

        assert_eq!(session.reload_catalog().await.unwrap(), 2);
        assert_eq!(session.reload_catalog().await.unwrap(), 1);

        assert!(matches!(session.item(2), Err(EngineError::NotFound(2))));
        assert_eq!(session.item(8).unwrap().name, "Cannon stand");
        assert!(matches!(
            events.try_recv().unwrap(),
            SessionEvent::CatalogReplaced { item_count: 2, .. }
        ));
    }

    #[tokio::test]
    async fn failed_reload_keeps_the_previous_catalog() {
        let client = StubClient::with_catalogs(vec![Some(vec![snapshot(2, "Cannonball", dec!(160))]), None]);
        let (mut session, _) = session(client);

        session.reload_catalog().await.unwrap();
        let err = session.reload_catalog().await.unwrap_err();

        assert!(matches!(err, EngineError::ApiClient(ApiError::Network(_))));
        assert_eq!(session.catalog().len(), 1);
    }

    #[tokio::test]
    async fn selecting_an_item_loads_its_chart() {
        let mut client = StubClient::with_catalogs(vec![Some(vec![snapshot(2, "Cannonball", dec!(160))])]);
        client.series.insert(2, vec![point(0, dec!(160)), point(30, dec!(0))]);
        let (mut session, client) = session(client);
        session.reload_catalog().await.unwrap();

        let outcome = session.select_item(2).await.unwrap();

        assert_eq!(
            outcome,
            SeriesOutcome::Applied {
                item_id: 2,
                generation: 1,
                points: 2
            }
        );
        assert_eq!(client.calls(), vec![(2, 1440, 30)]);
        let SeriesState::Ready(loaded) = session.series() else {
            panic!("expected a loaded series, got {:?}", session.series());
        };
        assert_eq!(loaded.name.as_deref(), Some("Cannonball"));
        assert_eq!(loaded.chart.values[1].buy, None);
    }

    #[tokio::test]
    async fn series_before_catalog_has_no_name() {
        let mut client = StubClient::default();
        client.series.insert(2, vec![point(0, dec!(160))]);
        let (mut session, _) = session(client);

        session.select_item(2).await.unwrap();

        let SeriesState::Ready(loaded) = session.series() else {
            panic!("expected a loaded series");
        };
        assert_eq!(loaded.name, None);
    }

    #[tokio::test]
    async fn stale_response_does_not_overwrite_newer_selection() {
        let mut client = StubClient::default();
        client.series.insert(2, vec![point(0, dec!(160))]);
        client.series.insert(6, vec![point(0, dec!(190_000)), point(30, dec!(191_000))]);
        let (mut session, client) = session(client);
        let mut events = session.subscribe();

        let first = session.begin_series(2);
        let second = session.begin_series(6);
        let (first_result, second_result) = tokio::join!(
            first.fetch(client.as_ref()),
            second.fetch(client.as_ref())
        );

        // The newer response lands first, then the older one straggles in.
        let applied = session.complete_series(second, second_result).unwrap();
        let dropped = session.complete_series(first, first_result).unwrap();

        assert!(matches!(applied, SeriesOutcome::Applied { item_id: 6, .. }));
        assert_eq!(dropped, SeriesOutcome::Superseded { item_id: 2, generation: 1 });
        assert_eq!(session.selected_item(), Some(6));
        let SeriesState::Ready(loaded) = session.series() else {
            panic!("expected a loaded series");
        };
        assert_eq!(loaded.item_id, 6);
        assert_eq!(loaded.chart.len(), 2);

        let seen: Vec<SessionEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert_eq!(seen.last(), Some(&SessionEvent::SeriesSuperseded { item_id: 2, generation: 1 }));
    }

    #[tokio::test]
    async fn stale_failure_is_dropped_too() {
        let mut client = StubClient::default();
        client.series.insert(6, vec![point(0, dec!(190_000))]);
        let (mut session, _) = session(client);

        let first = session.begin_series(404);
        let second = session.begin_series(6);
        let second_result = second.fetch(session.client().as_ref()).await;
        session.complete_series(second, second_result).unwrap();
        let first_result = first.fetch(session.client().as_ref()).await;

        assert!(matches!(
            session.complete_series(first, first_result),
            Ok(SeriesOutcome::Superseded { item_id: 404, .. })
        ));
        assert!(matches!(session.series(), SeriesState::Ready(_)));
    }

    #[tokio::test]
    async fn current_failure_is_reported() {
        let (mut session, _) = session(StubClient::default());

        let err = session.select_item(404).await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::ApiClient(ApiError::SeriesUnavailable { item_id: 404, .. })
        ));
        assert!(matches!(session.series(), SeriesState::Failed { item_id: 404, .. }));
    }

    #[tokio::test]
    async fn range_change_reloads_the_selected_item() {
        let mut client = StubClient::default();
        client.series.insert(2, vec![point(0, dec!(160))]);
        let (mut session, client) = session(client);

        assert_eq!(session.set_range(4320, 180).await.unwrap(), None);
        assert!(client.calls().is_empty());

        session.select_item(2).await.unwrap();
        let outcome = session.set_range(10080, 360).await.unwrap();

        assert!(matches!(outcome, Some(SeriesOutcome::Applied { item_id: 2, .. })));
        assert_eq!(client.calls(), vec![(2, 4320, 180), (2, 10080, 360)]);
    }

    #[tokio::test]
    async fn zero_range_is_ignored() {
        let (mut session, _) = session(StubClient::default());
        let mut events = session.subscribe();

        assert_eq!(session.set_range(0, 30).await.unwrap(), None);
        assert_eq!(session.set_range(1440, 0).await.unwrap(), None);

        assert_eq!(session.selection(), RangeSelection::default());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn filters_narrow_the_visible_rows() {
        let client = StubClient::with_catalogs(vec![Some(vec![
            snapshot(2, "Cannonball", dec!(160)),
            snapshot(6, "Cannon base", dec!(190_000)),
            snapshot(314, "Feather", dec!(3)),
        ])]);
        let (mut session, _) = session(client);
        session.reload_catalog().await.unwrap();

        session.filters().set(FilterField::Search, "cannon");
        session.filters().set(FilterField::PriceMax, "1000");
        let visible = session.visible_rows();

        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Cannonball");
    }

    #[tokio::test]
    async fn close_announces_itself() {
        let (session, _) = session(StubClient::default());
        let mut events = session.subscribe();

        session.close();

        assert_eq!(events.recv().await.unwrap(), SessionEvent::Closed);
        assert!(events.recv().await.is_err());
    }

    #[test]
    fn from_config_uses_configured_basis_and_range() {
        let config = configuration::parse_config(
            "[graph]\nrange = 4320\ninterval = 180\n[metrics]\nroi_basis = \"sell_average\"\n",
        )
        .unwrap();

        let session = Session::from_config(Arc::new(StubClient::default()), &config).unwrap();

        assert_eq!(session.metrics().basis(), RoiBasis::SellAverage);
        assert_eq!(session.selection(), RangeSelection::new(4320, 180).unwrap());
    }

    #[test]
    fn loaded_at_is_reported_on_replace() {
        let mut catalog = ItemCatalog::new();
        catalog.replace(HashMap::new());
        assert!(catalog.loaded_at().unwrap() <= Utc::now());
    }
}
