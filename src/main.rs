use analytics::table::TABLE_HEADERS;
use analytics::{ChartSeries, TableRow};
use anyhow::Context;
use api_client::{ApiClient, GeClient};
use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::Table;
use configuration::{load_config, load_config_from, Overrides};
use core_types::ItemId;
use engine::{Session, SeriesState};
use events::FilterField;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// The main entry point for the GE Slacker price tracker.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; every setting has a default.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match &cli.overrides.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .and_then(|config| config.apply(&cli.overrides))
    .context("Failed to load configuration")?;

    let _log_guard = configuration::init_tracing(&config.logging)?;
    tracing::debug!(origin = %config.server.origin, "Configuration loaded.");

    let client = GeClient::from_config(&config.server).context("Failed to build the exchange client")?;
    let mut session = Session::from_config(Arc::new(client), &config)?;

    let result = match cli.command {
        Commands::Summary(args) => handle_summary(&mut session, args).await,
        Commands::Graph(args) => handle_graph(&mut session, args).await,
    };
    session.close();
    result
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Grand Exchange price tracker: item margins, ROI and price history.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every item with its margin and ROI.
    Summary(SummaryArgs),
    /// Show the price history of one item.
    Graph(GraphArgs),
}

#[derive(Args)]
struct SummaryArgs {
    /// Only items whose name contains this text (case-insensitive).
    #[arg(long)]
    search: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    price_min: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    price_max: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    margin_min: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    margin_max: Option<String>,

    #[arg(long, allow_hyphen_values = true)]
    quantity_min: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    quantity_max: Option<String>,

    #[arg(long, value_enum, default_value_t = SortKey::Margin)]
    sort: SortKey,

    /// Print at most this many rows.
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortKey {
    Margin,
    Roi,
    Price,
    Name,
}

#[derive(Args)]
struct GraphArgs {
    /// The item id.
    #[arg(long)]
    id: ItemId,

    /// Minutes of history to request from the live endpoint.
    #[arg(long)]
    range: Option<u32>,

    /// Sampling interval in minutes, used by the static mirror.
    #[arg(long)]
    interval: Option<u32>,

    /// Print the chart series as JSON.
    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn spinner(message: &'static str) -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

async fn handle_summary(session: &mut Session, args: SummaryArgs) -> anyhow::Result<()> {
    let progress = spinner("Loading item summary...")?;
    let loaded = session.reload_catalog().await;
    progress.finish_and_clear();
    let count = loaded.context("Failed to load the item summary")?;
    tracing::info!(items = count, "Summary loaded.");

    let filters = session.filters();
    for (field, value) in [
        (FilterField::Search, args.search),
        (FilterField::PriceMin, args.price_min),
        (FilterField::PriceMax, args.price_max),
        (FilterField::MarginMin, args.margin_min),
        (FilterField::MarginMax, args.margin_max),
        (FilterField::QuantityMin, args.quantity_min),
        (FilterField::QuantityMax, args.quantity_max),
    ] {
        if let Some(value) = value {
            filters.set(field, value);
        }
    }

    let mut rows = session.visible_rows();
    sort_rows(&mut rows, args.sort);
    let shown = args.limit.unwrap_or(rows.len()).min(rows.len());

    let mut table = Table::new();
    table.set_header(TABLE_HEADERS.to_vec());
    for row in &rows[..shown] {
        let mut cells = row.cells();
        cells[analytics::table::ROI_COLUMN] = row.roi_display();
        table.add_row(cells);
    }
    println!("{table}");
    println!("{} of {} items shown.", shown, count);
    Ok(())
}

fn sort_rows(rows: &mut [TableRow], key: SortKey) {
    match key {
        SortKey::Margin => rows.sort_by(|a, b| b.margin.cmp(&a.margin)),
        SortKey::Roi => rows.sort_by(|a, b| b.roi.cmp(&a.roi)),
        SortKey::Price => rows.sort_by(|a, b| b.overall_average.cmp(&a.overall_average)),
        SortKey::Name => rows.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase())),
    }
}

async fn handle_graph(session: &mut Session, args: GraphArgs) -> anyhow::Result<()> {
    let current = session.selection();
    let range = args.range.unwrap_or(current.range);
    let interval = args.interval.unwrap_or(current.interval);
    if range == 0 || interval == 0 {
        tracing::warn!(range, interval, "Ignoring an empty range; keeping the configured one.");
    }
    // No item is selected yet, so this only updates the selection.
    session.set_range(range, interval).await?;

    // The catalog only supplies the item name, so both requests run side by side.
    let progress = spinner("Loading price history...")?;
    let client = session.client();
    let request = session.begin_series(args.id);
    let (catalog, series) = tokio::join!(client.fetch_catalog(), request.fetch(client.as_ref()));
    progress.finish_and_clear();

    if let Err(e) = session.apply_catalog(catalog) {
        tracing::warn!(error = %e, "Continuing without item names.");
    }
    session
        .complete_series(request, series)
        .with_context(|| format!("Failed to load the price history of item {}", args.id))?;

    let SeriesState::Ready(loaded) = session.series() else {
        anyhow::bail!("No price history is available for item {}", args.id);
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&loaded.chart)?);
        return Ok(());
    }

    let title = loaded.name.as_deref().unwrap_or("Unknown item");
    println!(
        "{} (#{}), {} minutes at {} minute intervals",
        title, loaded.item_id, loaded.selection.range, loaded.selection.interval
    );
    println!("{}", chart_table(&loaded.chart));
    Ok(())
}

fn chart_table(chart: &ChartSeries) -> Table {
    let price = |p: Option<rust_decimal::Decimal>| p.map_or_else(|| "-".to_string(), |p| p.to_string());
    let mut table = Table::new();
    table.set_header(chart.labels.to_vec());
    for row in &chart.values {
        table.add_row(vec![
            row.time.format("%Y-%m-%d %H:%M").to_string(),
            price(row.buy),
            price(row.sell),
        ]);
    }
    table
}
