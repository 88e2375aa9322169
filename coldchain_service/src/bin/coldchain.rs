//! Command-line front end for the cold-chain dashboard.
//!
//! Renders one page per invocation, either as JSON for a web front end or
//! as plain text for a terminal.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use coldchain_service::config::AppConfig;
use coldchain_service::dashboard::{Dashboard, Page, PageView, Panel, Selection, TableSummary};
use coldchain_service::logging::init_logger;
use coldchain_service::model::{EventRecord, TimePoint};
use coldchain_service::source::SourceCache;

#[derive(Parser)]
#[command(name = "coldchain")]
#[command(about = "Cold chain logistics dashboard: sensor trends, averages and alerts", long_about = None)]
#[command(version)]
struct Cli {
    /// Page to render: home, transport, warehouse, supermarket, city-view, alerts
    page: String,

    /// Site (or alerts category), e.g. "Supermarket 2" or "Transportation"
    #[arg(short, long)]
    site: Option<String>,

    /// Room within the site, e.g. "Room 3"
    #[arg(short, long)]
    room: Option<String>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!(target: "cli", "{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String, Box<dyn std::error::Error>> {
    let config = AppConfig::load(cli.config.as_deref())?;
    init_logger(
        config.log_level(),
        config.logging.file.as_deref(),
        config.logging.console_timestamps,
    );

    let page: Page = cli.page.parse()?;
    let selection = Selection::new(cli.site.as_deref(), cli.room.as_deref());

    let cache = SourceCache::new(config.data_dir.clone(), config.site_registry()?);
    let mut dashboard = Dashboard::new(cache, config.boundary_path());
    let view = dashboard.render(page, &selection)?;

    Ok(match cli.format {
        OutputFormat::Json => serde_json::to_string_pretty(&view)?,
        OutputFormat::Text => render_text(&view),
    })
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

fn render_text(view: &PageView) -> String {
    let mut out = Vec::new();
    match view {
        PageView::Home(home) => {
            out.push(format!("# {}", home.title));
            out.push(home.subtitle.clone());
            for section in &home.sections {
                out.push(format!("\n## {}\n{}", section.title, section.description));
            }
        }
        PageView::Transport(transport) => {
            out.push("# Transport Data".to_string());
            push_summary(&mut out, &transport.summary, "Overall Truck Behavior");
        }
        PageView::Warehouse(warehouse) => {
            out.push(format!("# Warehouse Monitoring: {}", warehouse.room));
            push_summary(
                &mut out,
                &warehouse.summary,
                &format!("Overall Average Temperature in {}", warehouse.room),
            );
            push_trend(&mut out, "Overall Temperature Across the Building", &warehouse.building_trend);
        }
        PageView::Supermarket(market) => {
            out.push(format!("# {}: {}", market.supermarket, market.room));
            push_summary(
                &mut out,
                &market.summary,
                &format!("Overall Average Temperature in {}", market.room),
            );
            push_trend(
                &mut out,
                &format!("Overall Average Temperature in {}", market.supermarket),
                &market.supermarket_trend,
            );
        }
        PageView::CityView(city) => {
            out.push("# City View Map".to_string());
            if let Some(name) = &city.name {
                out.push(name.clone());
            }
            out.push(format!(
                "center: {:.5}, {:.5} (zoom {})",
                city.center.lat, city.center.lon, city.zoom
            ));
            for point in &city.polygon {
                out.push(format!("  [{:.5}, {:.5}]", point.lat, point.lon));
            }
        }
        PageView::Alerts(alerts) => {
            out.push(format!("# Alerts for {} / {}", alerts.category, alerts.room));
            match &alerts.alerts {
                Panel::Ready(events) => push_events(&mut out, events),
                Panel::NoData(message) => out.push(message.clone()),
            }
        }
    }
    out.join("\n")
}

fn push_summary(out: &mut Vec<String>, panel: &Panel<TableSummary>, trend_title: &str) {
    let summary = match panel {
        Panel::Ready(summary) => summary,
        Panel::NoData(message) => {
            out.push(message.clone());
            return;
        }
    };

    out.push("\n## Temperature Data for Individual Sensors".to_string());
    for series in &summary.sensor_series {
        out.push(format!("### Sensor ID: {} ({} readings)", series.sensor_id, series.points.len()));
        for point in &series.points {
            out.push(format!("  {}  {:>7.2}", point.timestamp, point.temperature));
        }
    }

    out.push("\n## Average Temperature for Each Sensor".to_string());
    for mean in &summary.sensor_means {
        out.push(format!("  {:<12} {:>7.2}", mean.sensor_id, mean.mean_temperature));
    }

    out.push("\n## Recent Events".to_string());
    push_events(out, &summary.recent_events);

    out.push(format!("\n## {}", trend_title));
    push_points(out, &summary.mean_over_time);
}

fn push_trend(out: &mut Vec<String>, title: &str, panel: &Panel<Vec<TimePoint>>) {
    out.push(format!("\n## {}", title));
    match panel {
        Panel::Ready(points) => push_points(out, points),
        Panel::NoData(message) => out.push(message.clone()),
    }
}

fn push_events(out: &mut Vec<String>, events: &[EventRecord]) {
    if events.is_empty() {
        out.push("  (none)".to_string());
    }
    for event in events {
        out.push(format!(
            "  {:<20} {:<16} {:>7.2}",
            event.timestamp, event.event, event.temperature
        ));
    }
}

fn push_points(out: &mut Vec<String>, points: &[TimePoint]) {
    for point in points {
        out.push(format!(
            "  {}  {:>7.2}",
            point.timestamp.format("%Y-%m-%d %H:%M:%S"),
            point.mean_temperature
        ));
    }
}
