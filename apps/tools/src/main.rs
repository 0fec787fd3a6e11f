use aggregation::AggregationEngine;
use anyhow::{Context, Result};
use binder::DashboardSession;
use clap::{Parser, Subcommand};
use dataset::Dataset;
use shared::{domain::month_name, protocol::ControlEvent};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "data/sample_hotels.csv")]
    dataset: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List each year with the months it covers.
    Coverage,
    /// Print every dashboard view for the given controls as JSON.
    Views {
        #[arg(long)]
        hotel_type: Option<String>,
        #[arg(long)]
        metric: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();
    let dataset = Dataset::load(&cli.dataset)
        .with_context(|| format!("loading dataset '{}'", cli.dataset))?;

    match cli.command {
        Command::Coverage => {
            for &year in dataset.years() {
                let months: Vec<&str> = dataset
                    .months_for_year(year)
                    .iter()
                    .filter_map(|&month| month_name(month))
                    .collect();
                println!("{year}: {}", months.join(", "));
            }
        }
        Command::Views {
            hotel_type,
            metric,
            year,
            month,
        } => {
            let default_year = year.unwrap_or(2016);
            let mut session = DashboardSession::new(AggregationEngine::new(dataset), default_year);

            let events: Vec<ControlEvent> = [
                hotel_type.map(ControlEvent::HotelTypeChanged),
                metric.map(ControlEvent::MetricChanged),
                year.map(ControlEvent::YearChanged),
                month.map(ControlEvent::MonthChanged),
            ]
            .into_iter()
            .flatten()
            .collect();
            session.apply_batch(&events)?;

            println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
        }
    }

    Ok(())
}
