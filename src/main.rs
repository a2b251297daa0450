use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod catalog;
mod ingest;
mod models;
mod report;

use catalog::ItemCatalog;
use models::Aggregation;
use report::View;

#[derive(Parser)]
#[command(name = "donation-leaderboard")]
#[command(about = "Donation leaderboard: donor ranking and item statistics", long_about = None)]
struct Cli {
    /// Donation records file, one `donor,item,quantity` per line
    #[arg(long, global = true, env = "DONATION_RECORDS")]
    records: Option<PathBuf>,
    /// Item catalog TOML file with `[[item]]` tables
    #[arg(long, global = true, env = "DONATION_CATALOG")]
    catalog: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    Ranking,
    Stats,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the ranking or item statistics
    Show {
        #[arg(long, value_enum, default_value_t = View::Ranking)]
        view: View,
        /// Show only the first N donors or items
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(long)]
        show_rejected: bool,
    },
    /// Write the leaderboard as an HTML page
    Report {
        #[arg(long, value_enum, default_value_t = View::Ranking)]
        view: View,
        #[arg(long, default_value = "leaderboard.html")]
        out: PathBuf,
    },
    /// Export the ranking or item statistics as CSV
    Export {
        #[arg(long, value_enum)]
        kind: ExportKind,
        /// Defaults to stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Report which records were left out of the totals
    Check,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "donation_leaderboard=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_aggregation(records: Option<&Path>, catalog: Option<&Path>) -> anyhow::Result<Aggregation> {
    let catalog = match catalog {
        Some(path) => ItemCatalog::load(path)
            .with_context(|| format!("failed to load catalog {}", path.display()))?,
        None => ItemCatalog::builtin(),
    };
    let aggregation = match records {
        Some(path) => aggregate::aggregate_numbered(ingest::read_records(path)?, &catalog),
        None => aggregate::aggregate(ingest::builtin_records(), &catalog),
    };

    Ok(aggregation)
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing();

    let aggregation = load_aggregation(cli.records.as_deref(), cli.catalog.as_deref())?;

    match cli.command {
        Commands::Show {
            view,
            limit,
            format,
            show_rejected,
        } => {
            match format {
                OutputFormat::Text => print!("{}", report::render_text(&aggregation, view, limit)),
                OutputFormat::Json => println!("{}", report::render_json(&aggregation)?),
            }
            if show_rejected && !aggregation.rejected.is_empty() {
                println!();
                println!("Skipped records:");
                print!("{}", report::render_rejections(&aggregation));
            }
        }
        Commands::Report { view, out } => {
            let html = report::render_html(&aggregation, view, Local::now().date_naive());
            std::fs::write(&out, html)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { kind, out } => {
            let writer: Box<dyn std::io::Write> = match &out {
                Some(path) => Box::new(BufWriter::new(
                    File::create(path)
                        .with_context(|| format!("failed to create {}", path.display()))?,
                )),
                None => Box::new(std::io::stdout().lock()),
            };
            match kind {
                ExportKind::Ranking => report::write_ranking_csv(writer, &aggregation.ranking)?,
                ExportKind::Stats => report::write_item_stats_csv(writer, &aggregation.item_stats)?,
            }
            if let Some(path) = out {
                tracing::info!(path = %path.display(), "csv exported");
            }
        }
        Commands::Check => {
            let ranking_points = aggregation.ranking_points();
            let item_points = aggregation.item_points();
            if ranking_points != item_points {
                tracing::warn!(ranking_points, item_points, "point totals disagree");
            }
            println!(
                "{} donors ranked with {} points, {} records skipped.",
                aggregation.ranking.len(),
                report::format_points(ranking_points),
                aggregation.rejected.len()
            );
            print!("{}", report::render_rejections(&aggregation));
        }
    }

    Ok(())
}
