//! CLI entry point for the calibration rater tool.
//!
//! Provides subcommands for building a full JSON report over a calibration
//! CSV, inspecting the epoch selection, printing band series, and ranking
//! geographic areas.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use calibration_rater::analyzers::areas::{
    RankOrder, TargetFilter, aggregate_by_area, overall_mean, rank_areas,
};
use calibration_rater::analyzers::bands::{aggregate_bands, summarize_series};
use calibration_rater::analyzers::epochs::select_epochs;
use calibration_rater::analyzers::metric::{
    AGE_CATALOGUE, BandKind, CatalogueEntry, EMPLOYMENT_INCOME_CATALOGUE,
};
use calibration_rater::analyzers::quality::{TierCounts, score};
use calibration_rater::analyzers::report::{EpochQuality, build_report};
use calibration_rater::output::{append_record, print_pretty, to_json, write_json};
use calibration_rater::parser::load_csv;
use calibration_rater::table::CalibrationTable;

#[derive(Parser)]
#[command(name = "calibration_rater")]
#[command(about = "Rates how well calibrated weights reproduce known targets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Amount,
    Count,
}

impl From<KindArg> for BandKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Amount => BandKind::Amount,
            KindArg::Count => BandKind::Count,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CatalogueArg {
    Age,
    Employment,
}

impl CatalogueArg {
    fn entries(self) -> &'static [CatalogueEntry] {
        match self {
            CatalogueArg::Age => AGE_CATALOGUE,
            CatalogueArg::Employment => EMPLOYMENT_INCOME_CATALOGUE,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full JSON report for a calibration CSV
    Report {
        /// Path to the calibration CSV
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// JSON file to write the report to (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print the downsampled epoch selection
    Epochs {
        /// Path to the calibration CSV
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Cap on stepped epochs in the selection
        #[arg(short, long, default_value_t = 100)]
        cap: usize,
    },
    /// Print the band series for one (source, kind) group at an epoch
    Bands {
        /// Path to the calibration CSV
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Band source, e.g. "pension"
        #[arg(short, long)]
        source: String,

        /// Amount or count series
        #[arg(short, long, value_enum, default_value_t = KindArg::Amount)]
        kind: KindArg,

        /// Epoch to inspect (max epoch if omitted)
        #[arg(short, long)]
        epoch: Option<u32>,
    },
    /// Rank geographic areas by mean relative error
    Areas {
        /// Path to the calibration CSV
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Which flat catalogue to resolve per area
        #[arg(short, long, value_enum, default_value_t = CatalogueArg::Age)]
        catalogue: CatalogueArg,

        /// Rank worst performers first instead of best
        #[arg(short, long, default_value_t = false)]
        worst: bool,

        /// Maximum number of areas to print
        #[arg(short, long, default_value_t = 10)]
        limit: usize,

        /// Keep points whose target is zero or negative
        #[arg(long, default_value_t = false)]
        keep_zero_targets: bool,
    },
    /// Append per-epoch quality rows to a CSV file
    Score {
        /// Path to the calibration CSV
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// CSV file to append results to
        #[arg(short, long, default_value = "scores.csv")]
        output: String,
    },
}

fn main() -> Result<()> {
    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/calibration_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("calibration_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report { input, output } => {
            let table = load_table(&input)?;
            let report = build_report(&table);
            print_pretty(&report);

            match output {
                Some(path) => write_json(&path, &report)?,
                None => println!("{}", to_json(&report)?),
            }
        }
        Commands::Epochs { input, cap } => {
            let records = load_csv(&input)?;
            let selection = select_epochs(&records, cap);

            info!(
                distinct_selected = selection.selected.len(),
                max_epoch = selection.max_epoch,
                "Epoch selection"
            );
            for epoch in &selection.selected {
                println!("{epoch}");
            }
        }
        Commands::Bands {
            input,
            source,
            kind,
            epoch,
        } => {
            let table = load_table(&input)?;
            let epoch = epoch.unwrap_or_else(|| table.max_epoch());
            let (records, facets) = table.at_epoch(epoch);

            let points = aggregate_bands(&records, &facets, &source, kind.into());
            match summarize_series(&points) {
                Some(summary) => {
                    info!(
                        source,
                        epoch,
                        bands = summary.count,
                        mean_rel_error = summary.mean_rel_error,
                        best_band = summary.best_band,
                        worst_band = summary.worst_band,
                        "Band series"
                    );
                    for p in &points {
                        println!(
                            "band {:>3}  [{}, {}]  estimate {:.1}  target {:.1}  rel_err {:.4}",
                            p.band_index,
                            p.lower_bound,
                            p.upper_bound
                                .map_or("inf".to_string(), |u| u.to_string()),
                            p.estimate,
                            p.target,
                            p.rel_abs_error,
                        );
                    }
                }
                None => info!(source, epoch, "No bands matched"),
            }
        }
        Commands::Areas {
            input,
            catalogue,
            worst,
            limit,
            keep_zero_targets,
        } => {
            let table = load_table(&input)?;
            let (records, _) = table.at_epoch(table.max_epoch());

            let filter = if keep_zero_targets {
                TargetFilter::KeepAll
            } else {
                TargetFilter::RequirePositiveTarget
            };
            let order = if worst {
                RankOrder::WorstFirst
            } else {
                RankOrder::BestFirst
            };

            let summaries = aggregate_by_area(&records, catalogue.entries(), filter);
            match overall_mean(&summaries) {
                Some(overall) => info!(
                    areas = summaries.len(),
                    overall_mean_rel_error = overall,
                    "Area rankings"
                ),
                None => info!("No area has a surviving point"),
            }

            for summary in rank_areas(summaries, order).into_iter().take(limit) {
                println!(
                    "{}  mean_rel_err {:.4}  ({} points)",
                    summary.area,
                    summary.mean_rel_error,
                    summary.points.len(),
                );
            }
        }
        Commands::Score { input, output } => {
            let table = load_table(&input)?;

            for &epoch in &table.epochs().selected {
                let (records, _) = table.at_epoch(epoch);
                let counts =
                    TierCounts::from_errors(records.iter().map(|r| r.rel_abs_error));
                let quality = EpochQuality {
                    epoch,
                    score: score(&counts),
                    counts,
                };
                append_record(&output, &quality)?;
            }
            info!(
                output,
                epochs = table.epochs().selected.len(),
                "Score rows appended"
            );
        }
    }

    Ok(())
}

/// Loads the CSV and builds the shared derived structures once.
fn load_table(path: &Path) -> Result<CalibrationTable> {
    let records = load_csv(path)?;
    info!(records = records.len(), "Calibration table loaded");
    Ok(CalibrationTable::new(records))
}
