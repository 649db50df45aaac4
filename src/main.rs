mod types;
mod indicators;
mod features;
mod ml;
mod risk;
mod config;
mod analytics;
mod data;
mod export;
mod error;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use analytics::{AnalysisReport, AnalyticsPipeline};
use config::AnalyticsConfig;
use data::{CsvSource, MarketDataSource, RawDataStore, YahooFinanceClient};

#[derive(Parser)]
#[command(name = "equity-intel")]
#[command(version)]
#[command(about = "Technical, regime, risk and anomaly analytics for daily equity prices", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "equity-intel.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch (or load) prices, run the full analysis and print a report
    Analyze {
        /// Symbol to analyse; repeat for several. Defaults to the configured universe
        #[arg(short, long)]
        symbol: Vec<String>,
        /// Start date (YYYY-MM-DD), defaults to the configured start
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD, exclusive), defaults to today
        #[arg(long)]
        end: Option<String>,
        /// Read prices from this CSV instead of the network
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Reuse the raw snapshots saved by earlier runs instead of the network
        #[arg(long, conflicts_with = "input")]
        from_raw: bool,
        /// Directory for the analysed CSV export
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download daily prices and save the raw CSV
    Fetch {
        #[arg(short, long)]
        symbol: String,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },
    /// List the configured symbol universe
    Symbols,
    /// Print the effective configuration as TOML, or write it to a file
    Config {
        #[arg(short, long)]
        write: Option<PathBuf>,
        /// Validate a TOML file on its own and exit
        #[arg(long, conflicts_with = "write")]
        check: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_json)?;

    let config = AnalyticsConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    match cli.command {
        Commands::Analyze { symbol, start, end, input, from_raw, output, json } => {
            let symbols = resolve_symbols(symbol, input.as_deref(), &config)?;
            let (start, end) = date_range(start.as_deref(), end.as_deref(), &config)?;
            let source = match (input.as_deref(), from_raw) {
                (Some(path), _) => Source::Csv(path),
                (None, true) => Source::RawStore,
                (None, false) => Source::Network,
            };
            run_analysis(&config, &symbols, start, end, source, output.as_deref(), json).await?;
        }
        Commands::Fetch { symbol, start, end } => {
            let (start, end) = date_range(start.as_deref(), end.as_deref(), &config)?;
            fetch_raw(&config, &symbol, start, end).await?;
        }
        Commands::Symbols => {
            for symbol in &config.universe.symbols {
                println!("{}", symbol);
            }
        }
        Commands::Config { check: Some(path), .. } => {
            let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
            let checked = AnalyticsConfig::from_toml_str(&raw).with_context(|| format!("checking {}", path.display()))?;
            info!(
                "✓ {} is valid ({} symbols, {} regimes)",
                path.display(),
                checked.universe.symbols.len(),
                checked.regime.n_regimes
            );
        }
        Commands::Config { write, check: None } => {
            let raw = config.to_toml_string()?;
            match write {
                Some(path) => {
                    std::fs::write(&path, raw).with_context(|| format!("writing {}", path.display()))?;
                    info!("Wrote configuration to {}", path.display());
                }
                None => print!("{}", raw),
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| anyhow!("Invalid date '{}': {}", raw, e))
}

fn date_range(start: Option<&str>, end: Option<&str>, config: &AnalyticsConfig) -> Result<(NaiveDate, NaiveDate)> {
    let start = start.map(parse_date).transpose()?.unwrap_or(config.universe.start_date);
    let end = end.map(parse_date).transpose()?.unwrap_or_else(|| Utc::now().date_naive());
    if start >= end {
        bail!("Start date {} must be before end date {}", start, end);
    }
    Ok((start, end))
}

/// Explicit symbols win. An input file names its own symbol via its
/// `Symbol` column, or failing that its file stem. Only the first tagged
/// symbol is analysed.
fn resolve_symbols(explicit: Vec<String>, input: Option<&Path>, config: &AnalyticsConfig) -> Result<Vec<String>> {
    if !explicit.is_empty() {
        return Ok(explicit);
    }
    let Some(path) = input else {
        return Ok(config.universe.symbols.clone());
    };

    let mut tagged = CsvSource::new(path)
        .symbols()
        .with_context(|| format!("reading {}", path.display()))?
        .into_iter();
    let first = tagged.next();
    let ignored: Vec<String> = tagged.collect();
    if !ignored.is_empty() {
        warn!(
            "{} holds {} symbols; analysing {} only, pass --symbol for the others ({})",
            path.display(),
            ignored.len() + 1,
            first.as_deref().unwrap_or_default(),
            ignored.join(", ")
        );
    }

    let symbol = first
        .or_else(|| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .ok_or_else(|| anyhow!("Cannot infer a symbol for {}; pass --symbol", path.display()))?;
    Ok(vec![symbol])
}

/// Where `analyze` reads prices from.
#[derive(Debug, Clone, Copy)]
enum Source<'a> {
    Network,
    Csv(&'a Path),
    RawStore,
}

async fn run_analysis(
    config: &AnalyticsConfig,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    source: Source<'_>,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    if symbols.is_empty() {
        bail!("No symbols to analyse");
    }
    let pipeline = AnalyticsPipeline::new(config.clone())?;
    let store = RawDataStore::new(&config.ingestion.raw_data_dir);
    let reader: Box<dyn MarketDataSource> = match source {
        Source::Network => Box::new(YahooFinanceClient::new(&config.ingestion)?),
        Source::Csv(path) => Box::new(CsvSource::new(path)),
        Source::RawStore => Box::new(store.clone()),
    };

    info!(
        "Analysing {} symbol(s) from {} to {} via {}",
        symbols.len(),
        start,
        end,
        reader.name()
    );

    let mut failed = Vec::new();
    for symbol in symbols {
        let outcome = async {
            let table = data::load_table(reader.as_ref(), symbol, start, end, &config.ingestion).await?;
            if matches!(source, Source::Network) {
                store.save(&table)?;
            }

            let analyzed = pipeline.run(table)?;
            let report = AnalysisReport::from_table(&analyzed);
            if json {
                println!("{}", report.to_json()?);
            } else {
                report.print_summary();
            }

            if let Some(dir) = output {
                export::write_analyzed_csv(&export::analyzed_path(dir, symbol), &analyzed)?;
            }
            Ok::<_, error::AnalyticsError>(())
        }
        .await;

        if let Err(e) = outcome {
            error!("{}: {}", symbol, e);
            failed.push(symbol.as_str());
        }
    }

    if failed.len() == symbols.len() {
        bail!("Analysis failed for every symbol: {}", failed.join(", "));
    }
    if !failed.is_empty() {
        warn!("Skipped {} symbol(s): {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

async fn fetch_raw(config: &AnalyticsConfig, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
    let client = YahooFinanceClient::new(&config.ingestion)?;
    let table = data::load_table(&client, symbol, start, end, &config.ingestion)
        .await
        .with_context(|| format!("fetching {}", symbol))?;

    let path = RawDataStore::new(&config.ingestion.raw_data_dir).save(&table)?;
    info!("✓ {} sessions for {} saved to {}", table.len(), symbol, path.display());
    Ok(())
}
