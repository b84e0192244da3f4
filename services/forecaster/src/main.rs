//! Air-quality forecast service.
//!
//! Keeps a local cache of CAMS regional forecasts and extracts regional
//! summaries from it:
//! - `fetch`: make sure the forecast for a date range is cached
//! - `extract`: fetch, then write quantile and station tables
//! - `sweep`: apply the retention policy to a profile's cache
//! - `inspect`: describe a cached grid file

mod config;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use aq_common::species::display_name;
use aq_common::time::parse_date;
use aq_common::{BoundingBox, DateRange};
use clap::{Args, Parser, Subcommand, ValueEnum};
use extraction::{process_forecast, Extraction};
use forecast_cache::{ForecastCache, ForecastResult, RemoteFetcher, RetentionPolicy};
use grid_store::{GridStore, ZarrGridStore};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use config::{ForecasterConfig, ProfileConfig};

#[cfg(feature = "netcdf")]
type Store = grid_store::NetCdfGridStore;
#[cfg(not(feature = "netcdf"))]
type Store = ZarrGridStore;

#[derive(Parser, Debug)]
#[command(name = "forecaster")]
#[command(about = "Air-quality forecast cache and region extraction")]
struct Cli {
    /// Configuration file
    #[arg(long, env = "FORECASTER_CONFIG", default_value = "config/forecast.yaml", global = true)]
    config: PathBuf,

    /// Profile to use from the configuration
    #[arg(short, long, default_value = "plot", global = true)]
    profile: String,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Make sure the forecast for a date range is cached
    Fetch(FetchArgs),
    /// Fetch, then extract the profile's regions
    Extract {
        #[command(flatten)]
        fetch: FetchArgs,

        /// Directory for output tables (stdout if omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Output table format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },
    /// Delete cache entries beyond the retention limit
    Sweep,
    /// Describe a cached grid file
    Inspect {
        path: PathBuf,

        /// Also write the grid as a Zarr store
        #[arg(long)]
        convert: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// First forecast date (YYYY-MM-DD, default today)
    #[arg(long)]
    start: Option<String>,

    /// Last forecast date (defaults to start)
    #[arg(long)]
    end: Option<String>,

    /// Override the profile area as "north,west,south,east"
    #[arg(long)]
    area: Option<String>,

    /// Serve from the cache without contacting the archive
    #[arg(long, env = "FORECASTER_DRY_RUN")]
    dry_run: bool,
}

impl FetchArgs {
    fn date_range(&self) -> Result<DateRange> {
        let start = match &self.start {
            Some(s) => parse_date(s)?,
            None => DateRange::today().start(),
        };
        let end = match &self.end {
            Some(s) => parse_date(s)?,
            None => start,
        };
        Ok(DateRange::new(start, end)?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr; stdout carries results
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = ForecasterConfig::load_or_default(&cli.config)?;

    match &cli.command {
        Command::Fetch(args) => {
            let profile = config.profile(&cli.profile)?;
            let result = fetch(&config, profile, args).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Extract { fetch: args, out, format } => {
            let profile = config.profile(&cli.profile)?;
            let result = fetch(&config, profile, args).await?;
            let extractions = process_forecast(
                &Store::new(),
                &result,
                &profile.selectors(),
                config.timezone()?,
            )
            .with_context(|| format!("Failed to extract from {}", result.file.display()))?;
            write_extractions(&cli.profile, &result, &extractions, out.as_deref(), *format)?;
        }
        Command::Sweep => {
            let profile = config.profile(&cli.profile)?;
            let report = RetentionPolicy::new(profile.max_entries).sweep(&profile.output_dir)?;
            info!(
                kept = report.kept.len(),
                deleted = report.deleted.len(),
                failed = report.failed.len(),
                "Sweep complete"
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Inspect { path, convert } => inspect(path, convert.as_deref())?,
    }

    Ok(())
}

fn remote_fetcher(config: &ForecasterConfig, dry_run: bool) -> Result<Arc<dyn RemoteFetcher>> {
    if dry_run {
        return Ok(Arc::new(forecast_cache::OfflineFetcher));
    }
    archive_fetcher(config)
}

#[cfg(feature = "netcdf")]
fn archive_fetcher(config: &ForecasterConfig) -> Result<Arc<dyn RemoteFetcher>> {
    let client = forecast_cache::CdsClient::new(
        config.credentials()?,
        forecast_cache::CdsClientConfig::default(),
    )?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "netcdf"))]
fn archive_fetcher(_config: &ForecasterConfig) -> Result<Arc<dyn RemoteFetcher>> {
    warn!("Built without NetCDF support, serving cached Zarr entries only");
    Ok(Arc::new(forecast_cache::OfflineFetcher))
}

async fn fetch(
    config: &ForecasterConfig,
    profile: &ProfileConfig,
    args: &FetchArgs,
) -> Result<ForecastResult> {
    let mut request = profile.request(args.date_range()?);
    if let Some(area) = &args.area {
        request.bounding_box = BoundingBox::from_area_string(area)?;
    }

    let cache = ForecastCache::new(
        Store::new(),
        remote_fetcher(config, args.dry_run)?,
        profile.cache_config(args.dry_run),
    );
    let result = cache.get_forecast(&request).await;

    if result.is_stale(&request) {
        warn!(
            requested = %request.date_range,
            served = %result.date,
            "Serving an older forecast"
        );
    }
    info!(file = %result.file.display(), date = %result.date, "Forecast resolved");
    Ok(result)
}

fn write_extractions(
    profile: &str,
    result: &ForecastResult,
    extractions: &[Extraction],
    out: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let Some(dir) = out else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        for extraction in extractions {
            writeln!(handle, "# {}", extraction.selector.name())?;
            write_table(extraction, &mut handle, format)?;
            writeln!(handle)?;
        }
        return Ok(());
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    for extraction in extractions {
        let path = dir.join(format!(
            "{}_{}_{}.{}",
            profile,
            extraction.selector.name(),
            result.date,
            format.extension()
        ));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        write_table(extraction, file, format)?;
        info!(
            path = %path.display(),
            rows = extraction.table.num_rows(),
            columns = extraction.table.num_columns(),
            "Wrote table"
        );
    }
    Ok(())
}

fn write_table<W: Write>(extraction: &Extraction, writer: W, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => extraction.table.write_csv(writer)?,
        OutputFormat::Json => extraction.table.write_json(writer)?,
    }
    Ok(())
}

fn inspect(path: &Path, convert: Option<&Path>) -> Result<()> {
    let store = Store::new();
    let grid = store
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let [steps, levels, rows, cols] = grid.shape();
    println!("{}", path.display());
    println!("  shape: time={steps} level={levels} latitude={rows} longitude={cols}");
    println!("  complete steps: {}/{}", grid.complete_steps(), steps);
    for variable in grid.variables() {
        let species = variable.species.as_deref().unwrap_or("-");
        println!(
            "  {:<28} {:<20} {:<8} {}",
            variable.name,
            species,
            display_name(species),
            variable.units.as_deref().unwrap_or("")
        );
    }

    if let Some(target) = convert {
        ZarrGridStore::new()
            .write(target, &grid)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        info!(path = %target.display(), "Converted grid to Zarr");
    }
    Ok(())
}
