//! Command-line interface components.

use crate::config::{CompressionAlgorithm, ErosivityConfig, OutputConfig, OutputFormat};
use crate::constants::{
    DEFAULT_MATCH_TOLERANCE_HOURS, DEFAULT_RESOLUTION_HOURS, SNOW_TEMPERATURE_THRESHOLD_C,
};
use crate::enrich::{MaskColumn, MatchDirection};
use crate::loader::{AuxiliaryPaths, InputPaths};
use crate::models::ProcessingStats;
use crate::processor::ErosivityProcessor;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(name = "emo-erosivity")]
#[command(about = "Derive EI30 rainfall erosivity events from EMO5 precipitation at REDES stations")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Precipitation table (Date + one `Station_Id <id>` column per station)
    #[arg(long, value_name = "CSV")]
    pub precipitation: PathBuf,

    /// Station reference table (Station_Id, EnS_name)
    #[arg(long, value_name = "CSV")]
    pub stations: PathBuf,

    /// Monthly alpha parameters by EnS name
    #[arg(long, value_name = "CSV")]
    pub alpha: PathBuf,

    /// Monthly beta parameters by EnS name
    #[arg(long, value_name = "CSV")]
    pub beta: PathBuf,

    /// Auxiliary precipitation duration table
    #[arg(long, value_name = "CSV")]
    pub aux_pd: Option<PathBuf>,

    /// Auxiliary rain gauge table
    #[arg(long, value_name = "CSV")]
    pub aux_rg: Option<PathBuf>,

    /// Auxiliary minimum temperature table
    #[arg(long, value_name = "CSV")]
    pub aux_tn: Option<PathBuf>,

    /// Auxiliary maximum temperature table
    #[arg(long, value_name = "CSV")]
    pub aux_tx: Option<PathBuf>,

    /// Skip auxiliary matching and snow masking
    #[arg(long, conflicts_with_all = ["aux_pd", "aux_rg", "aux_tn", "aux_tx"])]
    pub no_aux: bool,

    /// Output event table (.csv or .parquet)
    #[arg(short, long, default_value = "erosivity_events.csv")]
    pub output: PathBuf,

    /// Write stations skipped during matching to this CSV
    #[arg(long, value_name = "CSV")]
    pub skipped_report: Option<PathBuf>,

    /// Accumulation interval of the precipitation series in hours
    #[arg(long, default_value_t = DEFAULT_RESOLUTION_HOURS)]
    pub resolution: u32,

    /// Maximum distance between an event start and an auxiliary record, in hours
    #[arg(long, default_value_t = DEFAULT_MATCH_TOLERANCE_HOURS)]
    pub tolerance: i64,

    /// Auxiliary match direction (nearest, forward, backward)
    #[arg(long, default_value = "nearest")]
    pub direction: String,

    /// Multiplier applied to precipitation values on load
    #[arg(long, default_value_t = 1.0)]
    pub depth_scale: f64,

    /// Comma-separated columns blanked on snowfall events
    #[arg(long, default_value = "RE EMO")]
    pub mask_columns: String,

    /// Max temperature (°C) at or below which an event counts as snowfall
    #[arg(long, default_value_t = SNOW_TEMPERATURE_THRESHOLD_C)]
    pub snow_threshold: f64,

    /// Output format (csv, parquet); detected from the extension when omitted
    #[arg(long)]
    pub format: Option<String>,

    /// Parquet compression algorithm (snappy, zstd, lz4, none)
    #[arg(long, default_value = "snappy")]
    pub compression: String,

    /// Maximum stations processed concurrently (default: number of CPUs)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Increase logging verbosity (-v: debug, -vv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress output except warnings and errors
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "warn"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Resolve the input tables; the auxiliary set must be complete unless `--no-aux`
    pub fn input_paths(&self) -> Result<InputPaths> {
        let auxiliary = if self.no_aux {
            None
        } else {
            let missing: Vec<&str> = [
                ("--aux-pd", &self.aux_pd),
                ("--aux-rg", &self.aux_rg),
                ("--aux-tn", &self.aux_tn),
                ("--aux-tx", &self.aux_tx),
            ]
            .iter()
            .filter(|(_, path)| path.is_none())
            .map(|(flag, _)| *flag)
            .collect();

            match (&self.aux_pd, &self.aux_rg, &self.aux_tn, &self.aux_tx) {
                (Some(pd), Some(rg), Some(tn), Some(tx)) => Some(AuxiliaryPaths {
                    precip_duration: pd.clone(),
                    rain_gauge: rg.clone(),
                    min_temp: tn.clone(),
                    max_temp: tx.clone(),
                }),
                _ => anyhow::bail!(
                    "Missing auxiliary tables: {} (pass --no-aux to skip matching and snow masking)",
                    missing.join(", ")
                ),
            }
        };

        Ok(InputPaths {
            precipitation: self.precipitation.clone(),
            stations: self.stations.clone(),
            alpha: self.alpha.clone(),
            beta: self.beta.clone(),
            auxiliary,
        })
    }

    /// Build the processing configuration from the flags
    pub fn build_config(&self) -> Result<ErosivityConfig> {
        let direction: MatchDirection = self
            .direction
            .parse()
            .context("Invalid --direction")?;
        let mask_columns =
            MaskColumn::parse_list(&self.mask_columns).context("Invalid --mask-columns")?;
        let compression: CompressionAlgorithm = self
            .compression
            .parse()
            .context("Invalid --compression")?;
        let format = self
            .format
            .as_deref()
            .map(str::parse::<OutputFormat>)
            .transpose()
            .context("Invalid --format")?;

        let mut config = ErosivityConfig::default()
            .with_resolution_hours(self.resolution)
            .with_tolerance_hours(self.tolerance)
            .with_direction(direction)
            .with_depth_scale(self.depth_scale)
            .with_mask_columns(mask_columns)
            .with_snow_threshold(self.snow_threshold)
            .with_output(OutputConfig {
                format,
                compression,
            });
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Initialise the tracing subscriber on stderr
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("emo_erosivity={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("Failed to initialise logging")?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Run a complete erosivity job from parsed arguments
pub async fn run(args: Args) -> Result<ProcessingStats> {
    setup_logging(&args)?;

    let inputs = args.input_paths()?;
    let config = args.build_config()?;

    let mut processor = ErosivityProcessor::new(inputs, args.output.clone())?.with_config(config);
    if let Some(report) = &args.skipped_report {
        processor = processor.with_skipped_report(report.clone());
    }

    let stats = processor.process().await?;
    Ok(stats)
}
