use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use vehicle_seed::{
    batch::DEFAULT_BATCH_SIZE,
    config::{StoreTarget, DEFAULT_SAMPLE_SIZE},
    report::DEFAULT_PROBLEMATIC_PATH,
    seed, ImportConfig,
};

#[derive(Parser)]
#[command(
    name = "vehicle-seed",
    version,
    about = "Import a vehicles CSV into DuckDB in validated batches"
)]
struct Args {
    /// Rows per insert request
    #[arg(env = "SEED_BATCH_SIZE", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Input CSV with a year,make,model,type header
    #[arg(short, long, env = "SEED_INPUT", default_value = "vehicles.csv")]
    input: PathBuf,

    /// DuckDB database file
    #[arg(long, env = "SEED_DB", default_value = "vehicles.duckdb")]
    db: PathBuf,

    /// Where rows from failed batches are written
    #[arg(long, env = "SEED_PROBLEMATIC", default_value = DEFAULT_PROBLEMATIC_PATH)]
    problematic: PathBuf,

    /// Number of stored rows fetched once the import finishes
    #[arg(long, env = "SEED_SAMPLE_SIZE", default_value_t = DEFAULT_SAMPLE_SIZE)]
    sample_size: usize,

    /// Validate and batch without touching the database
    #[arg(long)]
    dry_run: bool,

    /// Print the fetched sample as JSON on stdout
    #[arg(long)]
    print_sample: bool,
}

impl From<Args> for ImportConfig {
    fn from(args: Args) -> Self {
        Self {
            input: args.input,
            store: if args.dry_run {
                StoreTarget::Memory
            } else {
                StoreTarget::DuckDb(args.db)
            },
            problematic_path: args.problematic,
            batch_size: args.batch_size,
            sample_size: args.sample_size,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();
    let print_sample = args.print_sample;
    let config = ImportConfig::from(args);
    info!(input = %config.input.display(), batch_size = config.batch_size, "startup");

    let report = seed(&config).await?;

    let s = &report.summary;
    info!(
        records = s.total_records,
        batches = s.batches,
        inserted = s.inserted,
        rejected = s.rejected,
        failed_batches = s.failed_batches,
        elapsed_ms = (s.finished_at - s.started_at).num_milliseconds(),
        "import finished"
    );
    if let Some(path) = &report.problematic_path {
        info!(
            "{} problematic records saved to {}",
            s.problematic,
            path.display()
        );
    }

    if print_sample {
        let json =
            serde_json::to_string_pretty(&report.sample).context("serializing vehicle sample")?;
        println!("{}", json);
    }
    Ok(())
}
