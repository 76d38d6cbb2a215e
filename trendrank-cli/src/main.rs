mod config;
mod input;
mod output;
mod store;
mod trends;

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use trendrank_core::{
    constants, ComparisonCache, FilterOptions, RankOptions, RequestConfig, RunError, SortOptions,
    run_ranking,
};

use crate::store::JsonFileStore;
use crate::trends::{TrendsClientConfig, TrendsOracle};

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "trendrank", version, about = "Rank items by trend interest and rebuild one absolute-scale series")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Filter, rank and reconstruct a list of items
    Rank(RankArgs),
    /// Create a default config file at ~/.config/trendrank/config.toml
    Init,
}

#[derive(Parser)]
struct RankArgs {
    /// CSV file with one item identifier per row (e.g. NYSE:GME)
    #[arg(long)]
    input: PathBuf,

    /// Only read the first N rows of the input
    #[arg(long)]
    limit: Option<usize>,

    /// Output CSV path for the reconstructed series
    #[arg(long, default_value = "output.csv")]
    output: PathBuf,

    /// Write the series in long format (exchange, ticker, date, score)
    /// instead of one column per item
    #[arg(long)]
    long: bool,

    /// Where to write the list of items dropped for having no signal
    #[arg(long)]
    empty_out: Option<PathBuf>,

    /// Trends service base URL
    #[arg(long)]
    endpoint: Option<String>,

    /// Bearer token for the service (also reads TRENDRANK_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// Time window for every query (e.g. "all", "today 5-y")
    #[arg(long)]
    timeframe: Option<String>,

    /// Category filter id (e.g. 16 = news)
    #[arg(long)]
    category: Option<u32>,

    /// Content source filter (e.g. "news"); empty = web search
    #[arg(long)]
    gprop: Option<String>,

    /// Geography filter (e.g. "US"); empty = worldwide
    #[arg(long)]
    geo: Option<String>,

    /// Max retries per oracle call on transient failures
    #[arg(long)]
    retries: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Cache file path. Queries already resolved here cost nothing.
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Save the cache after this many newly resolved keys
    #[arg(long)]
    checkpoint_interval: Option<usize>,

    /// Max items per filter batch (the oracle's group-size bound)
    #[arg(long, default_value_t = constants::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// How often a zero-reading item is re-batched before it is dropped
    #[arg(long, default_value_t = constants::DEFAULT_MAX_REQUEUE)]
    max_requeue: usize,

    /// Buckets with |diff-to-pivot| above this get recursively re-sorted
    #[arg(long, default_value_t = constants::DEFAULT_REFINE_THRESHOLD)]
    refine_threshold: i32,

    /// Also recursively re-sort exact ties with the pivot
    #[arg(long)]
    refine_zero_bucket: bool,

    /// Path to config file (default: ~/.config/trendrank/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show per-query progress
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Rank(args) => run_rank(args).await,
        Commands::Init => {
            let path = config::create_default_config();
            println!("Created config at {}", path.display());
            println!("Edit it to set your default endpoint, timeframe, etc.");
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "trendrank_core=debug,trendrank_cli=debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_rank(args: RankArgs) {
    init_tracing(args.verbose);

    // Load config file, merge with CLI args (CLI wins)
    let config_path = args.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);

    let endpoint = args.endpoint.clone()
        .or(cfg.endpoint)
        .unwrap_or_else(|| {
            bail(format!("No endpoint specified. Pass --endpoint or set it in {}", config_path.display()));
        });
    let api_key = args.api_key.clone()
        .or_else(|| std::env::var("TRENDRANK_API_KEY").ok())
        .or(cfg.api_key);

    let request = RequestConfig {
        timeframe: args.timeframe.clone().or(cfg.timeframe).unwrap_or_else(|| "all".to_string()),
        category: args.category.or(cfg.category).unwrap_or(16),
        gprop: args.gprop.clone().or(cfg.gprop).unwrap_or_else(|| "news".to_string()),
        geo: args.geo.clone().or(cfg.geo).unwrap_or_default(),
    };

    let items = input::read_items(&args.input, args.limit);
    if items.is_empty() {
        bail(format!("No items found in {}", args.input.display()));
    }

    info!(
        items = items.len(),
        timeframe = %request.timeframe,
        category = request.category,
        "starting ranking run"
    );

    let oracle = TrendsOracle::new(TrendsClientConfig {
        endpoint,
        api_key,
        request: request.clone(),
        max_retries: args.retries.or(cfg.retries).unwrap_or(3),
        timeout: Duration::from_secs(args.timeout_secs.or(cfg.timeout_secs).unwrap_or(30)),
    })
    .unwrap_or_else(|e| bail(e));

    let cache_path = args.cache.clone()
        .or(cfg.cache.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("cache.json"));
    let checkpoint_interval = args.checkpoint_interval
        .or(cfg.checkpoint_interval)
        .unwrap_or(constants::DEFAULT_CHECKPOINT_INTERVAL);

    let mut cache = ComparisonCache::open(
        oracle,
        JsonFileStore::new(&cache_path),
        &request,
        checkpoint_interval,
    )
    .unwrap_or_else(|e| bail(e));

    let options = RankOptions {
        filter: FilterOptions {
            batch_size: args.batch_size,
            max_requeue: args.max_requeue,
        },
        sort: SortOptions {
            refine_threshold: args.refine_threshold,
            refine_zero_bucket: args.refine_zero_bucket,
        },
    };

    let result = run_ranking(&mut cache, &items, &options).await;

    // Everything resolved before an abort stays reusable: flush on every
    // exit path, success or not.
    if let Err(e) = cache.flush() {
        eprintln!("Warning: failed to save cache to {}: {e}", cache_path.display());
    }

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(RunError::AllItemsFiltered) => {
            println!("No item in the input has any trend data; nothing to rank.");
            return;
        }
        Err(RunError::Oracle(e)) => {
            bail(format!(
                "{e}\nResults fetched so far are saved in {} and will be reused on the next run.",
                cache_path.display()
            ));
        }
        Err(e) => bail(e),
    };

    if args.long {
        output::write_long_csv(&outcome.series, &args.output);
    } else {
        output::write_wide_csv(&outcome.series, &args.output);
    }
    if let Some(ref empty_out) = args.empty_out {
        output::write_empty_items(&outcome.empty, empty_out);
    }

    println!(
        "Ranked {} items ({} dropped) using {} oracle calls this run.",
        outcome.ranked.len(),
        outcome.empty.len(),
        outcome.oracle_calls,
    );
    println!("Series written to {}", args.output.display());
    if let Some(empty_out) = args.empty_out {
        println!("Dropped items written to {}", empty_out.display());
    }
}
