use billdata::prelude::*;
use billdata::{processor, similarity, store};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Bill metadata aggregation and identical-bill resolution
#[derive(Parser, Debug)]
#[command(name = "billdata")]
#[command(about = "Generate bill metadata from congressional bill-status data")]
#[command(version)]
struct Args {
    /// Increase log verbosity (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the bill data directory and write the metadata index
    Update {
        /// Bill data directory (default: ../congress/data, or BILLDATA_DIR env var)
        #[arg(long = "data-dir")]
        data_dir: Option<PathBuf>,

        /// Output path for the metadata index (a .gz sibling is written too)
        #[arg(long = "meta-path")]
        meta_path: Option<PathBuf>,

        /// YAML config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only walk one congress: a number, "current" or "all"
        #[arg(long)]
        congress: Option<String>,

        /// Save a checkpoint after this many new bills
        #[arg(long = "save-every")]
        save_every: Option<usize>,

        /// Skip the gzip sibling
        #[arg(long = "no-gzip")]
        no_gzip: bool,

        /// Load the existing index before walking
        #[arg(long)]
        resume: bool,
    },

    /// Print the metadata entry for one bill
    Show {
        /// Bill key, e.g. 116hr299
        key: String,

        #[arg(long = "meta-path", default_value = billdata::config::DEFAULT_META_PATH)]
        meta_path: PathBuf,

        /// Read the uncompressed index instead of the .gz sibling
        #[arg(long)]
        plain: bool,
    },

    /// Stream extracted bill records as JSON lines
    Records {
        /// Bill data directory (default: ../congress/data, or BILLDATA_DIR env var)
        #[arg(long = "data-dir")]
        data_dir: Option<PathBuf>,

        /// Drop titles that cover only part of a bill
        #[arg(long = "whole-bill-only")]
        whole_bill_only: bool,

        /// Title stage filter: ih, rh, or all
        #[arg(long, default_value = "all")]
        stage: String,

        /// Cosponsor fields to keep, comma-separated (empty keeps all)
        #[arg(long, default_value = "name,bioguide_id")]
        fields: String,

        /// Limit number of results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Build the detail-page context for a bill from a JSON repository fixture
    Detail {
        /// Repository fixture (bills, legislators, crs_reports)
        fixture: PathBuf,

        /// Bill key, e.g. 116hr299
        key: String,
    },

    /// Show the similarity rows between two bills from a JSON repository fixture
    Compare {
        /// Repository fixture (bills, legislators, crs_reports)
        fixture: PathBuf,

        /// Bill key, e.g. 116hr299
        key: String,

        /// The bill to compare against
        second: String,
    },

    /// Summarize a similarity result file (JSON array of matches)
    Similar {
        results: PathBuf,

        /// Also resolve identical bills for this key
        #[arg(long)]
        key: Option<String>,
    },

    /// Print the congress currently in session
    Congress,
}

fn print_available_commands() {
    println!("Available commands:");
    println!("  update    Walk the bill data directory and write the metadata index");
    println!("  show      Print the metadata entry for one bill");
    println!("  records   Stream extracted bill records as JSON lines");
    println!("  detail    Build the detail-page context for a bill");
    println!("  compare   Show the similarity rows between two bills");
    println!("  similar   Summarize a similarity result file");
    println!("  congress  Print the congress currently in session");
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn get_data_dir(data_dir: Option<PathBuf>) -> Option<PathBuf> {
    // Flag first, then environment variable
    data_dir.or_else(|| std::env::var("BILLDATA_DIR").ok().map(PathBuf::from))
}

#[allow(clippy::too_many_arguments)]
fn run_update_command(
    current: CongressSession,
    data_dir: Option<PathBuf>,
    meta_path: Option<PathBuf>,
    config: Option<PathBuf>,
    congress: Option<String>,
    save_every: Option<usize>,
    no_gzip: bool,
    resume: bool,
) -> anyhow::Result<()> {
    let mut builder = ConfigBuilder::new(billdata::config::DEFAULT_DATA_DIR, current);

    if let Some(path) = config {
        builder = builder.file(FileConfig::load(&path)?)?;
    }
    if let Some(dir) = get_data_dir(data_dir) {
        builder = builder.data_dir(dir);
    }
    if let Some(path) = meta_path {
        builder = builder.meta_path(path);
    }
    if let Some(congress) = congress {
        builder = builder.congress_str(&congress)?;
    }
    if let Some(n) = save_every {
        builder = builder.save_every(n);
    }
    if no_gzip {
        builder = builder.compress(false);
    }

    let config = builder.resume(resume).build()?;

    let existing = if config.resume {
        let meta = store::load_bills_meta(&config.meta_path, config.compress)?;
        info!("Resuming from {} existing bills", meta.len());
        meta
    } else {
        BillsMeta::new()
    };

    let mut aggregator = BillsMetaAggregator::new(config, existing);
    let report = aggregator.run()?;

    for skipped in &report.skipped {
        warn!("Skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    println!("{}", serde_json::to_string(report)?);
    Ok(())
}

fn run_show_command(key: String, meta_path: PathBuf, plain: bool) -> anyhow::Result<()> {
    let meta = store::load_bills_meta(&meta_path, !plain)?;
    let key = BillKey::new(key);
    match meta.get(&key) {
        Some(entry) => {
            println!("{}", serde_json::to_string_pretty(entry)?);
            Ok(())
        }
        None => Err(anyhow::anyhow!("No metadata for {}", key)),
    }
}

async fn run_records_command(
    data_dir: Option<PathBuf>,
    whole_bill_only: bool,
    stage: String,
    fields: String,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let root = get_data_dir(data_dir)
        .unwrap_or_else(|| PathBuf::from(billdata::config::DEFAULT_DATA_DIR));

    let options = RecordOptions {
        include_partial: !whole_bill_only,
        stage: Stage::from(stage.as_str()),
        cosponsor_fields: fields
            .split(',')
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect(),
        limit,
    };

    let mut stream = processor::stream_records(root, options);

    // Write JSON to stdout (one per line)
    while let Some(result) = stream.next().await {
        match result {
            Ok(summary) => {
                let json = serde_json::to_string(&summary)?;
                println!("{}", json);
            }
            Err(e) => {
                warn!("Error: {}", e);
            }
        }
    }

    Ok(())
}

fn run_detail_command(fixture: PathBuf, key: String) -> anyhow::Result<()> {
    let repo = MemoryRepository::load(&fixture)?;
    let detail = BillDetail::load(&repo, &BillKey::new(key))?;
    let context = detail.context()?;

    for skipped in context.cosponsor_lookups.skipped() {
        info!("Cosponsor {} not current: {:?}", skipped.bioguide_id, skipped.outcome);
    }
    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(())
}

fn run_compare_command(fixture: PathBuf, key: String, second: String) -> anyhow::Result<()> {
    let repo = MemoryRepository::load(&fixture)?;
    let detail = BillDetail::load(&repo, &BillKey::new(key))?;
    let comparison = detail.compare(&BillKey::new(second))?;
    println!("{}", serde_json::to_string_pretty(&comparison)?);
    Ok(())
}

fn run_similar_command(results: PathBuf, key: Option<String>) -> anyhow::Result<()> {
    let contents = std::fs::read_to_string(&results)?;
    let matches: Vec<SimilarityMatch> = serde_json::from_str(&contents)?;

    let identical = key.map(|key| {
        let key = BillKey::new(key);
        let score = similarity::current_bill_score(&key, &matches);
        similarity::resolve_identical(&key, &matches, score)
    });

    let summary = similarity::summarize_similar(matches);
    let output = serde_json::json!({
        "summary": summary,
        "identical_bill_numbers": identical,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Computed once; everything downstream takes it as a value
    let current = CongressSession::current();

    match args.command {
        Some(Command::Update {
            data_dir,
            meta_path,
            config,
            congress,
            save_every,
            no_gzip,
            resume,
        }) => {
            // The walk is blocking and single-threaded
            tokio::task::spawn_blocking(move || {
                run_update_command(
                    current, data_dir, meta_path, config, congress, save_every, no_gzip, resume,
                )
            })
            .await?
        }
        Some(Command::Show {
            key,
            meta_path,
            plain,
        }) => run_show_command(key, meta_path, plain),
        Some(Command::Records {
            data_dir,
            whole_bill_only,
            stage,
            fields,
            limit,
        }) => run_records_command(data_dir, whole_bill_only, stage, fields, limit).await,
        Some(Command::Detail { fixture, key }) => run_detail_command(fixture, key),
        Some(Command::Compare {
            fixture,
            key,
            second,
        }) => run_compare_command(fixture, key, second),
        Some(Command::Similar { results, key }) => run_similar_command(results, key),
        Some(Command::Congress) => {
            println!("{}", serde_json::to_string(&current)?);
            Ok(())
        }
        None => {
            print_available_commands();
            Ok(())
        }
    }
}
