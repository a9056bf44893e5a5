//! pgworkload command-line tool
//!
//! Runs the configured benchmark sweep against every target, prints generated
//! workloads without touching a database, or checks that targets are reachable.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use pgworkload::config::{BenchConfig, DEFAULT_CONFIG_FILE};
use pgworkload::workload::{build_workload, StatementKind};
use pgworkload::{PostgresConnector, RunSummary, TrialRunner};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use tracing::Subscriber;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const TRACE_FILTER_ENV: &str = "PGWORKLOAD_TRACE";

#[derive(Parser)]
#[command(name = "pgworkload")]
#[command(about = "Randomized SQL workload benchmark for PostgreSQL")]
#[command(version = "0.1.0")]
struct Cli {
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the benchmark sweep against every configured target
    Run {
        /// Configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Override the configured RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Write Prometheus metrics here once the run finishes
        #[arg(long)]
        metrics_file: Option<PathBuf>,

        /// Do not health-check targets before the first trial
        #[arg(long)]
        skip_check: bool,
    },

    /// Print a generated workload without connecting to a database
    Generate {
        /// Number of tables
        #[arg(long)]
        tables: usize,

        /// Seed rows inserted into each table
        #[arg(long)]
        entries: usize,

        /// Random CRUD statements after the seed inserts
        #[arg(long)]
        queries: usize,

        /// RNG seed (default: OS entropy)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Connect to every configured target and run a health check
    Check {
        /// Configuration file
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,
    },
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
    init_tracing(default_filter);

    let result = match cli.command {
        Commands::Run {
            config,
            seed,
            metrics_file,
            skip_check,
        } => handle_run(&config, seed, metrics_file.as_deref(), skip_check, cli.quiet),
        Commands::Generate {
            tables,
            entries,
            queries,
            seed,
        } => handle_generate(tables, entries, queries, seed),
        Commands::Check { config } => handle_check(&config),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Span close events (with busy/idle time) go to stderr. `PGWORKLOAD_TRACE`
/// takes an `EnvFilter` directive and overrides the verbosity flags.
fn init_tracing(default_filter: &str) {
    let directive = trace_directive(std::env::var(TRACE_FILTER_ENV).ok(), default_filter);
    if let Err(e) = span_subscriber(EnvFilter::new(directive), std::io::stderr).try_init() {
        log::warn!("tracing subscriber not installed: {}", e);
    }
}

fn trace_directive(from_env: Option<String>, default_filter: &str) -> String {
    match from_env {
        Some(directive) if !directive.trim().is_empty() => directive,
        _ => format!("pgworkload={default_filter}"),
    }
}

fn span_subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(writer)
        .finish()
}

fn load_config(path: &Path) -> Result<BenchConfig> {
    BenchConfig::load_from(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}

fn handle_run(
    config_path: &Path,
    seed: Option<u64>,
    metrics_file: Option<&Path>,
    skip_check: bool,
    quiet: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if seed.is_some() {
        config.bench.seed = seed;
    }
    log::info!(
        "benchmarking {} target(s), {} trial(s) per sweep point, results in {}",
        config.targets.len(),
        config.bench.trials,
        config.bench.outdir
    );

    let mut runner = TrialRunner::new(config, PostgresConnector);
    if !skip_check {
        runner.check_targets().context("target health check failed")?;
    }
    let summary = runner.run().context("benchmark run failed")?;

    if let Some(path) = metrics_file {
        write_metrics(path)?;
    }
    if !quiet {
        print_summary(&summary);
    }
    Ok(())
}

#[cfg(feature = "metrics")]
fn write_metrics(path: &Path) -> Result<()> {
    let text = pgworkload::metrics::METRICS
        .encode()
        .context("failed to encode metrics")?;
    std::fs::write(path, text)
        .with_context(|| format!("failed to write metrics to {}", path.display()))?;
    log::info!("metrics written to {}", path.display());
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn write_metrics(_path: &Path) -> Result<()> {
    bail!("--metrics-file requires the `metrics` feature")
}

fn print_summary(summary: &RunSummary) {
    println!("\ntarget,tables,entries,mean_seconds");
    for ((target, point), mean) in summary.mean_durations() {
        println!(
            "{},{},{},{:.4}",
            target,
            point.tables,
            point.entries,
            mean.as_secs_f64()
        );
    }
}

fn handle_generate(tables: usize, entries: usize, queries: usize, seed: Option<u64>) -> Result<()> {
    if tables == 0 && queries > 0 {
        bail!("--queries needs at least one table to operate on");
    }
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let workload = build_workload(&mut rng, queries, tables, entries);

    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for statement in workload.statements() {
        println!("{statement}");
        *counts.entry(statement.kind().as_str()).or_default() += 1;
    }
    log::info!(
        "generated {} statements: {}",
        workload.len(),
        summarize_kinds(&counts)
    );
    Ok(())
}

fn summarize_kinds(counts: &BTreeMap<&'static str, usize>) -> String {
    StatementKind::ALL
        .iter()
        .filter_map(|kind| {
            counts
                .get(kind.as_str())
                .map(|count| format!("{} {}", count, kind.as_str()))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn handle_check(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let runner = TrialRunner::new(config, PostgresConnector);
    runner.check_targets()?;
    println!("All targets healthy");
    Ok(())
}
