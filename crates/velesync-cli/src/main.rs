//! VelesSync CLI
//!
//! Usage:
//!   `velesync run monitor --threads 8`
//!   `velesync run rwlock --priority fair --roles r,w,r,r`
//!   `velesync run range-search --threads 16 --records 5000000`
//!   `velesync config show`

// CLI tool - relax pedantic lints for ergonomics
#![allow(clippy::pedantic)]

use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::path::PathBuf;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use velesync_cli::{run, Date, HarnessConfig, OutputSink, RunReport, Scenario};
use velesync_core::Priority;

#[derive(Parser)]
#[command(name = "velesync")]
#[command(
    author,
    version,
    about = "VelesSync CLI - thread synchronization primitives harness"
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario and report per-worker timings
    Run {
        /// Scenario: spinlock, semaphore, monitor, barrier, mutex, rwlock, range_search
        scenario: Scenario,

        /// Number of worker threads
        #[arg(short, long)]
        threads: Option<usize>,

        /// Length of each worker's random payload
        #[arg(short, long)]
        symbols: Option<usize>,

        /// Semaphore permit count
        #[arg(long)]
        permits: Option<usize>,

        /// Break the barrier on this arrival (zero-based) instead of waiting
        #[arg(long, value_name = "N")]
        break_after: Option<usize>,

        /// Readers-writer policy: reader, writer, fair
        #[arg(long)]
        priority: Option<Priority>,

        /// Comma-separated worker roles for the rwlock scenario (r/w)
        #[arg(long, value_delimiter = ',')]
        roles: Option<Vec<velesync_cli::Role>>,

        /// Minimum rwlock hold time in milliseconds
        #[arg(long)]
        min_hold_ms: Option<u64>,

        /// Maximum rwlock hold time in milliseconds
        #[arg(long)]
        max_hold_ms: Option<u64>,

        /// Number of random dates for the range search
        #[arg(long)]
        records: Option<usize>,

        /// Inclusive lower bound of the range search (YYYY-MM-DD)
        #[arg(long)]
        from: Option<Date>,

        /// Inclusive upper bound of the range search (YYYY-MM-DD)
        #[arg(long)]
        to: Option<Date>,

        /// Output file the workers write to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Validate the effective configuration
    Validate,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => HarnessConfig::load_from_path(path)?,
        None => HarnessConfig::load()?,
    };

    init_tracing(&config, cli.verbose);

    match cli.command {
        Commands::Run {
            scenario,
            threads,
            symbols,
            permits,
            break_after,
            priority,
            roles,
            min_hold_ms,
            max_hold_ms,
            records,
            from,
            to,
            output,
            json,
        } => {
            if let Some(threads) = threads {
                config.workload.threads = threads;
            }
            if let Some(symbols) = symbols {
                config.workload.symbols = symbols;
            }
            if let Some(permits) = permits {
                config.semaphore.permits = permits;
            }
            if break_after.is_some() {
                config.barrier.break_after = break_after;
            }
            if let Some(priority) = priority {
                config.rwlock.priority = priority;
            }
            if let Some(roles) = roles {
                config.rwlock.roles = roles;
            }
            if let Some(min) = min_hold_ms {
                config.rwlock.min_hold_ms = min;
            }
            if let Some(max) = max_hold_ms {
                config.rwlock.max_hold_ms = max;
            }
            if let Some(records) = records {
                config.search.records = records;
            }
            if let Some(from) = from {
                config.search.from = from;
            }
            if let Some(to) = to {
                config.search.to = to;
            }
            if let Some(output) = output {
                config.workload.output = output;
            }

            config.validate()?;
            debug!(?config, "effective configuration");

            let sink = OutputSink::create(&config.workload.output)?;
            let report = match run(&config, scenario, &sink) {
                Ok(report) => report,
                Err(e) => {
                    error!("Scenario failed: {}", e);
                    return Err(e.into());
                }
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
                println!(
                    "\n{} {} lines written to {}",
                    "✓".green(),
                    report.lines_written.to_string().green(),
                    config.workload.output.display()
                );
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", config.to_toml()?);
            }
            ConfigAction::Validate => match config.validate() {
                Ok(()) => println!("{} Configuration is valid", "✓".green()),
                Err(e) => {
                    eprintln!("{} {}", "Error:".red().bold(), e);
                    std::process::exit(1);
                }
            },
        },
    }

    Ok(())
}

/// Installs the stderr subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(config: &HarnessConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &RunReport) {
    println!(
        "\n{} {} ({} workers)\n",
        "Scenario:".bold(),
        report.scenario.to_string().cyan(),
        report.threads
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        ["worker", "outcome", "seconds"]
            .iter()
            .map(|c| Cell::new(c).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    for timing in &report.timings {
        table.add_row(vec![
            Cell::new(timing.id),
            Cell::new(timing.outcome),
            Cell::new(format!("{:.6}", timing.elapsed_secs)),
        ]);
    }
    println!("{table}");

    println!(
        "  {} {:.6}s  {} {:.6}s  {} {:.6}s",
        "min:".cyan(),
        report.min_secs(),
        "mean:".cyan(),
        report.mean_secs(),
        "max:".cyan(),
        report.max_secs()
    );
    println!(
        "  {} {}",
        "Peak concurrent writers:".cyan(),
        report.peak_concurrency
    );
    if let Some(search) = &report.search {
        println!(
            "  {} {} dates in {}..={}",
            "Range search:".cyan(),
            search.records,
            search.from,
            search.to
        );
        println!(
            "  {} {:.6}s, {} found",
            "Single-threaded:".cyan(),
            search.sequential_secs,
            search.sequential_matches
        );
        println!(
            "  {} {:.6}s, {} found ({:.2}x)",
            "Multi-threaded:".cyan(),
            search.parallel_secs,
            search.parallel_matches,
            search.speedup()
        );
    }
    if report.violations > 0 {
        println!(
            "  {} {}",
            "Exclusion violations:".red().bold(),
            report.violations
        );
    }
}
