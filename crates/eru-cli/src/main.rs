//! Eru CLI
//!
//! CLI tool for inspecting, editing and replaying block statistics stored in
//! a JSON state file with the same `{stats, protected}` layout the extension
//! keeps in its storage.

mod logger;
mod replay;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use eru_core::summary::{format_count, top_entries, AdminSummary, DEFAULT_TOP_LIMIT};
use eru_core::types::Counts;
use eru_core::url::normalize_host;
use eru_core::{EngineConfig, FileBackend, StatsStore};

#[derive(Parser)]
#[command(name = "eru-cli")]
#[command(about = "Eru ad blocker statistics tools")]
struct Cli {
    /// JSON state file
    #[arg(short, long, global = true, default_value = "eru-stats.json")]
    store: PathBuf,

    /// Engine config (excluded domains, rule categories, resource labels)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the aggregate stats record
    Stats {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Show protected sites
    Protected {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the admin panel summary
    Summary {
        /// Rows per ranked list
        #[arg(short, long, default_value_t = DEFAULT_TOP_LIMIT)]
        limit: usize,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Record blocked items by hand
    Record {
        /// Host, URL or initiator the block is attributed to
        domain: String,

        /// Ad category
        #[arg(long, default_value = "Other")]
        category: String,

        /// Detection method label
        #[arg(long, default_value = "Other")]
        method: String,

        #[arg(long, default_value_t = 1)]
        count: u64,
    },

    /// Zero all stats and clear protected sites
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Replay an NDJSON event log through the producers
    Replay {
        /// Event log file
        #[arg(short, long)]
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a host or URL would be keyed and whether it is excluded
    Check {
        input: String,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init(cli.verbose) {
        eprintln!("Failed to install logger: {e}");
    }

    let result = run(cli);

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = load_config(cli.config.as_deref())?;
    let store = Arc::new(StatsStore::new(
        FileBackend::new(&cli.store),
        Arc::new(config.exclusion_set()),
    ));

    match cli.command {
        Commands::Stats { json } => cmd_stats(&store, json),
        Commands::Protected { json } => cmd_protected(&store, json),
        Commands::Summary { limit, json } => cmd_summary(&store, limit, json),
        Commands::Record {
            domain,
            category,
            method,
            count,
        } => cmd_record(&store, &domain, &category, &method, count),
        Commands::Reset { yes } => cmd_reset(&store, yes),
        Commands::Replay { input, json } => cmd_replay(store, &config, &input, json),
        Commands::Check { input } => cmd_check(&store, &input),
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, String> {
    match path {
        Some(path) => EngineConfig::load(path).map_err(|e| e.to_string()),
        None => Ok(EngineConfig::default()),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("Failed to serialize: {}", e))
}

fn print_counts(title: &str, counts: &Counts) {
    println!("{}:", title);
    if counts.is_empty() {
        println!("  (none)");
        return;
    }
    for entry in top_entries(counts, usize::MAX) {
        println!("  {:<32} {:>10}", entry.label, format_count(entry.value));
    }
}

fn cmd_stats(store: &StatsStore<FileBackend>, json: bool) -> Result<(), String> {
    let record = store.read();
    if json {
        println!("{}", to_json(&record)?);
        return Ok(());
    }

    println!("Total blocked: {}", format_count(record.total_blocked));
    println!("Last reset:    {} ms since epoch", record.last_reset);
    println!();
    print_counts("By domain", &record.by_domain);
    print_counts("By category", &record.by_category);
    print_counts("By method", &record.by_method);
    Ok(())
}

fn cmd_protected(store: &StatsStore<FileBackend>, json: bool) -> Result<(), String> {
    let sites = store.read_protected();
    if json {
        println!("{}", to_json(&sites)?);
    } else {
        print_counts("Protected sites", &sites);
    }
    Ok(())
}

fn cmd_summary(store: &StatsStore<FileBackend>, limit: usize, json: bool) -> Result<(), String> {
    let summary = AdminSummary::build(&store.read(), &store.read_protected(), limit);
    if json {
        println!("{}", to_json(&summary)?);
        return Ok(());
    }

    println!("Total blocked:   {}", format_count(summary.total_blocked));
    println!("Protected sites: {}", summary.protected_count);
    println!("Ad categories:   {}", summary.category_count);
    let sections = [
        ("Top sites", &summary.top_sites),
        ("Protected sites", &summary.protected_sites),
        ("Ad types", &summary.ad_types),
        ("Block methods", &summary.block_methods),
    ];
    for (title, entries) in sections {
        println!();
        println!("{}:", title);
        if entries.is_empty() {
            println!("  No data yet.");
        }
        for entry in entries {
            println!("  {:<32} {:>10}", entry.label, format_count(entry.value));
        }
    }
    Ok(())
}

fn cmd_record(
    store: &StatsStore<FileBackend>,
    domain: &str,
    category: &str,
    method: &str,
    count: u64,
) -> Result<(), String> {
    if store.exclusions().contains_in(domain) {
        println!("'{}' is excluded; nothing recorded", domain);
        return Ok(());
    }
    if !store.record_block(domain, category, method, count) {
        return Err(format!("Failed to record block for '{}'", domain));
    }
    println!("Recorded {} block(s); total now {}", count, format_count(store.read().total_blocked));
    Ok(())
}

fn cmd_reset(store: &StatsStore<FileBackend>, yes: bool) -> Result<(), String> {
    if !yes {
        return Err("Refusing to reset all stats and protected site data without --yes".to_string());
    }
    if !store.reset() {
        return Err(format!("Failed to reset '{}'", store.backend().path().display()));
    }
    println!("Reset stats and protected sites in '{}'", store.backend().path().display());
    Ok(())
}

fn cmd_replay(
    store: Arc<StatsStore<FileBackend>>,
    config: &EngineConfig,
    input: &Path,
    json: bool,
) -> Result<(), String> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| format!("Failed to start runtime: {}", e))?;
    let report = runtime.block_on(replay::run_replay(Arc::clone(&store), config, input))?;

    if json {
        println!("{}", to_json(&report)?);
        return Ok(());
    }

    println!("Replayed '{}'", input.display());
    println!("  Events:    {} ({} unparseable lines skipped)", report.events, report.skipped_lines);
    println!("  Applied:   {}", report.applied);
    println!("  Ignored:   {}", report.ignored);
    println!("  Async:     {}", report.async_replies);
    println!("  Writes:    {}", report.writes);
    println!("  Time:      {}ms", report.elapsed_ms);
    println!("  Total now: {}", format_count(store.read().total_blocked));
    Ok(())
}

fn cmd_check(store: &StatsStore<FileBackend>, input: &str) -> Result<(), String> {
    let exclusions = store.exclusions();
    println!("Input:     {}", input);
    println!("Key:       {}", normalize_host(input).unwrap_or_else(|| eru_core::DIRECT_DOMAIN.to_string()));
    println!("Excluded:  {}", exclusions.contains_in(input));
    Ok(())
}
