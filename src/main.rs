#![forbid(unsafe_code)]
#![deny(warnings, clippy::all, clippy::pedantic)]

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use unmerged::{
    AuditError, CacheStore, Clock, DefaultClock, DefaultCommandRunner, DiskStore, Options,
    QueryCache, collect_branch_records, ensure_git, hub_available,
    output::{TabStyle, format_tab, to_json},
    render_report, resolve_repo_identity, summarize_authors, write_report,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Tab,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Audit branches not merged into mainline and render an HTML report."
)]
struct Args {
    /// Repository to audit (default: current directory)
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Only keep branches whose last commit is at least this many days old (0 = no filter)
    #[arg(long, default_value_t = 0)]
    older_than_days: u64,

    /// Audit remote-tracking branches instead of local ones
    #[arg(long)]
    remote: bool,

    /// Inspect at most N branches in listing order (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    limit: usize,

    /// Mainline branch name (default: detected from the remote HEAD, falling back to main)
    #[arg(long)]
    mainline: Option<String>,

    /// Report destination (default: stale-branches.html in the documents directory)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Delete the command cache before running
    #[arg(long)]
    clean_cache: bool,

    /// Cache freshness window in minutes
    #[arg(long, default_value_t = 60)]
    cache_minutes: u64,

    /// Console output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Tab)]
    output: OutputFormat,

    /// Table style to use with --output tab
    #[arg(long, value_enum, default_value_t = TabStyle::Rounded)]
    tab_style: TabStyle,

    /// Print debug info while scanning
    #[arg(long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), AuditError> {
    let opts = Options {
        repo: args.repo.clone(),
        mainline: args.mainline.clone(),
        older_than_days: args.older_than_days,
        remote: args.remote,
        limit: args.limit,
        debug: args.debug,
    };
    let runner = DefaultCommandRunner;
    let clock = DefaultClock;
    let store = DiskStore::in_temp();
    if args.clean_cache {
        store.clear();
    }

    ensure_git(&runner, &opts.repo)?;
    let hub = hub_available(&runner, &opts.repo);
    if !hub {
        eprintln!("[warn] GitHub CLI not found; pull request checks are disabled");
    }

    let cache = QueryCache::new(&store, Duration::from_secs(args.cache_minutes * 60));
    let records = collect_branch_records(&opts, &runner, &cache, &clock, hub);
    let authors = summarize_authors(&records);
    let identity = resolve_repo_identity(&opts, &runner, &cache, &clock);

    let generated: DateTime<Utc> = clock.now().into();
    let html = render_report(&records, &authors, &identity, generated);
    let out_path = args.out.clone().unwrap_or_else(default_report_path);
    write_report(&out_path, &html)?;

    match args.output {
        OutputFormat::Tab => println!("{}", format_tab(&records, args.tab_style)),
        OutputFormat::Json => println!("{}", to_json(&records, &authors)),
    }
    println!(
        "wrote report: {} ({} stale branches)",
        out_path.display(),
        records.len()
    );
    Ok(())
}

fn default_report_path() -> PathBuf {
    dirs::document_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stale-branches.html")
}
