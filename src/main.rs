//! rss-daily-digest: fetch feeds, filter, build the daily and trend reports,
//! deliver them to a Feishu bot.

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use chrono::{FixedOffset, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rss_daily_digest::history::{ReportStore, DEFAULT_REPORTS_DIR};
use rss_daily_digest::ingest::config::{self as source_config, load_sources_from};
use rss_daily_digest::notify::FeishuNotifier;
use rss_daily_digest::pipeline::{load_word_groups_or_empty, DailyProcessor};
use rss_daily_digest::word_groups;

#[derive(Parser, Debug)]
#[command(
    name = "rss-daily-digest",
    about = "RSS keyword digest delivered to a Feishu bot",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Feishu bot webhook URL
    #[arg(long, env = "FEISHU_WEBHOOK_URL", hide_env_values = true)]
    webhook_url: Option<String>,

    /// Source config (JSON or TOML); defaults to $RSS_SOURCES_PATH or config/rss_sources.json
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keyword group rules; defaults to $FREQUENCY_WORDS_PATH or config/frequency_words.txt
    #[arg(long)]
    word_groups: Option<PathBuf>,

    /// Directory for daily JSON snapshots
    #[arg(long, default_value = DEFAULT_REPORTS_DIR)]
    reports_dir: PathBuf,

    /// Hours east of UTC used for report dates and times
    #[arg(long, default_value_t = 0, allow_hyphen_values = true,
          value_parser = clap::value_parser!(i32).range(-12..=14))]
    utc_offset_hours: i32,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    log_level: String,

    /// Also append logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Serve Prometheus metrics on this address while the command runs
    #[arg(long, env = "METRICS_ADDR")]
    metrics_addr: Option<SocketAddr>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Generate and send today's digest (default)
    Run,
    /// Send a test message to the webhook
    Test,
    /// Show statistics of today's saved report
    Stats,
}

/// `RUST_LOG` wins; otherwise `--log-level` is mapped to an `EnvFilter` directive.
fn setup_logging(log_level: &str, log_file: Option<&Path>) -> Result<()> {
    let level = match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" => "warn",
        "ERROR" => "error",
        _ => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating log dir {}", dir.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn offset(hours: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(hours * 3600).context("utc offset out of range")
}

fn notifier(cli: &Cli) -> Result<FeishuNotifier> {
    match cli.webhook_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Ok(FeishuNotifier::new(url)),
        _ => bail!("FEISHU_WEBHOOK_URL is not set (use --webhook-url or the env var)"),
    }
}

fn processor(cli: &Cli) -> Result<DailyProcessor> {
    let config_path = cli.config.clone().unwrap_or_else(source_config::default_path);
    let config = load_sources_from(&config_path).context("loading source config")?;
    let groups_path = cli.word_groups.clone().unwrap_or_else(word_groups::default_path);

    Ok(DailyProcessor::from_config(config)
        .with_word_groups(load_word_groups_or_empty(&groups_path))
        .with_store(ReportStore::new(&cli.reports_dir))
        .with_offset(offset(cli.utc_offset_hours)?))
}

async fn run(cli: Cli) -> Result<()> {
    if let Some(addr) = cli.metrics_addr {
        rss_daily_digest::metrics::serve_prometheus(addr)?;
    }
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let notifier = notifier(&cli)?;
            let outcome = processor(&cli)?.run(&notifier, Utc::now()).await?;
            println!(
                "✅ digest sent: {} fetched, {} kept",
                outcome.fetched, outcome.kept
            );
        }
        Command::Test => {
            let notifier = notifier(&cli)?;
            processor(&cli)?.test_connection(&notifier).await?;
            println!("connection test: ok");
        }
        Command::Stats => {
            let today = Utc::now()
                .with_timezone(&offset(cli.utc_offset_hours)?)
                .date_naive();
            let store = ReportStore::new(&cli.reports_dir);
            match store.statistics(today)? {
                Some(stats) => {
                    println!("total articles: {}", stats.total_articles);
                    for (source, count) in &stats.top_sources {
                        println!("  - {source}: {count}");
                    }
                }
                None => println!("no report for {today}"),
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(e) = setup_logging(&cli.log_level, cli.log_file.as_deref()) {
        eprintln!("logging setup failed: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run failed");
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}
