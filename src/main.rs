use anyhow::{Context, Result};
use clap::Parser;
use daily_news::config::Config;
use daily_news::llm::openrouter::OpenRouter;
use daily_news::pipeline::{Pipeline, RunOptions};
use daily_news::writer;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_DIR: &str = "logs";

/// Gather, filter and rank recent news on a topic into a JSON file.
#[derive(Parser, Debug)]
#[command(name = "daily-news", version, about)]
struct Cli {
    /// Topic to research, e.g. "AI advancements".
    topic: String,

    /// Maximum number of deepen cycles after the planned queries.
    #[arg(short, long, default_value_t = 2)]
    depth: u32,

    /// Recency window in hours.
    #[arg(short, long, default_value_t = 48, value_parser = clap::value_parser!(u32).range(1..))]
    window: u32,

    /// Directory the JSON report is written to.
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Maximum number of articles in the report.
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..))]
    limit: u32,

    /// TOML config file; the built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_logging(started: chrono::DateTime<chrono::Local>) -> Result<PathBuf> {
    std::fs::create_dir_all(LOG_DIR)
        .with_context(|| format!("failed to create log directory {}", LOG_DIR))?;
    let path = Path::new(LOG_DIR).join(started.format("%Y-%m-%d_%H-%M-%S.log").to_string());
    let log_file = std::fs::File::create(&path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("daily_news=debug"));

    // Full detail goes to the file; the console only sees info and above.
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(log_file))
                .with_filter(filter),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(LevelFilter::INFO),
        )
        .init();
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.topic.trim().is_empty() {
        anyhow::bail!("topic must not be empty");
    }

    let log_path = init_logging(chrono::Local::now())?;

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::embedded()?,
    };

    // Load saved keys from .env (real env vars take precedence)
    Config::load_env_file();
    let api_key = Config::openrouter_api_key()?;

    println!();
    println!("  daily-news v{}", env!("CARGO_PKG_VERSION"));
    println!("  topic: {}  depth: {}  window: {}h  limit: {}", cli.topic, cli.depth, cli.window, cli.limit);
    println!("  log: {}", log_path.display());
    println!();

    let model = OpenRouter::new(
        api_key,
        &config.openrouter.base_url,
        config.openrouter.request_timeout_ms,
    )?;
    let pipeline = Pipeline::new(&config, &model);
    let opts = RunOptions {
        topic: cli.topic.clone(),
        depth: cli.depth,
        window_hours: cli.window,
        limit: cli.limit as usize,
        now: chrono::Utc::now(),
    };

    let report = match pipeline.run(&opts).await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("run failed: {:#}", e);
            return Err(e);
        }
    };
    let path = writer::write_report(&cli.output, &report)?;

    for (rank, item) in report.items.iter().enumerate() {
        println!(
            "  {:>2}. [{:.2}] {} ({})",
            rank + 1,
            item.score,
            item.article.title,
            item.article.source
        );
    }
    println!();
    println!(
        "  {} item(s) from {} search(es), {} deepen cycle(s) -> {}",
        report.summary.count,
        report.summary.searches,
        report.summary.deepen_cycles,
        path.display()
    );
    Ok(())
}
