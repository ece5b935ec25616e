//! docquery-ask - one-shot command line access to the document Q&A backend
//!
//! Uses the same configuration and search history as the terminal UI:
//! - History: $XDG_DATA_HOME/docquery/history.json
//! - Logs: $XDG_STATE_HOME/docquery/docquery.log
//! - Config: $XDG_CONFIG_HOME/docquery/config.toml

use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use docquery_core::format::{format_latency, format_relative_millis, format_score, format_size};
use docquery_core::{
    ApiClient, Backend, Config, QueryClient, QueryResult, QueryState, SearchHistory, StatsSnapshot,
    Submission,
};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::runtime::Handle;

#[derive(Parser)]
#[command(name = "docquery-ask")]
#[command(about = "Query the document Q&A backend from the command line")]
#[command(version)]
struct Args {
    /// Backend base URL (overrides config and DOCQUERY_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ask a question and print the answer with its sources
    Ask {
        /// The question (multiple words are joined with spaces)
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// List documents in the library
    Files {
        /// Only show documents whose name or preview contains this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Print the full text of one document
    Show {
        filename: String,
    },
    /// Print backend usage statistics
    Stats,
    /// Print recent questions
    History {
        /// Forget all recent questions
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(url) = args.api_url.clone() {
        config = config.with_api_url(url).context("invalid --api-url")?;
    }

    // Initialize logging
    let _log_guard =
        docquery_core::logging::init(&config).context("failed to initialize logging")?;

    tracing::info!("docquery-ask starting");

    match args.command {
        Command::Ask { ref question } => run_ask(&config, &question.join(" "), args.json).await,
        Command::Files { ref filter } => run_files(&config, filter.as_deref(), args.json).await,
        Command::Show { ref filename } => run_show(&config, filename, args.json).await,
        Command::Stats => run_stats(&config, args.json).await,
        Command::History { clear } => run_history(&config, clear, args.json),
    }
}

fn backend(config: &Config) -> Result<Arc<dyn Backend>> {
    let client = ApiClient::new(&config.api).context("failed to create API client")?;
    Ok(Arc::new(client))
}

/// Spinner on stderr, hidden when stderr is not a terminal
fn spinner(message: &str) -> Result<ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

async fn run_ask(config: &Config, question: &str, json: bool) -> Result<()> {
    let mut history = SearchHistory::load(Config::history_path(), config.history.cap);
    let mut client = QueryClient::new(backend(config)?, Handle::current(), config.api.timeout());

    match client.submit(question, &mut history) {
        Submission::Accepted => {}
        Submission::Empty => bail!("question must not be empty"),
        Submission::Busy => bail!("a search is already running"),
    }

    let pb = spinner("Searching...")?;
    let state = client.settle().await.clone();
    pb.finish_and_clear();

    match state {
        QueryState::Success(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
            Ok(())
        }
        QueryState::Error { error, .. } => {
            tracing::warn!(error = %error, "Query failed");
            bail!("{}", error.user_message())
        }
        QueryState::Idle | QueryState::Pending { .. } => bail!("search did not complete"),
    }
}

fn print_result(result: &QueryResult) {
    if !result.has_evidence() {
        println!("No direct evidence found.\n");
        println!("{}", result.answer);
        return;
    }

    println!("{}\n", result.answer);
    println!(
        "Confidence: {}   Matches: {}/{}   Retrieval: {}",
        result.confidence.display_name(),
        result.valid_count,
        result.retrieval_count,
        format_latency(result.retrieval_time_ms)
    );

    let sources = result.visible_sources();
    if sources.is_empty() {
        return;
    }

    println!("\nSources:");
    for source in sources {
        let relevance = if source.passed_threshold {
            ""
        } else {
            "  [low relevance]"
        };
        println!(
            "  {}  {}  {}{}",
            source.filename,
            format_score(source.score),
            source.confidence.display_name(),
            relevance
        );
        for line in source.content.lines() {
            println!("      {}", line);
        }
    }
}

async fn run_files(config: &Config, filter: Option<&str>, json: bool) -> Result<()> {
    let backend = backend(config)?;
    let pb = spinner("Loading documents...")?;
    let outcome = backend.list_files().await;
    pb.finish_and_clear();

    let listing = outcome.map_err(|e| anyhow::anyhow!(e.user_message()))?;
    let term = filter.unwrap_or("");
    let files: Vec<_> = listing.files.iter().filter(|f| f.matches(term)).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&files)?);
        return Ok(());
    }

    let total: u64 = listing.files.iter().map(|f| f.size_bytes).sum();
    println!(
        "{} document(s), {} total",
        listing.files.len(),
        format_size(total)
    );
    for file in files {
        println!(
            "  {:<40} {:>10} {:>7} lines",
            file.filename,
            format_size(file.size_bytes),
            file.line_count
        );
    }
    Ok(())
}

async fn run_show(config: &Config, filename: &str, json: bool) -> Result<()> {
    let backend = backend(config)?;
    let pb = spinner("Loading document...")?;
    let outcome = backend.file_content(filename).await;
    pb.finish_and_clear();

    let content = outcome.map_err(|e| anyhow::anyhow!(e.user_message()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&content)?);
    } else {
        println!("{}", content.content);
    }
    Ok(())
}

async fn run_stats(config: &Config, json: bool) -> Result<()> {
    let backend = backend(config)?;
    let pb = spinner("Loading analytics...")?;
    let outcome = backend.stats().await;
    pb.finish_and_clear();

    let stats = outcome.map_err(|e| anyhow::anyhow!(e.user_message()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats);
    }
    Ok(())
}

fn print_stats(stats: &StatsSnapshot) {
    println!("Total queries:   {}", stats.total_queries);
    println!("Avg latency:     {}", format_latency(stats.avg_latency_ms));
    println!("Success rate:    {:.0}%", stats.success_rate);

    let dist = &stats.confidence_distribution;
    if dist.has_data() {
        println!(
            "Confidence:      high {}  medium {}  low {}",
            dist.high, dist.medium, dist.low
        );
    }

    if !stats.recent_queries.is_empty() {
        println!("\nRecent queries:");
        for q in &stats.recent_queries {
            let confidence = if q.success {
                q.confidence.display_name()
            } else {
                "No evidence"
            };
            println!(
                "  {:<50} {:<12} {:>7}",
                q.question,
                confidence,
                format_latency(q.retrieval_time_ms)
            );
        }
    }
}

fn run_history(config: &Config, clear: bool, json: bool) -> Result<()> {
    let mut history = SearchHistory::load(Config::history_path(), config.history.cap);

    if clear {
        history.clear();
        println!("Search history cleared");
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(history.entries())?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No recent searches");
        return Ok(());
    }

    for (i, entry) in history.entries().iter().enumerate() {
        println!(
            "{:>2}. {:<60} {}",
            i + 1,
            entry.question,
            format_relative_millis(entry.timestamp)
        );
    }
    Ok(())
}
