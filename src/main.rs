//! Kumo main entry point
//!
//! This is the command-line interface for the Kumo crawl-and-search
//! engine.

use clap::{Parser, Subcommand};
use kumo::config::load_config_or_default;
use kumo::crawler::{crawl, run_recrawl, Coordinator};
use kumo::search::{HybridSearch, SearchResponse, SearchSession};
use kumo::storage::SqliteStorage;
use kumo::TextAnalyzer;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Kumo: a hybrid crawl-and-search engine
///
/// Kumo crawls seed domains into a searchable document index and answers
/// queries by combining stored matches with live web search results.
#[derive(Parser, Debug)]
#[command(name = "kumo")]
#[command(version = "1.0.0")]
#[command(about = "A hybrid crawl-and-search engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "kumo.toml", global = true)]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a domain (or a single submitted URL) into the index
    Crawl {
        /// Domain to crawl, e.g. "example.com"
        #[arg(value_name = "DOMAIN", required_unless_present = "url", conflicts_with = "url")]
        domain: Option<String>,

        /// Queue a single URL instead of seeding a whole domain
        #[arg(long, value_name = "URL")]
        url: Option<String>,

        /// Expand subdomains and outbound links from the seed
        /// (overrides the config default)
        #[arg(long, value_name = "BOOL")]
        scan_internal: Option<bool>,
    },

    /// Re-process every document already stored in the index
    Recrawl,

    /// Query the index, falling back to live web search
    Search {
        /// Query text; omit for an interactive prompt
        query: Option<String>,

        /// Result page to display
        #[arg(short, long)]
        page: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match load_config_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    match cli.command {
        Command::Crawl {
            domain,
            url,
            scan_internal,
        } => handle_crawl(config, domain, url, scan_internal).await?,
        Command::Recrawl => handle_recrawl(config).await?,
        Command::Search { query, page } => handle_search(config, query, page).await?,
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kumo=info,warn"),
            1 => EnvFilter::new("kumo=debug,info"),
            2 => EnvFilter::new("kumo=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the crawl subcommand: seed (domain or single URL), then drain
/// the frontier.
async fn handle_crawl(
    config: kumo::Config,
    domain: Option<String>,
    url: Option<String>,
    scan_internal: Option<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let scan = scan_internal.unwrap_or(config.crawler.scan_internal_links);

    let processed = if let Some(url) = url {
        let coordinator = Coordinator::new(config)?;
        coordinator.submit_url(&url)?;
        coordinator.run().await?
    } else if let Some(domain) = domain {
        crawl(config, &domain, scan).await?
    } else {
        0
    };

    println!("Crawl finished: {} page(s) processed", processed);

    Ok(())
}

/// Handles the recrawl subcommand: refresh every stored document.
async fn handle_recrawl(config: kumo::Config) -> Result<(), Box<dyn std::error::Error>> {
    let summary = run_recrawl(config).await?;

    println!(
        "Re-crawl finished: {} refreshed, {} skipped, {} failed",
        summary.refreshed, summary.skipped, summary.failed
    );

    Ok(())
}

/// Handles the search subcommand: one-shot with a query argument, or an
/// interactive prompt without one.
async fn handle_search(
    config: kumo::Config,
    query: Option<String>,
    page: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Arc::new(Mutex::new(SqliteStorage::new(Path::new(
        &config.output.database_path,
    ))?));
    let analyzer = Arc::new(TextAnalyzer::new());
    let engine = HybridSearch::new(storage, analyzer, &config.live_search)?;
    let mut session = SearchSession::new();

    if let Some(query) = query {
        let response = engine.search(&query, page, &mut session).await?;
        print_response(&query, &response);
        return Ok(());
    }

    // Interactive mode: one session, queries until "exit".
    let stdin = io::stdin();
    loop {
        print!("\nEnter search query (or 'exit'): ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query == "exit" {
            break;
        }

        let response = engine.search(query, None, &mut session).await?;
        print_response(query, &response);
    }

    Ok(())
}

/// Prints one page of results to stdout.
fn print_response(query: &str, response: &SearchResponse) {
    if response.spelling_corrected {
        println!(
            "Showing results for '{}' (searched for '{}')",
            response.corrected_query, query
        );
    }

    println!(
        "{} result(s) in {:.3}s, page {}/{}:",
        response.total_count,
        response.elapsed.as_secs_f64(),
        response.page,
        response.total_pages
    );

    for (index, document) in response.results.iter().enumerate() {
        let rank = (response.page - 1) * kumo::search::PAGE_SIZE + index + 1;
        match &document.title {
            Some(title) => println!("{:3}. {} - {}", rank, title, document.url),
            None => println!("{:3}. {}", rank, document.url),
        }
        if !document.body_excerpt.is_empty() {
            println!("     {}", document.body_excerpt);
        }
    }

    if !response.suggestions.is_empty() {
        println!("Suggestions: {}", response.suggestions.join(", "));
    }
}
