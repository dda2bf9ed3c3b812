//! Torrent Search CLI - concurrent multi-source torrent search.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use torrent_search::{
    Artifact, Credentials, Search, SearchConfig, SearchQuery, SearchResults, SourceRegistry,
    TorrentResult, UNREPORTED,
};

/// Torrent Search - search several torrent sources at once
#[derive(Parser)]
#[command(name = "torrent-search")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search torrent sources
    Search(SearchArgs),

    /// List available sources
    Sources,
}

#[derive(Parser)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Sources to use (comma-separated), or "all"
    /// Available: arc, tpb, otts, ygg
    #[arg(short, long, value_delimiter = ',', default_value = "all")]
    sources: Vec<String>,

    /// Category filter (movies, tv, music, games, apps, ...)
    #[arg(short, long)]
    category: Option<String>,

    /// Per-source timeout in seconds
    #[arg(short, long, default_value = "20")]
    timeout: u64,

    /// Maximum number of results to display
    #[arg(short, long, default_value = "20")]
    limit: usize,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Resolve the N-th listed result (1-based) into a magnet or torrent file
    #[arg(short, long)]
    download: Option<usize>,

    /// Directory for downloaded torrent files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// YggTorrent user name
    #[arg(long, env = "YGG_USER")]
    ygg_user: Option<String>,

    /// YggTorrent password
    #[arg(long, env = "YGG_PASS", hide_env_values = true)]
    ygg_pass: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable table
    Text,
    /// JSON output
    Json,
    /// Compact single-line output
    Compact,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search(args) => run_search(args).await,
        Commands::Sources => list_sources(),
    }
}

fn list_sources() -> Result<()> {
    let registry = SourceRegistry::with_defaults(&SearchConfig::default(), None)?;

    println!("Available sources:\n");
    for source in registry.iter() {
        let note = if source.requires_session() {
            " (login required to download)"
        } else {
            ""
        };
        println!("  {:<6} - {}{}", source.shortcut(), source.name(), note);
    }
    println!();
    println!("Usage: torrent-search search \"query\" -s tpb,otts -c movies");
    Ok(())
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let config = SearchConfig {
        timeout_secs: args.timeout,
        download_dir: args.output.clone(),
        ..Default::default()
    };
    config.validate()?;

    let credentials = match (args.ygg_user, args.ygg_pass) {
        (Some(user), Some(pass)) => Some(Credentials::new(user, pass)),
        _ => None,
    };

    let registry = SourceRegistry::with_defaults(&config, credentials)?;
    let search = Search::with_config(registry, &config);

    let mut query = SearchQuery::new(&args.query).with_sources(&args.sources);
    if let Some(category) = &args.category {
        query = query.with_category(category);
    }

    let results = search.search(query).await?;

    match args.format {
        OutputFormat::Text => print_table(&args.query, &results, args.limit),
        OutputFormat::Json => {
            let output: Vec<_> = results.items().iter().take(args.limit).collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Compact => {
            for result in results.items().iter().take(args.limit) {
                println!(
                    "{}\t{}\t{}\t{}",
                    result.source,
                    count(result.seeders),
                    result.size,
                    result.name
                );
            }
        }
    }

    if let Some(index) = args.download {
        let item = index
            .checked_sub(1)
            .and_then(|i| results.get(i))
            .with_context(|| format!("No result number {}", index))?;

        let artifact = search
            .downloader()
            .download(item, results.sessions(), &config.download_dir, search.timeout())
            .await
            .with_context(|| format!("Failed to download '{}'", item.name))?;

        match artifact {
            Artifact::Magnet(magnet) => println!("{}", magnet),
            Artifact::File(path) => println!("Saved {}", path.display()),
        }
    }

    Ok(())
}

fn print_table(query: &str, results: &SearchResults, limit: usize) {
    println!(
        "\nResults for \"{}\" ({} results in {}ms):\n",
        query, results.count, results.duration_ms
    );

    println!(
        "{:>3}  {:<60}  {:>10}  {:>6}  {:>6}  {:<10}  {}",
        "#", "Name", "Size", "Seed", "Leech", "Date", "Source"
    );
    for (i, result) in results.items().iter().take(limit).enumerate() {
        print_row(i + 1, result);
    }

    if !results.failures().is_empty() {
        println!();
        for failure in results.failures() {
            eprintln!("Warning: {}", failure);
        }
    }
}

fn print_row(index: usize, result: &TorrentResult) {
    let name: String = if result.name.chars().count() > 60 {
        let mut short: String = result.name.chars().take(57).collect();
        short.push_str("...");
        short
    } else {
        result.name.clone()
    };
    println!(
        "{:>3}  {:<60}  {:>10}  {:>6}  {:>6}  {:<10}  {}",
        index,
        name,
        result.size,
        count(result.seeders),
        count(result.leechers),
        result.upload_date.as_deref().unwrap_or("-"),
        result.source
    );
}

fn count(value: i64) -> String {
    if value <= UNREPORTED {
        "-".to_string()
    } else {
        value.to_string()
    }
}
