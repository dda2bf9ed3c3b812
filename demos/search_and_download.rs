//! Example: Search every source, then resolve the best result.

use torrent_search::{Artifact, Credentials, Search, SearchConfig, SearchQuery, SourceRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt::init();

    let config = SearchConfig::default();

    // YGG_USER/YGG_PASS enable downloads from the login-gated source
    let registry = SourceRegistry::with_defaults(&config, Credentials::from_env())?;
    let search = Search::with_config(registry, &config);

    println!("Configured {} sources", search.source_count());

    let query = SearchQuery::new("night of the living dead").with_category("movies");

    println!("Searching for: {}", query.query);
    println!();

    let results = search.search(query).await?;

    println!("Found {} results in {}ms", results.count, results.duration_ms);
    for failure in results.failures() {
        println!("  unavailable: {}", failure);
    }
    println!();

    for (i, result) in results.items().iter().take(10).enumerate() {
        println!("{}. {}", i + 1, result.name);
        println!("   Source: {} | Size: {}", result.source, result.size);
        println!("   Seeders: {} | Leechers: {}", result.seeders, result.leechers);
        println!();
    }

    let Some(best) = results.get(0) else {
        return Ok(());
    };

    let artifact = search
        .downloader()
        .download(best, results.sessions(), &config.download_dir, search.timeout())
        .await?;

    match artifact {
        Artifact::Magnet(magnet) => println!("Magnet: {}", magnet),
        Artifact::File(path) => println!("Saved: {}", path.display()),
    }

    Ok(())
}
