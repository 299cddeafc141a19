//! Gleaner CLI
//!
//! Command-line interface for the Gleaner resolution layer: raw indexer
//! queries, IPFS metadata, reputation scores and profiles.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gleaner_core::types::{ProfileMetadata, QueryOptions, ReputationScore, Variables};
use gleaner_indexer::{IndexerClient, IndexerConfig};
use gleaner_ipfs::{IpfsConfig, MetadataResolver};
use gleaner_reputation::{ReputationCache, ReputationConfig, ScoreResult};

/// Gleaner - resolve on-chain references to metadata and reputation
#[derive(Parser)]
#[command(name = "gleaner")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Indexing service base URL
    #[arg(long, env = "INDEXER_URL", global = true)]
    indexer_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a GraphQL query against a subgraph
    Query {
        /// Query text
        query: String,
        /// Variables as a JSON object
        #[arg(long)]
        variables: Option<String>,
        /// Subgraph name (defaults to the marketplace subgraph)
        #[arg(long, env = "INDEXER_SUBGRAPH")]
        subgraph: Option<String>,
        /// Do not log service-reported errors
        #[arg(long)]
        silent: bool,
    },

    /// Resolve an IPFS reference to its JSON document
    Metadata {
        /// CID, ipfs:// URI or /ipfs/ path
        reference: String,
        /// Dedicated gateway tried before the public ones
        #[arg(long, env = "IPFS_GATEWAY_URL")]
        gateway: Option<String>,
    },

    /// Show reputation scores
    Score {
        /// One or more wallet addresses
        #[arg(required = true)]
        addresses: Vec<String>,
    },

    /// Check arbitrator eligibility
    Eligibility {
        /// Wallet address
        address: String,
    },

    /// Show a user's profile document
    Profile {
        /// Wallet address
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "gleaner=debug,info"
    } else {
        "gleaner=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let indexer_url = cli.indexer_url;
    match cli.command {
        Commands::Query {
            query,
            variables,
            subgraph,
            silent,
        } => cmd_query(indexer_url, &query, variables.as_deref(), subgraph, silent).await,
        Commands::Metadata { reference, gateway } => cmd_metadata(&reference, gateway).await,
        Commands::Score { addresses } => cmd_score(indexer_url, &addresses).await,
        Commands::Eligibility { address } => cmd_eligibility(indexer_url, &address).await,
        Commands::Profile { address } => cmd_profile(indexer_url, &address).await,
    }
}

fn indexer_config(indexer_url: Option<String>) -> Result<IndexerConfig> {
    match indexer_url {
        Some(url) if !url.trim().is_empty() => Ok(IndexerConfig::new(url.trim())),
        _ => IndexerConfig::from_env().context("indexer base URL is required (--indexer-url or INDEXER_URL)"),
    }
}

fn reputation_cache(indexer_url: Option<String>) -> Result<ReputationCache> {
    let indexer = indexer_config(indexer_url)?;
    ReputationCache::from_indexer(&indexer, ReputationConfig::from_env())
        .context("Failed to create reputation client")
}

/// Run a raw indexer query
async fn cmd_query(
    indexer_url: Option<String>,
    query: &str,
    variables: Option<&str>,
    subgraph: Option<String>,
    silent: bool,
) -> Result<()> {
    let mut config = indexer_config(indexer_url)?;
    if let Some(subgraph) = subgraph {
        config = config.for_subgraph(subgraph);
    }

    let variables: Option<Variables> = variables
        .map(serde_json::from_str)
        .transpose()
        .context("--variables must be a JSON object")?;

    println!("{} {}", "🔍 Querying:".cyan().bold(), config.endpoint());

    let client = IndexerClient::with_config(config).context("Failed to create indexer client")?;
    let options = QueryOptions { silent };

    match client.execute::<Value>(query, variables.as_ref(), options).await {
        Ok(data) => {
            println!("\n{}", "✅ Result:".green().bold());
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
        Err(e) if e.is_service_error() => bail!("Indexer rejected the query: {}", e),
        Err(e) => Err(e).context("Indexer request failed"),
    }
}

/// Resolve an IPFS reference
async fn cmd_metadata(reference: &str, gateway: Option<String>) -> Result<()> {
    println!("{} {}", "📦 Resolving:".cyan().bold(), reference);

    let mut config = IpfsConfig::from_env().context("Invalid IPFS configuration")?;
    if let Some(gateway) = gateway {
        config = config.with_preferred_gateway(gateway);
    }
    let resolver = MetadataResolver::with_config(config).context("Failed to create resolver")?;

    let outcome = resolver.resolve_detailed(reference).await;

    for failure in &outcome.failures {
        println!("   {} {} ({})", "✗".red(), failure.gateway, failure.error);
    }

    let Some(cid) = outcome.cid.clone() else {
        bail!("Not a content reference: {}", reference);
    };

    match (&outcome.document, &outcome.gateway) {
        (Some(document), gateway) => {
            let source = gateway.as_deref().unwrap_or("cache");
            println!("\n{} {} {}", "✅ Resolved".green().bold(), cid, format!("via {}", source).dimmed());
            println!("{}", serde_json::to_string_pretty(document)?);
            Ok(())
        }
        (None, _) => {
            println!("\n{} {}", "⚠️  Not found on any gateway:".yellow(), cid);
            Ok(())
        }
    }
}

/// Show reputation scores
async fn cmd_score(indexer_url: Option<String>, addresses: &[String]) -> Result<()> {
    let cache = reputation_cache(indexer_url)?;

    if let [address] = addresses {
        println!("{} {}", "⭐ Reputation for:".cyan().bold(), address);
        print_score(address, &cache.get_score(address).await);
        return Ok(());
    }

    println!("{} {} addresses", "⭐ Reputation for".cyan().bold(), addresses.len());
    let scores = cache.get_scores(addresses).await;

    let mut keys: Vec<&String> = scores.keys().collect();
    keys.sort();
    for key in keys {
        print_score(key, &scores[key]);
    }
    Ok(())
}

fn print_score(address: &str, result: &ScoreResult) {
    match (&result.score, &result.error) {
        (_, Some(error)) => {
            let hint = if result.retryable { " (retry later)" } else { "" };
            println!("   {} {} {}{}", "✗".red(), address, error, hint.dimmed());
        }
        (Some(score), None) => print_record(score),
        (None, None) => println!("   {} {}", address, "no reputation profile".dimmed()),
    }
}

fn print_record(score: &ReputationScore) {
    println!(
        "   {} {} {}",
        score.address,
        score.score.to_string().green().bold(),
        format!("[{}]", score.tier).yellow()
    );
    println!(
        "      {} {}  {} {}",
        "Endorsements:".dimmed(),
        score.endorsements,
        "Airdrops:".dimmed(),
        score.airdrops_received
    );
    if let Some(updated) = score.last_updated_at() {
        println!("      {} {}", "Updated:".dimmed(), updated.format("%Y-%m-%d %H:%M UTC"));
    }
}

/// Check arbitrator eligibility
async fn cmd_eligibility(indexer_url: Option<String>, address: &str) -> Result<()> {
    println!("{} {}", "⚖️  Arbitrator eligibility:".cyan().bold(), address);

    let cache = reputation_cache(indexer_url)?;
    let eligibility = cache
        .check_arbitrator_eligibility(address)
        .await
        .context("Reputation lookup failed")?;

    if eligibility.eligible {
        println!("   {} score {} (required {})", "✅ Eligible".green().bold(), eligibility.score, eligibility.required_score);
    } else {
        println!(
            "   {} {}",
            "❌ Not eligible:".red().bold(),
            eligibility.reason.as_deref().unwrap_or("requirement not met")
        );
        println!(
            "   {} {} / {} ({} missing)",
            "Score:".dimmed(),
            eligibility.score,
            eligibility.required_score,
            eligibility.missing_points
        );
    }
    Ok(())
}

/// Show a user's profile document
async fn cmd_profile(indexer_url: Option<String>, address: &str) -> Result<()> {
    println!("{} {}", "👤 Profile for:".cyan().bold(), address);

    let client = IndexerClient::with_config(indexer_config(indexer_url)?)
        .context("Failed to create indexer client")?;

    let Some(uri) = client.profile_uri(address).await.context("Profile lookup failed")? else {
        println!("   {}", "No profile registered.".yellow());
        return Ok(());
    };
    println!("   {} {}", "Profile URI:".dimmed(), uri);

    let resolver = MetadataResolver::with_config(IpfsConfig::from_env()?)
        .context("Failed to create resolver")?;

    match resolver.resolve_as::<ProfileMetadata>(&uri).await {
        Some(profile) => {
            println!("\n   {}", profile.display_name.green().bold());
            if let Some(title) = &profile.title {
                println!("   {}", title);
            }
            if !profile.bio.is_empty() {
                println!("   {}", profile.bio.dimmed());
            }
            if !profile.skills.is_empty() {
                println!("   {} {}", "Skills:".dimmed(), profile.skills.join(", "));
            }
            for (network, handle) in &profile.socials {
                println!("   {} {}", format!("{}:", network).dimmed(), handle);
            }
        }
        None => println!("   {}", "⚠️  Profile document unavailable.".yellow()),
    }
    Ok(())
}
