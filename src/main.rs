use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use newsanchor::anchoring::{self, AnchorOptions, AnchorResult};
use newsanchor::config::{Config, DEFAULT_TIMEOUT_SECS};
use newsanchor::error::Result;
use newsanchor::ledger::indexer::{IndexerClient, IndexerConfig};
use newsanchor::ledger::node::{NodeClient, NodeConfig};
use newsanchor::ledger::IndexQuery;
use newsanchor::reconcile::{self, ReconcileStatus, DEFAULT_QUERY_LIMIT};
use newsanchor::report::TracingReporter;
use newsanchor::sources;

#[derive(Parser)]
#[command(name = "newsanchor")]
#[command(about = "Anchor news-source content fingerprints on-chain and verify local copies")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Anchor one directory, then reconcile another against the chain
    Run(CommonArgs),
    /// Anchor only: mint one registration token per source file
    Anchor(CommonArgs),
    /// Reconcile only: classify each source file as verified or mismatched
    Verify(CommonArgs),
    /// Show resolved configuration and collaborator reachability
    Status(CommonArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Issuer address (sender, manager and reserve of every anchor)
    #[arg(long, env = "NEWSANCHOR_ISSUER")]
    issuer: String,

    /// Ledger-write gateway base URL
    #[arg(long, env = "NEWSANCHOR_NODE_URL", default_value = "http://localhost:4001")]
    node_url: String,

    /// Indexer base URL (omit to skip reconciliation)
    #[arg(long, env = "NEWSANCHOR_INDEXER_URL")]
    indexer_url: Option<String>,

    /// API token forwarded to both collaborators
    #[arg(long, env = "NEWSANCHOR_API_TOKEN")]
    api_token: Option<String>,

    /// Directory of source files to anchor
    #[arg(long, default_value = "sources")]
    sources: PathBuf,

    /// Directory of source files to verify (defaults to --sources)
    #[arg(long)]
    verify_sources: Option<PathBuf>,

    /// Indexer page size; only the first page is ever inspected
    #[arg(long, default_value_t = DEFAULT_QUERY_LIMIT)]
    query_limit: u32,

    /// Query the index for an existing exact anchor before minting
    #[arg(long)]
    dedup: bool,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,
}

impl CommonArgs {
    fn into_config(self) -> Config {
        let verify_dir = self.verify_sources.unwrap_or_else(|| self.sources.clone());
        Config {
            issuer: self.issuer,
            anchor_dir: self.sources,
            verify_dir,
            node_url: self.node_url,
            indexer_url: self.indexer_url,
            api_token: self.api_token,
            query_limit: self.query_limit,
            dedup_precheck: self.dedup,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let config = args.into_config();
            let index = resolve_index(&config).await;
            run_anchor_phase(&config, index.as_ref().map(|i| i as &dyn IndexQuery)).await?;
            run_verify_phase(&config, index.as_ref().map(|i| i as &dyn IndexQuery)).await;
        }
        Commands::Anchor(args) => {
            let config = args.into_config();
            let index = if config.dedup_precheck {
                resolve_index(&config).await
            } else {
                None
            };
            run_anchor_phase(&config, index.as_ref().map(|i| i as &dyn IndexQuery)).await?;
        }
        Commands::Verify(args) => {
            let config = args.into_config();
            let index = resolve_index(&config).await;
            run_verify_phase(&config, index.as_ref().map(|i| i as &dyn IndexQuery)).await;
        }
        Commands::Status(args) => {
            let config = args.into_config();
            print_status(&config).await;
        }
    }

    Ok(())
}

/// Build and probe the indexer once, at composition time. An unconfigured
/// or unreachable indexer downgrades to None; reconciliation then skips
/// cleanly instead of failing the run.
async fn resolve_index(config: &Config) -> Option<IndexerClient> {
    let base_url = config.indexer_url.clone()?;
    let client = match IndexerClient::new(IndexerConfig {
        base_url,
        api_token: config.api_token.clone(),
        timeout: config.timeout,
    }) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Could not build indexer client");
            return None;
        }
    };

    match client.health().await {
        Ok(()) => Some(client),
        Err(e) => {
            warn!(error = %e, "Indexer unreachable, reconciliation will be skipped");
            None
        }
    }
}

async fn run_anchor_phase(config: &Config, index: Option<&dyn IndexQuery>) -> Result<()> {
    let writer = NodeClient::new(NodeConfig {
        base_url: config.node_url.clone(),
        api_token: config.api_token.clone(),
        timeout: config.timeout,
    })?;

    let records = match sources::load_records(&config.anchor_dir) {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "Could not enumerate anchor sources");
            Vec::new()
        }
    };

    let opts = AnchorOptions {
        dedup_precheck: config.dedup_precheck,
        query_limit: config.query_limit,
    };
    let reporter = TracingReporter;
    let outcomes =
        anchoring::anchor_sources(&records, &config.issuer, &writer, index, &reporter, &opts)
            .await;

    let minted = outcomes.iter().filter(|o| o.minted()).count();
    let skipped = outcomes
        .iter()
        .filter(|o| matches!(o.result, AnchorResult::Skipped { .. }))
        .count();
    let failed = outcomes
        .iter()
        .filter(|o| matches!(o.result, AnchorResult::Failed(_)))
        .count();

    println!("Anchoring: {minted} minted, {skipped} skipped, {failed} failed");
    for outcome in &outcomes {
        if let AnchorResult::Failed(error) = &outcome.result {
            println!("  failed: {} ({error})", outcome.file_name);
        }
    }
    Ok(())
}

async fn run_verify_phase(config: &Config, index: Option<&dyn IndexQuery>) {
    let reporter = TracingReporter;
    let report = reconcile::reconcile_sources(
        &config.verify_dir,
        &config.issuer,
        index,
        config.query_limit,
        &reporter,
    )
    .await;

    match report.status {
        ReconcileStatus::Completed => {
            println!(
                "Reconciliation: {} verified, {} mismatched",
                report.verified, report.mismatched
            );
            for file in &report.mismatched_files {
                println!("  mismatched: {file}");
            }
        }
        ReconcileStatus::SkippedNoIndex => {
            println!("Reconciliation skipped: no index collaborator");
        }
        ReconcileStatus::SkippedNoSources => {
            println!(
                "Reconciliation skipped: source directory {} not found",
                config.verify_dir.display()
            );
        }
    }
}

async fn print_status(config: &Config) {
    println!("issuer:       {}", config.issuer);
    println!("anchor dir:   {}", config.anchor_dir.display());
    println!("verify dir:   {}", config.verify_dir.display());
    println!("node url:     {}", config.node_url);
    println!("query limit:  {}", config.query_limit);
    println!("dedup check:  {}", config.dedup_precheck);
    match &config.indexer_url {
        None => println!("indexer:      not configured"),
        Some(url) => match resolve_index(config).await {
            Some(_) => println!("indexer:      {url} (reachable)"),
            None => println!("indexer:      {url} (unreachable)"),
        },
    }
}
