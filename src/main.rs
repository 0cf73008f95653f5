//! Mention moderator: daemon entrypoint.
//! Loads config, checks connectivity, then polls until Ctrl-C.
//!
//! `--reset <HANDLE>` grants amnesty instead of running the loop. Stop the
//! daemon first: a running instance holds the ledger in memory.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use mention_moderator::ai_adapter::build_provider;
use mention_moderator::config::{AppConfig, SocialConfig};
use mention_moderator::ledger::InfractionLedger;
use mention_moderator::logging;
use mention_moderator::metrics::Metrics;
use mention_moderator::social::{MastodonClient, SocialClient};
use mention_moderator::{ClassificationGateway, Orchestrator, RetryPolicy};

#[derive(Debug, Parser)]
#[command(name = "mention-moderator", version, about = "Moderate hostile Mastodon mentions")]
struct Cli {
    /// Clear the infraction record of HANDLE (user@instance) and exit
    #[arg(long, value_name = "HANDLE")]
    reset: Option<String>,
}

/// Drop `handle`'s record from the ledger file. Returns whether one existed.
fn reset_infractions(config: &AppConfig, handle: &str) -> anyhow::Result<bool> {
    let handle = handle.trim().trim_start_matches('@');
    let mut ledger = InfractionLedger::open(&config.infractions_file)
        .with_context(|| format!("opening {}", config.infractions_file.display()))?;
    Ok(ledger.reset(handle)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    let config = Arc::new(AppConfig::load_default().context("loading configuration")?);
    logging::init(config.log_file_path())?;

    if let Some(handle) = cli.reset.as_deref() {
        if reset_infractions(&config, handle)? {
            println!("Infractions for {handle} cleared.");
        } else {
            println!("No infractions recorded for {handle}.");
        }
        return Ok(());
    }

    let social_cfg = SocialConfig::from_env()?;

    info!("mention moderator v{}", env!("CARGO_PKG_VERSION"));
    if config.dry_run {
        warn!("DRY RUN MODE - no actions will be performed");
    } else {
        warn!("LIVE MODE - actions WILL be performed");
    }
    if let Some(path) = config.log_file_path() {
        info!(path = %path.display(), "logging to file");
    }

    let social = Arc::new(MastodonClient::new(&social_cfg)?);
    let username = social
        .verify_credentials()
        .await
        .context("connecting to Mastodon")?;
    info!(%username, "connected to Mastodon");

    let _metrics_task = match &config.metrics_addr {
        Some(addr) => {
            let m = Metrics::init()?;
            Some(m.serve(addr).await?)
        }
        None => None,
    };

    let gateway = ClassificationGateway::new(build_provider(&config.ai), RetryPolicy::from(&config.ai));
    info!(
        provider = gateway.provider_name(),
        model = %config.ai.model,
        host = %config.ai.host,
        "classifier ready"
    );

    let mut orchestrator = Orchestrator::from_config(config.clone(), social, gateway)?;
    orchestrator
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    info!("stopped");
    Ok(())
}
