//! mutating-webhook - a config-driven Kubernetes mutating admission webhook.
//!
//! This is the main entry point that:
//! - Parses command-line flags
//! - Initializes structured logging
//! - Loads the mutation configuration (fatal on error)
//! - Starts the TLS webhook server

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use mutating_webhook::{Config, RuleStore, run_webhook_server};

/// Config-driven Kubernetes mutating admission webhook
#[derive(Parser, Debug)]
#[command(name = "mutating-webhook", version, about)]
struct Args {
    /// Path to the mutation config file
    #[arg(long, default_value = "/config/config.yaml")]
    config: PathBuf,

    /// Port to listen on
    #[arg(long, default_value_t = 8443)]
    port: u16,

    /// Path to the TLS certificate (PEM)
    #[arg(long, default_value = "/tls/tls.crt")]
    tls_cert: PathBuf,

    /// Path to the TLS private key (PEM)
    #[arg(long, default_value = "/tls/tls.key")]
    tls_key: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mutating_webhook=info".parse()?),
        )
        .json()
        .init();

    let args = Args::parse();

    // A broken or missing config is fatal: the server must not come up
    // silently with an empty rule set.
    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %args.config.display(), error = %e, "failed to load config");
            return Err(e.into());
        }
    };

    let rules = RuleStore::from(config);
    info!(rules = rules.len(), "loaded mutation config");

    if let Err(e) = run_webhook_server(rules, args.port, &args.tls_cert, &args.tls_key).await {
        error!(error = %e, "webhook server failed");
        return Err(e.into());
    }

    Ok(())
}
