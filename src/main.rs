//! pathguard gateway
//!
//! Forward-auth server enforcing a configured rule chain.

use clap::Parser;
use pathguard::{
    access_control::{AuthorizationEngine, CheckRegistry, RuleChain},
    auth::create_identity_providers,
    config::{AppConfig, LogFormat, load_config},
    server::{GatewayState, TokenExtractor, gateway_router},
    transport::{HttpConfig, run_http_blocking},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// pathguard - Route-based authorization gateway
#[derive(Parser, Debug)]
#[command(name = "pathguard")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "PATHGUARD_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "PATHGUARD_LOG_LEVEL")]
    log_level: Option<String>,

    /// Gateway host; overrides the config file
    #[arg(long, env = "PATHGUARD_HOST")]
    host: Option<String>,

    /// Gateway port; overrides the config file
    #[arg(long, env = "PATHGUARD_PORT")]
    port: Option<u16>,
}

fn init_logging(config: &AppConfig, level: Option<&str>) {
    let level = level.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match config.logging.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }
}

/// Build the rule chain for a configuration
///
/// The gateway binary has no custom checks; `custom` rules fail to load.
fn build_chain(config: &AppConfig) -> anyhow::Result<RuleChain> {
    Ok(RuleChain::from_config(&config.rules, &CheckRegistry::new())?)
}

/// Reload the rule chain on SIGHUP, keeping the current one on failure
#[cfg(unix)]
fn spawn_reload_task(
    engine: Arc<AuthorizationEngine>,
    config_path: Option<String>,
    ct: CancellationToken,
) -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        loop {
            tokio::select! {
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                }
                _ = ct.cancelled() => break,
            }

            info!("Received SIGHUP, reloading rules");
            let reloaded = load_config(config_path.as_deref())
                .map_err(anyhow::Error::from)
                .and_then(|config| build_chain(&config));
            match reloaded {
                Ok(chain) => {
                    engine.swap_chain(chain);
                }
                Err(e) => error!(error = %e, "Reload failed, keeping current rules"),
            }
        }
    });
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    // Load configuration
    let config = load_config(args.config.as_deref())?;

    // Initialize logging
    init_logging(&config, args.log_level.as_deref());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        rules = config.rules.len(),
        users = config.identity.users.len(),
        "Starting pathguard"
    );

    // Create identity providers
    let (session, permissions) = create_identity_providers(&config.identity)
        .inspect_err(|e| error!(error = %e, "Failed to create identity providers"))?;

    // Build the engine
    let chain =
        build_chain(&config).inspect_err(|e| error!(error = %e, "Failed to build rule chain"))?;
    let engine = Arc::new(
        AuthorizationEngine::new(chain, session, permissions).with_config(&config.engine),
    );

    let tokens = TokenExtractor::new(&config.token)
        .inspect_err(|e| error!(error = %e, "Invalid token configuration"))?;

    let ct = CancellationToken::new();

    #[cfg(unix)]
    spawn_reload_task(engine.clone(), args.config.clone(), ct.clone())?;

    let host = args.host.as_deref().unwrap_or(&config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let http_config = HttpConfig::from_host_port(host, port)?;

    let router = gateway_router(GatewayState::new(engine, tokens));
    run_http_blocking(router, http_config, ct.clone()).await?;

    ct.cancel();
    Ok(())
}
