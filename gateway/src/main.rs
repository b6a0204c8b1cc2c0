use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use simplenote_core::{Session, UreqTransport};
use simplenote_gateway::{router, GatewayConfig};
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(name = "simplenote-gateway", about = "Local HTTP front-end for Simplenote")]
struct Cli {
    /// TOML file layered over the built-in defaults
    #[arg(long, env = "SIMPLENOTE_CONFIG")]
    config: Option<PathBuf>,
    /// Overrides bind_addr
    #[arg(long)]
    bind: Option<String>,
    /// Log every outgoing note service request
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = GatewayConfig::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    config.debug |= cli.debug;

    match config.log.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(&config.log.level)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(&config.log.level)
                .init();
        }
    }

    config.validate()?;
    let addr = config.socket_addr()?;

    let transport = UreqTransport::with_timeout(config.request_timeout());
    let base_url = config.base_url.clone();
    let email = config.email.clone();
    let password = config.password.clone();
    let session = tokio::task::spawn_blocking(move || {
        Session::login(transport, &base_url, &email, &password)
    })
    .await
    .context("login task failed")?
    .context("login failed; confirm your email and password")?
    .with_debug(config.debug);
    // TODO: refresh the token on a 24h timer; it is only fetched here.
    tracing::info!(email = %config.email, "login succeeded");

    let app = router(Arc::new(session), &config.route_prefix);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, prefix = %config.route_prefix, "gateway listening");
    axum::serve(listener, app).await?;

    Ok(())
}
