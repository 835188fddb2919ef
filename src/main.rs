use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use foxmirror::{app_state::AppState, config::Config, logging, mirror};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("load configuration")?;
    logging::init(config.log_format())?;

    let bind_addr = config.bind_addr().to_string();
    info!(
        origin = %config.origin_url(),
        assets = %config.asset_cache_dir().display(),
        packages = %config.package_cache_dir().display(),
        "starting mirror"
    );

    let state = AppState::from_config(config)?;
    let app = mirror::router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("bind {bind_addr}"))?;
    info!(addr = %bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
