use anyhow::Context;

use streetsupport_api::{ConsoleConfig, build_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    streetsupport_observability::init();

    let config = ConsoleConfig::from_env().context("reading configuration")?;
    let app = build_app(&config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, backend = %config.backend_url, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
