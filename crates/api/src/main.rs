use anyhow::Context;

use storewatch_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storewatch_observability::init();

    let config = ApiConfig::from_env()?;
    let services = storewatch_api::app::services::build_services(&config).await?;
    let app = storewatch_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
