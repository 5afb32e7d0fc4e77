use anyhow::Context;
use marketing_audit::adapters::http;
use marketing_audit::utils::{logger, validation::Validate};
use marketing_audit::{OpenAiClient, PdfRenderer, PipelineSettings, ReportPipeline, ServerConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;
    logger::init_server_logger(config.log_json);

    tracing::info!("Starting report server");
    tracing::debug!("Server config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        return Err(e.into());
    }

    let client = OpenAiClient::from_config(&config)?;
    let pipeline = Arc::new(ReportPipeline::new_with_monitoring(
        client,
        PdfRenderer::new(),
        PipelineSettings::from_config(&config),
        config.monitor,
    ));

    let app = http::router(pipeline);
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;

    tracing::info!("🚀 Listening on {}", config.bind_address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
