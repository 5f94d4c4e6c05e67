use common::TelemetryGuard;
use gateway::{config::GatewayConfig, logging::setup_logging, routes::app, state::AppState};
use inference::{Classifier, OrtBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env()?;

    let _telemetry = config
        .otel_endpoint
        .as_ref()
        .map(|endpoint| TelemetryGuard::init("gateway", endpoint))
        .transpose()?;

    setup_logging(&config);

    tracing::info!(
        config = ?config,
        "Loaded configuration"
    );

    tracing::info!("Loading classification model");
    let backend = OrtBackend::load_model_with_provider(&config.model_path, config.execution_provider)?;
    tracing::info!("Model loaded successfully");

    let classifier = Classifier::new(Box::new(backend), config.input_size);
    let state = AppState::new(classifier);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
