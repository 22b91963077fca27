use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use melanox::{build_router, AnalysisService, Config, OnnxClassifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "melanox=info,tower_http=info".into()),
        )
        .init();

    let config = Config::parse();

    // A missing or corrupt model is fatal: the server must not come up
    // without a classifier.
    tracing::info!(model = %config.model_path.display(), "loading classifier");
    let classifier = Arc::new(OnnxClassifier::load(&config)?);
    tracing::info!(
        saliency = classifier.saliency_available(),
        "classifier ready"
    );

    let service = Arc::new(AnalysisService::new(&config, classifier));
    let router = build_router(&config, service);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "melanoma detection API listening");
    tracing::info!("endpoints: GET /health, GET /model-info, POST /analyze");

    axum::serve(listener, router).await?;
    Ok(())
}
