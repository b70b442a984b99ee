//! Riskwatch: adverse-event risk scoring service
//!
//! Main entry point for the HTTP server.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use riskwatch::adapters::sanitize::SanitizingMakeWriter;
use riskwatch::adapters::{InMemoryPatientStore, KumoClient};
use riskwatch::application::{AlertFeed, PatientService, Scorer};
use riskwatch::config::{AppConfig, LogTarget, ModelSettings};
use riskwatch::http::{router, AppState};
use riskwatch::ports::PatientStore;

/// Pick the scoring strategy. A missing or unusable API key means synthetic.
fn build_scorer(settings: &ModelSettings) -> Scorer {
    if !settings.is_configured() {
        tracing::info!("KUMORFM_API_KEY not set, using synthetic scoring");
        return Scorer::Synthetic;
    }

    match KumoClient::new(settings) {
        Ok(client) => {
            tracing::info!(
                "Using Kumo RFM at {} (timeout {:?})",
                client.endpoint(),
                settings.timeout
            );
            Scorer::external(Arc::new(client), settings.timeout)
        }
        Err(e) => {
            tracing::warn!("Kumo client unavailable, using synthetic scoring: {}", e);
            Scorer::Synthetic
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is normal in production.
    let _ = dotenv::dotenv();
    let config = AppConfig::from_env();

    let (writer, _guard) = match &config.log_target {
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                // Best-effort: don't fail startup just because the directory is missing.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            tracing_appender::non_blocking(file)
        }
        LogTarget::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting Riskwatch...");

    let scorer = build_scorer(&config.model);
    let source = scorer.data_source();
    let store: Arc<dyn PatientStore> = Arc::new(InMemoryPatientStore::new());

    let feed = AlertFeed::spawn(Arc::clone(&store), source, config.alert_interval);
    let state = AppState {
        patients: Arc::new(PatientService::new(store, scorer)),
        alerts: feed.sender(),
        api_key_configured: config.model.is_configured(),
    };

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;

    feed.shutdown();
    tracing::info!("Riskwatch shutdown complete.");
    Ok(())
}
