//! HTTP layer: axum router over the application services.
//!
//! | Method | Path |
//! |---|---|
//! | GET | `/`, `/health`, `/model/status` |
//! | GET | `/dashboard/metrics`, `/dashboard/risk-trends`, `/dashboard/risk-distribution` |
//! | GET | `/alerts/recent`, `/events/alerts` (SSE) |
//! | GET, POST | `/patients` |
//! | POST | `/upload/csv`, `/predict/patient-risk`, `/predict/batch` |
//! | POST | `/analyze/cohort`, `/generate/synthetic-data` |

pub mod dto;
pub mod error;
mod handlers;
mod stream;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::PatientService;
use crate::domain::AlertEvent;

pub use error::ApiError;

/// Largest accepted request body (CSV uploads included).
const BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub patients: Arc<PatientService>,
    /// Source of the alert stream
    pub alerts: broadcast::Sender<AlertEvent>,
    pub api_key_configured: bool,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/model/status", get(handlers::model_status))
        .route("/dashboard/metrics", get(handlers::dashboard_metrics))
        .route("/dashboard/risk-trends", get(handlers::dashboard_trends))
        .route(
            "/dashboard/risk-distribution",
            get(handlers::dashboard_distribution),
        )
        .route("/alerts/recent", get(handlers::recent_alerts))
        .route("/events/alerts", get(stream::alert_stream))
        .route(
            "/patients",
            get(handlers::list_patients).post(handlers::create_patient),
        )
        .route("/upload/csv", post(handlers::upload_csv))
        .route("/predict/patient-risk", post(handlers::predict_patient))
        .route("/predict/batch", post(handlers::predict_batch))
        .route("/analyze/cohort", post(handlers::analyze))
        .route(
            "/generate/synthetic-data",
            post(handlers::generate_synthetic),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
