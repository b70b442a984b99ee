//! Route handlers.
//!
//! Handlers stay thin: extract, call the application layer, shape the
//! response body.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use axum::Json;
use chrono::Utc;

use crate::application::{
    analyze_cohort, generate_patients, risk_distribution, risk_trends, CohortOptions,
    DashboardMetrics, DistributionBin, TrendPoint,
};
use crate::domain::{Alert, PatientRecord, RiskPrediction};
use crate::RiskwatchError;

use super::dto::{
    BatchRequest, BatchResponse, Capabilities, CohortRequest, CohortResponse,
    CreatePatientResponse, GenerateQuery, HealthResponse, ModelStatusResponse, PatientView,
    PatientsQuery, ServiceInfo, SyntheticResponse, UploadResponse, DEFAULT_GENERATED,
};
use super::error::ApiError;
use super::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

const SERVICE_NAME: &str = "Riskwatch Adverse Event Service";

pub async fn root(State(state): State<AppState>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME,
        status: "running",
        kumo_connected: state.patients.scorer().is_external(),
        timestamp: Utc::now(),
    })
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let external = state.patients.scorer().is_external();
    Json(HealthResponse {
        status: "healthy",
        kumo_rfm: if external { "connected" } else { "mock_mode" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

pub async fn model_status(State(state): State<AppState>) -> Json<ModelStatusResponse> {
    let external = state.patients.scorer().is_external();
    Json(ModelStatusResponse {
        kumo_connected: external,
        model_type: if external { "Kumo RFM" } else { "Mock Model" },
        api_key_configured: state.api_key_configured,
        last_check: Utc::now(),
        capabilities: Capabilities {
            adverse_event_prediction: true,
            risk_scoring: true,
            cohort_analysis: true,
            real_time_monitoring: external,
        },
    })
}

pub async fn dashboard_metrics(State(state): State<AppState>) -> ApiResult<DashboardMetrics> {
    let patients = state.patients.all()?;
    let source = state.patients.scorer().data_source();
    Ok(Json(DashboardMetrics::compute(&patients, source, Utc::now())))
}

pub async fn dashboard_trends(State(state): State<AppState>) -> ApiResult<Vec<TrendPoint>> {
    let patients = state.patients.all()?;
    let source = state.patients.scorer().data_source();
    Ok(Json(risk_trends(&patients, source, Utc::now())))
}

pub async fn dashboard_distribution(
    State(state): State<AppState>,
) -> ApiResult<Vec<DistributionBin>> {
    let patients = state.patients.all()?;
    let source = state.patients.scorer().data_source();
    Ok(Json(risk_distribution(&patients, source)))
}

pub async fn recent_alerts(State(state): State<AppState>) -> ApiResult<Vec<Alert>> {
    Ok(Json(state.patients.recent_alerts(Utc::now())?))
}

pub async fn list_patients(
    State(state): State<AppState>,
    query: Result<Query<PatientsQuery>, QueryRejection>,
) -> ApiResult<Vec<PatientView>> {
    let Query(query) = query?;
    let patients = state.patients.list(query.group.as_deref())?;
    Ok(Json(patients.iter().map(PatientView::from).collect()))
}

pub async fn create_patient(
    State(state): State<AppState>,
    body: Result<Json<PatientRecord>, JsonRejection>,
) -> ApiResult<CreatePatientResponse> {
    let Json(record) = body?;
    let patient = state.patients.create(record).await?;

    Ok(Json(CreatePatientResponse {
        message: format!("Successfully created patient {}", patient.id()),
        patient: PatientView::from(&patient),
        prediction: patient.prediction,
    }))
}

pub async fn upload_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;

        let summary = state.patients.upload_csv(&file_name, &bytes).await?;
        let source = state.patients.scorer().data_source();
        return Ok(Json(UploadResponse::new(summary, source)));
    }

    Err(RiskwatchError::Validation("No file uploaded".to_string()).into())
}

pub async fn predict_patient(
    State(state): State<AppState>,
    body: Result<Json<PatientRecord>, JsonRejection>,
) -> ApiResult<RiskPrediction> {
    let Json(record) = body?;
    tracing::info!("Predicting risk for patient {}", record.patient_id);
    Ok(Json(state.patients.predict(&record).await))
}

pub async fn predict_batch(
    State(state): State<AppState>,
    body: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult<BatchResponse> {
    let Json(request) = body?;
    let predictions = state.patients.predict_batch(&request.patients).await;

    Ok(Json(BatchResponse {
        total_patients: request.patients.len(),
        successful_predictions: predictions.len(),
        predictions,
        timestamp: Utc::now(),
    }))
}

pub async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<CohortRequest>, JsonRejection>,
) -> ApiResult<CohortResponse> {
    let Json(request) = body?;
    let options = CohortOptions {
        include_percentiles: request.include_percentiles,
        require_non_empty: request.require_non_empty,
    };

    let report = analyze_cohort(
        state.patients.scorer(),
        &request.patients,
        request.filters.as_ref(),
        options,
    )
    .await?;
    Ok(Json(CohortResponse::from(report)))
}

pub async fn generate_synthetic(
    query: Result<Query<GenerateQuery>, QueryRejection>,
) -> ApiResult<SyntheticResponse> {
    let Query(query) = query?;
    let patients = generate_patients(query.count.unwrap_or(DEFAULT_GENERATED));

    Ok(Json(SyntheticResponse {
        generated_patients: patients.len(),
        patients,
    }))
}
