use crate::application::app_state::AppState;
use crate::domain::models::{ErrorResponse, Interval, IntervalPage, NewInterval};
use crate::infrastructure::error::InfraError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
const INVALID_INTERVAL: &str = "INVALID_INTERVAL";
const INTERVAL_OVERLAP: &str = "INTERVAL_OVERLAP";
const INTERNAL_SERVER_ERROR: &str = "INTERNAL_SERVER_ERROR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, VALIDATION_ERROR, message)
    }

    /// `validation_code` names what a failed validation was about.
    fn from_infra(error: &InfraError, message: String, validation_code: &'static str) -> Self {
        match error {
            InfraError::Validation(_) => Self::new(StatusCode::BAD_REQUEST, validation_code, message),
            InfraError::Overlap(_) => Self::new(StatusCode::CONFLICT, INTERVAL_OVERLAP, message),
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_SERVER_ERROR, message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.code.to_string(),
            message: self.message,
            timestamp: Utc::now().to_rfc3339(),
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListIntervalsParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Result<Router, InfraError> {
    let cors = cors_layer(&state.config().cors_allowed_origin)?;
    let base_path = state.config().api_base_path.trim_end_matches('/').to_string();

    let api = Router::new()
        .route("/intervals", get(list_intervals).post(create_interval))
        .route("/ping", get(ping))
        .with_state(state);

    let app = if base_path.is_empty() {
        api
    } else {
        Router::new().nest(&base_path, api)
    };

    Ok(app.layer(cors).layer(TraceLayer::new_for_http()))
}

fn cors_layer(origin: &str) -> Result<CorsLayer, InfraError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);
    if origin.trim() == "*" {
        return Ok(layer.allow_origin(Any));
    }
    let origin = HeaderValue::from_str(origin.trim())
        .map_err(|error| InfraError::InvalidConfig(format!("invalid cors origin '{origin}': {error}")))?;
    Ok(layer.allow_origin(origin))
}

/// Runs repository work on the blocking pool. A panicked or cancelled task
/// becomes `InfraError::Task`.
async fn run_blocking<T, F>(operation: &'static str, work: F) -> Result<T, InfraError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, InfraError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .unwrap_or_else(|error| Err(InfraError::Task(format!("{operation}: {error}"))))
}

async fn ping() -> &'static str {
    "pong"
}

async fn list_intervals(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListIntervalsParams>, QueryRejection>,
) -> Result<Json<IntervalPage>, ApiError> {
    let Query(params) = params.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;

    let worker = Arc::clone(&state);
    let result = run_blocking("list_intervals", move || {
        worker
            .service()
            .list(params.page, params.size, params.sort.as_deref())
    })
    .await;

    result.map(Json).map_err(|error| {
        let message = state.request_error("list_intervals", &error);
        ApiError::from_infra(&error, message, VALIDATION_ERROR)
    })
}

async fn create_interval(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewInterval>, JsonRejection>,
) -> Result<(StatusCode, Json<Interval>), ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        let message = rejection.body_text();
        state.log_error("create_interval", &message);
        ApiError::bad_request(message)
    })?;

    let worker = Arc::clone(&state);
    let result = run_blocking("create_interval", move || worker.service().create(request)).await;

    match result {
        Ok(interval) => {
            state.log_info("create_interval", &format!("created interval {}", interval.id));
            Ok((StatusCode::CREATED, Json(interval)))
        }
        Err(error) => {
            let message = state.request_error("create_interval", &error);
            Err(ApiError::from_infra(&error, message, INVALID_INTERVAL))
        }
    }
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(state: Arc<AppState>) -> Result<(), InfraError> {
    let app = router(Arc::clone(&state))?;
    let address = state.config().bind_address;
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(
        app = %state.config().app_name,
        %address,
        base_path = %state.config().api_base_path,
        "http server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("http server received shutdown signal");
        })
        .await?;
    info!("http server shutdown complete");
    Ok(())
}
