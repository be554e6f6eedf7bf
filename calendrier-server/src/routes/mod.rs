pub mod calendar;
pub mod partitions;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use calendrier_core::{CalendarError, FieldError, PartitionKey};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Every route, with shared state, CORS and request tracing applied.
///
/// `/{segment}` is a partition name (`S1`, `S2`, `evenement`) for GET and
/// POST, and a calendar id for the administrative DELETE.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/",
            get(calendar::get_calendar).post(calendar::create_calendar),
        )
        .route(
            "/{segment}",
            get(partitions::list)
                .post(partitions::append)
                .delete(calendar::delete_calendar),
        )
        .route(
            "/{segment}/{id}",
            put(partitions::update).delete(partitions::remove),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldError>>,
}

/// Body of successful deletes
#[derive(Serialize)]
pub struct Deleted {
    pub message: &'static str,
    #[serde(rename = "_id")]
    pub id: String,
}

/// Convert calendar errors to HTTP responses
pub enum AppError {
    Calendar(CalendarError),
    /// Body could not be read as JSON of the expected shape
    BadBody(String),
    UnknownPartition(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Calendar(err) => {
                let status = match &err {
                    CalendarError::ValidationFailed(_) | CalendarError::AlreadyExists => {
                        StatusCode::BAD_REQUEST
                    }
                    CalendarError::NotFound(_) => StatusCode::NOT_FOUND,
                    CalendarError::StorageUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                };
                let fields = match &err {
                    CalendarError::ValidationFailed(errors) => Some(errors.fields().to_vec()),
                    _ => None,
                };
                let body = ErrorResponse {
                    error: err.kind(),
                    message: err.to_string(),
                    fields,
                };
                (status, body)
            }
            AppError::BadBody(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "validation_failed",
                    message,
                    fields: None,
                },
            ),
            AppError::UnknownPartition(segment) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "not_found",
                    message: format!("Unknown partition: {}", segment),
                    fields: None,
                },
            ),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, message = %body.message, "Request failed");
        }

        (status, Json(body)).into_response()
    }
}

impl From<CalendarError> for AppError {
    fn from(err: CalendarError) -> Self {
        AppError::Calendar(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadBody(rejection.body_text())
    }
}

/// Resolve a route segment to a partition, 404 if it names none
pub fn partition_key(segment: &str) -> Result<PartitionKey, AppError> {
    segment
        .parse()
        .map_err(|_| AppError::UnknownPartition(segment.to_string()))
}
