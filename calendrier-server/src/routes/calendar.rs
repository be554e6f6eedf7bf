//! Whole-calendar endpoints

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use calendrier_core::{CreateCalendarRequest, Semestres};

use crate::routes::{AppError, Deleted};
use crate::state::AppState;

/// Returned with the 404 of `GET /` so clients can still render three empty lists
#[derive(Serialize, Default)]
struct EmptyCalendar {
    semestres: Semestres,
}

/// GET / - The whole calendar, all partitions from one snapshot
pub async fn get_calendar(State(state): State<AppState>) -> Result<Response, AppError> {
    let response = match state.query().get_full_calendar().await? {
        Some(calendar) => Json(calendar).into_response(),
        None => (StatusCode::NOT_FOUND, Json(EmptyCalendar::default())).into_response(),
    };
    Ok(response)
}

/// POST / - Create the calendar (400 if it already exists)
pub async fn create_calendar(
    State(state): State<AppState>,
    body: Result<Json<CreateCalendarRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body?;
    let calendar = state.query().create_calendar(&request).await?;
    Ok((StatusCode::CREATED, Json(calendar)).into_response())
}

/// DELETE /{id} - Remove the calendar entirely
pub async fn delete_calendar(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Deleted>, AppError> {
    state.query().delete_calendar(&id).await?;

    Ok(Json(Deleted {
        message: "Calendar deleted",
        id,
    }))
}
