//! Per-partition event endpoints (`/S1`, `/S2`, `/evenement`)

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};

use calendrier_core::{EventDraft, EventPatch, EventRecord};

use crate::routes::{AppError, Deleted, partition_key};
use crate::state::AppState;

/// GET /{partition} - Events in stored order (empty if no calendar yet)
pub async fn list(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Result<Json<Vec<EventRecord>>, AppError> {
    let key = partition_key(&segment)?;
    let events = state.partition(key).list().await?;
    Ok(Json(events))
}

/// POST /{partition} - Append an event
pub async fn append(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    body: Result<Json<EventDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<EventRecord>), AppError> {
    let key = partition_key(&segment)?;
    let Json(draft) = body?;

    let record = state.partition(key).append(&draft).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /{partition}/{id} - Overwrite the supplied fields of an event
pub async fn update(
    State(state): State<AppState>,
    Path((segment, id)): Path<(String, String)>,
    body: Result<Json<EventPatch>, JsonRejection>,
) -> Result<Json<EventRecord>, AppError> {
    let key = partition_key(&segment)?;
    let Json(patch) = body?;

    let record = state.partition(key).update(&id, &patch).await?;
    Ok(Json(record))
}

/// DELETE /{partition}/{id} - Remove an event
pub async fn remove(
    State(state): State<AppState>,
    Path((segment, id)): Path<(String, String)>,
) -> Result<Json<Deleted>, AppError> {
    let key = partition_key(&segment)?;
    state.partition(key).remove(&id).await?;

    Ok(Json(Deleted {
        message: "Event deleted",
        id,
    }))
}
