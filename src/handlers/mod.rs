use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::db::StoreError;
use crate::models::event::MISSING_FIELDS_MESSAGE;
use crate::models::NewEvent;
use crate::routes::AppState;
use crate::utils::error::{AppError, FETCH_NOT_IMPLEMENTED_MESSAGE};
use crate::utils::response::{created, data, status};

pub async fn health_check() -> Response {
    status("healthy").into_response()
}

/// Checks for the required fields before the store is consulted. An empty
/// body has no fields; a body that is not JSON fails like any other error.
pub async fn create_event(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::ValidationError(MISSING_FIELDS_MESSAGE.to_string()));
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|err| AppError::InternalServerError(err.to_string()))?;
    let event = NewEvent::from_json(&payload)?;

    let stored = state.store.insert(event).await?;
    tracing::info!(id = stored.id, "Event created");

    Ok(created("Event created successfully").into_response())
}

pub async fn get_data(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = state.store.fetch_all().await.map_err(|err| match err {
        StoreError::NotImplemented(_) => {
            AppError::NotImplemented(FETCH_NOT_IMPLEMENTED_MESSAGE.to_string())
        }
        other => AppError::from(other),
    })?;

    Ok(data(events).into_response())
}
