//! Calorie entry handlers. Every query is scoped to the authenticated user.

use crate::api::handlers::{AppError, MessageResponse, TrackerState};
use crate::auth::extractor::AuthUser;
use crate::store::{CalorieEntry, EntryInput};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use uuid::Uuid;

fn parse_input(body: Result<Json<EntryInput>, JsonRejection>) -> Result<EntryInput, AppError> {
    let Json(input) = body.map_err(|e| AppError::BadRequest(format!("Invalid payload: {}", e.body_text())))?;
    input
        .validate()
        .map_err(|msg| AppError::BadRequest(msg.to_string()))?;
    Ok(input)
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid entry id".to_string()))
}

/// POST /calories/add
pub async fn add_entry(
    State(state): State<TrackerState>,
    user: AuthUser,
    body: Result<Json<EntryInput>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let entry = parse_input(body)?.into_entry(user.user_id);
    state.store.insert_entry(&entry).await?;
    tracing::debug!(entry_id = %entry.id, user_id = %user.user_id, "Added calorie entry");
    Ok(MessageResponse::new("Entry added"))
}

/// GET /calories/view
pub async fn list_entries(
    State(state): State<TrackerState>,
    user: AuthUser,
) -> Result<Json<Vec<CalorieEntry>>, AppError> {
    let entries = state.store.list_entries(user.user_id).await?;
    Ok(Json(entries))
}

/// PUT /calories/update/{id}
pub async fn update_entry(
    State(state): State<TrackerState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Result<Json<EntryInput>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let entry_id = parse_id(&id)?;
    let input = parse_input(body)?;

    if !state.store.update_entry(user.user_id, entry_id, &input).await? {
        return Err(AppError::NotFound("Entry not found".to_string()));
    }
    Ok(MessageResponse::new("Entry updated"))
}

/// DELETE /calories/delete/{id}
pub async fn delete_entry(
    State(state): State<TrackerState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let entry_id = parse_id(&id)?;

    if !state.store.delete_entry(user.user_id, entry_id).await? {
        return Err(AppError::NotFound("Entry not found".to_string()));
    }
    Ok(MessageResponse::new("Entry deleted"))
}
