//! Entry API routes

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use axum_extra::extract::Query;
use serde_json::{json, Value};

use crate::db::{self, StoreError};
use crate::domain::{Entry, EntryInput, EntryPatch, DATE_FORMAT};
use crate::query::{filter_entries, sort_for_display};
use crate::validation::validate;

use super::{AppError, AppState, EntryQuery};

/// Public entry routes
pub fn entry_read_routes() -> Router<AppState> {
    Router::new()
        .route("/api/entries", get(list_entries))
        .route("/api/entries/:entry_id", get(get_entry))
}

/// Entry routes that require an authenticated session
pub fn entry_write_routes() -> Router<AppState> {
    Router::new()
        .route("/api/entries", post(create_entry))
        .route("/api/entries/:entry_id", put(update_entry).delete(delete_entry))
}

async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<Vec<Entry>>, AppError> {
    let filter = query.to_filter()?;
    let entries = db::list_entries(&state.pool).await?;
    Ok(Json(sort_for_display(filter_entries(&entries, &filter))))
}

async fn get_entry(
    State(state): State<AppState>,
    entry_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Entry>, AppError> {
    let entry_id = entry_id_from(entry_id)?;
    let entry = db::get_entry(&state.pool, entry_id)
        .await?
        .ok_or_else(entry_not_found)?;

    Ok(Json(entry))
}

async fn create_entry(
    State(state): State<AppState>,
    payload: Result<Json<EntryInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Entry>), AppError> {
    let mut input = json_body(payload)?;

    validate(&input)?;
    normalize_date(&mut input);

    let date = input.date.clone().unwrap_or_default();
    let application_name = input.application_name.clone().unwrap_or_default();
    if db::find_entry_id(&state.pool, &date, &application_name, None)
        .await?
        .is_some()
    {
        return Err(StoreError::Conflict {
            date,
            application_name,
        }
        .into());
    }

    let entry = db::create_entry(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<AppState>,
    entry_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<EntryPatch>, JsonRejection>,
) -> Result<Json<Entry>, AppError> {
    let entry_id = entry_id_from(entry_id)?;
    let mut patch = json_body(payload)?;
    normalize_date(&mut patch.set);

    let existing = db::get_entry(&state.pool, entry_id)
        .await?
        .ok_or_else(entry_not_found)?;

    // Changing the key must not collide with another entry
    if patch.set.date.is_some() || patch.set.application_name.is_some() {
        let date = patch
            .set
            .date
            .clone()
            .unwrap_or_else(|| existing.date.format(DATE_FORMAT).to_string());
        let application_name = patch
            .set
            .application_name
            .clone()
            .unwrap_or_else(|| existing.application_name.clone());

        if db::find_entry_id(&state.pool, &date, &application_name, Some(entry_id))
            .await?
            .is_some()
        {
            return Err(StoreError::Conflict {
                date,
                application_name,
            }
            .into());
        }
    }

    validate(&patch.apply_to(&existing.to_input()))?;

    let entry = db::update_entry(&state.pool, entry_id, &patch)
        .await?
        .ok_or_else(entry_not_found)?;

    Ok(Json(entry))
}

async fn delete_entry(
    State(state): State<AppState>,
    entry_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let entry_id = entry_id_from(entry_id)?;

    if db::delete_entry(&state.pool, entry_id).await? {
        Ok(Json(json!({ "message": "Entry deleted successfully" })))
    } else {
        Err(entry_not_found())
    }
}

fn entry_not_found() -> AppError {
    AppError::NotFound("Entry not found".to_string())
}

/// Ids that are not integers cannot name an entry
fn entry_id_from(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id).map_err(|_| entry_not_found())
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(input)| input)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Store dates in canonical `YYYY-MM-DD` form
fn normalize_date(input: &mut EntryInput) {
    if let Some(date) = input.parsed_date() {
        input.date = Some(date.format(DATE_FORMAT).to_string());
    }
}
