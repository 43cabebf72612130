//! # Calendar Handlers
//!
//! CRUD for calendar events. Dates arrive as `YYYY-MM-DD` plus `HH:MM`
//! times and are interpreted as UTC.

use super::AppState;
use super::types::{
    ApiMessage, CreateEventRequest, UpdateEventRequest, bad_request, store_error,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use plandeck_core::records::DEFAULT_EVENT_COLOR;
use plandeck_core::{CalendarEventRecord, PlandeckError};
use uuid::Uuid;

/// Combine a date string and a time string into a UTC timestamp.
fn parse_event_time(
    date: &str,
    time: &str,
) -> Result<DateTime<Utc>, (StatusCode, Json<ApiMessage>)> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| bad_request(format!("invalid date: {e}")))?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|e| bad_request(format!("invalid time: {e}")))?;
    Ok(date.and_time(time).and_utc())
}

/// Create a calendar event.
pub async fn create_event_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<Json<CalendarEventRecord>, (StatusCode, Json<ApiMessage>)> {
    let start_time = parse_event_time(&request.date, &request.start_time)?;
    let end_time = parse_event_time(&request.date, &request.end_time)?;

    let now = Utc::now();
    let record = CalendarEventRecord {
        id: Uuid::new_v4().to_string(),
        owner: "default".to_string(),
        title: request.title,
        description: request.description,
        start_time,
        end_time,
        all_day: request.all_day.unwrap_or(false),
        location: request.location,
        color: DEFAULT_EVENT_COLOR.to_string(),
        created_at: now,
        updated_at: now,
    };
    record.validate().map_err(|e| store_error(&e))?;

    let mut workspace = state.workspace.write().await;
    workspace.upsert_event(&record).map_err(|e| store_error(&e))?;
    tracing::info!(event = %record.id, title = %record.title, "created calendar event");
    Ok(Json(record))
}

/// List all calendar events ordered by start time.
pub async fn list_events_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<CalendarEventRecord>>, (StatusCode, Json<ApiMessage>)> {
    let workspace = state.workspace.read().await;
    let mut events = workspace.events().map_err(|e| store_error(&e))?;
    events.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    Ok(Json(events))
}

/// Fetch one calendar event.
pub async fn get_event_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CalendarEventRecord>, (StatusCode, Json<ApiMessage>)> {
    let workspace = state.workspace.read().await;
    workspace
        .event(&id)
        .map_err(|e| store_error(&e))?
        .map(Json)
        .ok_or_else(|| store_error(&PlandeckError::NotFound(format!("calendar event {id}"))))
}

/// Partially update a calendar event.
pub async fn update_event_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<CalendarEventRecord>, (StatusCode, Json<ApiMessage>)> {
    let mut workspace = state.workspace.write().await;
    let mut record = workspace
        .event(&id)
        .map_err(|e| store_error(&e))?
        .ok_or_else(|| store_error(&PlandeckError::NotFound(format!("calendar event {id}"))))?;

    if let Some(title) = request.title {
        record.title = title;
    }
    if let Some(description) = request.description {
        record.description = Some(description);
    }
    if let Some(location) = request.location {
        record.location = Some(location);
    }
    // Time updates need the date: either the provided one or the date of
    // the stored start time.
    if request.start_time.is_some() || request.end_time.is_some() || request.date.is_some() {
        let date = match &request.date {
            Some(d) => d.clone(),
            None => record.start_time.format("%Y-%m-%d").to_string(),
        };
        if let Some(start) = &request.start_time {
            record.start_time = parse_event_time(&date, start)?;
        }
        if let Some(end) = &request.end_time {
            record.end_time = parse_event_time(&date, end)?;
        }
    }
    record.updated_at = Utc::now();
    record.validate().map_err(|e| store_error(&e))?;

    workspace.upsert_event(&record).map_err(|e| store_error(&e))?;
    Ok(Json(record))
}

/// Delete a calendar event.
pub async fn delete_event_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiMessage>)> {
    let mut workspace = state.workspace.write().await;
    if workspace.remove_event(&id).map_err(|e| store_error(&e))? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(store_error(&PlandeckError::NotFound(format!(
            "calendar event {id}"
        ))))
    }
}
