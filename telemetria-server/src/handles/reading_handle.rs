use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{delete, get};
use axum::{Json, Router, middleware};
use serde::{Deserialize, Serialize};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::errors::{ApiError, ReadingError};
use crate::middlewares::{TokenState, auth};
use crate::models::Reading;
use crate::repositories::ReadingRepository;
use crate::services::{EventBus, ReadingEvent};

#[derive(Clone)]
pub struct ReadingState {
    pub reading_repository: Arc<ReadingRepository>,
    pub event_bus: Arc<EventBus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingBody {
    pub sensor_id: i32,
    pub value: f64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRangeQuery {
    pub inicio: Option<String>,
    pub fim: Option<String>,
}

pub fn reading_router(reading_state: ReadingState, token_state: TokenState) -> Router {
    Router::new()
        .route(
            "/dados-sensores",
            get(get_readings)
                .route_layer(middleware::from_fn_with_state(token_state.clone(), auth))
                // Ingest stays open: sensors push without credentials while
                // reads sit behind the token gate.
                .post(ingest_reading),
        )
        .route(
            "/dados-sensores/tempo",
            get(get_readings_in_range)
                .route_layer(middleware::from_fn_with_state(token_state.clone(), auth)),
        )
        .route(
            "/limpar-dados",
            delete(clear_readings)
                .route_layer(middleware::from_fn_with_state(token_state.clone(), auth)),
        )
        .with_state(reading_state)
}

pub async fn ingest_reading(
    State(state): State<ReadingState>,
    Json(body): Json<ReadingBody>,
) -> Result<String, ApiError> {
    let reading = state
        .reading_repository
        .create(body.sensor_id, body.value, body.timestamp)
        .await?;

    // Best-effort fan-out right after the write; a failed or missed delivery
    // is not reported back to the sensor.
    let delivered = state.event_bus.publish(ReadingEvent::Created(reading));

    tracing::debug!(subscribers = delivered, "reading stored and broadcast");

    Ok("Sensor data received and stored successfully.".to_string())
}

pub async fn get_readings(
    State(state): State<ReadingState>,
) -> Result<Json<Vec<Reading>>, ApiError> {
    let readings = state.reading_repository.find_all().await?;

    Ok(Json(readings))
}

pub async fn get_readings_in_range(
    State(state): State<ReadingState>,
    Query(range): Query<TimeRangeQuery>,
) -> Result<Json<Vec<Reading>>, ApiError> {
    let inicio = range.inicio.ok_or(ReadingError::InvalidRange)?;
    let fim = range.fim.ok_or(ReadingError::InvalidRange)?;

    let start = parse_time_bound(&inicio)?;
    let end = parse_time_bound(&fim)?;

    let readings = state.reading_repository.find_in_range(start, end).await?;

    Ok(Json(readings))
}

pub async fn clear_readings(State(state): State<ReadingState>) -> Result<String, ApiError> {
    state.reading_repository.delete_all().await?;

    tracing::info!("all sensor readings cleared");

    Ok("All sensor data has been cleared.".to_string())
}

const SQLITE_DATETIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Range bounds arrive as strings; RFC 3339 and the bare SQLite datetime
/// form are accepted, anything else is an invalid range.
fn parse_time_bound(raw: &str) -> Result<OffsetDateTime, ReadingError> {
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(parsed);
    }

    PrimitiveDateTime::parse(raw, SQLITE_DATETIME)
        .map(|naive| naive.assume_utc())
        .map_err(|_| ReadingError::InvalidRange)
}
