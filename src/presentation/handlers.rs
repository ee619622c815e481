// HTTP request handlers
use crate::application::schedule_service::PlanOverview;
use crate::domain::projection::{parse_start_date, PlanInput, Projection};
use crate::infrastructure::http_response::{json_response, ApiError};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// Optional evaluation instant (`YYYY-MM-DD` or RFC 3339); defaults to the current time
#[derive(Debug, Default, Deserialize)]
pub struct NowQuery {
    pub now: Option<String>,
}

impl NowQuery {
    fn resolve(&self) -> Result<DateTime<Utc>, ApiError> {
        let Some(raw) = self.now.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(Utc::now());
        };

        parse_start_date(&restore_offset_sign(raw)).map_err(|_| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                format!("invalid now '{}' (expected YYYY-MM-DD or RFC 3339)", raw),
            )
        })
    }
}

/// An unencoded `+` in a query string arrives as a space: `...T00:00:00 02:00`.
fn restore_offset_sign(raw: &str) -> String {
    match raw.rsplit_once(' ') {
        Some((timestamp, offset))
            if timestamp.contains('T')
                && offset.len() == 5
                && offset.as_bytes()[2] == b':'
                && offset.bytes().filter(u8::is_ascii_digit).count() == 4 =>
        {
            format!("{}+{}", timestamp, offset)
        }
        _ => raw.to_string(),
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/schedules/preview", post(preview_schedule))
        .route(
            "/equipment/:id/maintenance-plan",
            get(get_maintenance_plan).put(save_maintenance_plan),
        )
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Project upcoming maintenance dates for a (possibly incomplete) plan form
pub async fn preview_schedule(
    Query(query): Query<NowQuery>,
    State(state): State<Arc<AppState>>,
    Json(input): Json<PlanInput>,
) -> Result<Json<Projection>, ApiError> {
    let projection = state.schedule_service.preview(&input, query.resolve()?)?;
    Ok(Json(projection))
}

pub async fn get_maintenance_plan(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<PlanOverview>, ApiError> {
    match state.schedule_service.get_plan(&id).await? {
        Some(overview) => Ok(Json(overview)),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            format!("no maintenance plan for equipment {}", id),
        )),
    }
}

/// Create or update the equipment's maintenance plan
pub async fn save_maintenance_plan(
    Path(id): Path<String>,
    Query(query): Query<NowQuery>,
    State(state): State<Arc<AppState>>,
    Json(input): Json<PlanInput>,
) -> Result<Response, ApiError> {
    let saved = state
        .schedule_service
        .save_plan(&id, &input, query.resolve()?)
        .await?;

    let status = if saved.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(json_response(status, saved))
}
