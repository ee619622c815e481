// HTTP response utilities for JSON payloads and error mapping
use crate::application::schedule_service::ServiceError;
use crate::domain::schedule::ScheduleError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Error returned by handlers; rendered as `{"error": "..."}` with a status
/// chosen from the underlying failure.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::Schedule(_)
            | ServiceError::MissingEquipmentId
            | ServiceError::IncompletePlan => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::NoUpcomingOccurrence(_) => StatusCode::CONFLICT,
            ServiceError::Repository(e) => {
                tracing::error!("Plan store failure: {:#}", e);
                StatusCode::BAD_GATEWAY
            }
        };
        ApiError::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::warn!("Request failed with {}: {}", self.status, self.message);
        }
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

/// JSON body with an explicit status code
pub fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    (status, Json(body)).into_response()
}
