//! Response writer: renders the outcome that decided a race.
//!
//! - Win: `200`, `application/json`, `{"time": <ms>}`
//! - Timeout / exhaustion: `500`, plain text message naming the deadline or attempt count

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::hedge::Outcome;
use crate::upstream::LatencyReport;

/// Body of the 404 fallback.
pub const NOT_FOUND_MESSAGE: &str =
    "Not a valid path. Try '/api/smart' or /api/smart?timeout=MILLISECONDS.";

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Success { latency_ms } => {
                (StatusCode::OK, Json(LatencyReport { time: latency_ms })).into_response()
            }
            Outcome::Failure(reason) => {
                (StatusCode::INTERNAL_SERVER_ERROR, reason.to_string()).into_response()
            }
        }
    }
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE).into_response()
}

/// 429 with an empty body.
pub fn too_many_requests() -> Response {
    StatusCode::TOO_MANY_REQUESTS.into_response()
}
