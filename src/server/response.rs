//! HTTP rendering of denials
//!
//! A denial becomes its status code plus a small JSON body:
//! `401 {"reason":"NOT_LOGIN"}`. Only custom denials carry their message to
//! the client; the other reasons keep their detail in the logs. A path
//! that cannot be normalized answers `400 {"reason":"INVALID_PATH"}`.

use crate::access_control::ReasonCode;
use crate::error::{Denial, PathError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON body of a denied request
#[derive(Debug, Serialize)]
pub struct DenialBody<'a> {
    pub reason: ReasonCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
}

impl<'a> From<&'a Denial> for DenialBody<'a> {
    fn from(denial: &'a Denial) -> Self {
        let message = match denial.reason {
            ReasonCode::Custom => denial.message.as_deref(),
            _ => None,
        };
        Self {
            reason: denial.reason,
            message,
        }
    }
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::FORBIDDEN);
        (status, Json(DenialBody::from(&self))).into_response()
    }
}

/// Paths that fail normalization are rejected before any rule runs
impl IntoResponse for PathError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "reason": "INVALID_PATH",
            "message": self.to_string(),
        });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}
