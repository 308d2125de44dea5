//! Response bodies and builders for the HTTP front end.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use sign_core::ServiceState;

pub const SERVICE_NAME: &str = "Sign Server";
pub const RUNNING_MESSAGE: &str = "Sign Server is running";

/// Body of every non-2xx JSON response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub service: String,
    pub version: String,
    pub status: String,
    pub mode: ServiceState,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub code: u16,
    pub message: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

impl StatusResponse {
    pub fn running(mode: ServiceState) -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status: "running".to_string(),
            mode,
            timestamp: Utc::now(),
        }
    }
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => build(status, "application/json", Bytes::from(bytes)),
        Err(e) => {
            tracing::error!("Failed to serialize response body: {}", e);
            build(
                StatusCode::INTERNAL_SERVER_ERROR,
                "application/json",
                Bytes::from_static(br#"{"error":"internal server error"}"#),
            )
        }
    }
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response<Full<Bytes>> {
    json_response(
        status,
        &ErrorResponse {
            error: message.into(),
        },
    )
}

pub fn text_response(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    build(status, "text/plain; charset=utf-8", Bytes::from_static(text.as_bytes()))
}

fn build(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
