//! Request routing and handlers.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use sign_core::{Error, SignRequest, SignService};
use tracing::{debug, error, warn};

use super::types::{
    HealthResponse, RUNNING_MESSAGE, RootResponse, StatusResponse, error_response, json_response,
    text_response,
};

/// Largest accepted request body, in bytes
pub const MAX_REQUEST_SIZE: usize = 2 * 1024 * 1024 + 4 * 1024;

const KNOWN_PATHS: &[&str] = &[
    "/",
    "/health",
    "/api/sign",
    "/api/sign/health",
    "/api/sign/status",
    "/api/sign/appinfo",
];

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared by every connection
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SignService>,
    /// Deadline for one signing call, including queueing for a worker
    pub timeout: Duration,
}

impl AppState {
    pub fn new(service: Arc<SignService>, timeout: Duration) -> Self {
        Self { service, timeout }
    }
}

/// Dispatch a request. Never fails; every outcome is an HTTP response.
pub async fn route<B>(state: &AppState, req: Request<B>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    debug!("{} {}", req.method(), req.uri().path());

    match (req.method(), req.uri().path()) {
        (&Method::POST, "/api/sign") => sign(state, req).await,
        (&Method::GET, "/api/sign/health") => {
            json_response(StatusCode::OK, &HealthResponse::healthy())
        }
        (&Method::GET, "/api/sign/status") => json_response(
            StatusCode::OK,
            &StatusResponse::running(state.service.state()),
        ),
        (&Method::GET, "/api/sign/appinfo") => app_info(state).await,
        (&Method::GET, "/health") => text_response(StatusCode::OK, RUNNING_MESSAGE),
        (&Method::GET, "/") => json_response(
            StatusCode::OK,
            &RootResponse {
                code: 200,
                message: RUNNING_MESSAGE.to_string(),
            },
        ),
        (_, path) if KNOWN_PATHS.contains(&path) => {
            error_response(StatusCode::METHOD_NOT_ALLOWED, "method not allowed")
        }
        _ => error_response(StatusCode::NOT_FOUND, "not found"),
    }
}

async fn sign<B>(state: &AppState, req: Request<B>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let body = match Limited::new(req.into_body(), MAX_REQUEST_SIZE).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            warn!("Rejected request body over {} bytes", MAX_REQUEST_SIZE);
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("Request body too large (max: {} bytes)", MAX_REQUEST_SIZE),
            );
        }
        Err(e) => {
            warn!("Failed to read request body: {}", e);
            return error_response(StatusCode::BAD_REQUEST, "Failed to read request body");
        }
    };

    let request: SignRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Malformed sign request: {}", e);
            return error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", e));
        }
    };

    // The native call blocks, so it runs on the blocking pool. On timeout the
    // worker keeps running to completion and its result is dropped.
    let service = Arc::clone(&state.service);
    let task = tokio::task::spawn_blocking(move || service.sign(&request));

    match tokio::time::timeout(state.timeout, task).await {
        Ok(Ok(Ok(response))) => json_response(StatusCode::OK, &response),
        Ok(Ok(Err(e))) => sign_error(&e),
        Ok(Err(e)) => {
            error!("Signing worker failed: {}", e);
            internal_error()
        }
        Err(_) => {
            error!("Signing did not finish within {:?}", state.timeout);
            internal_error()
        }
    }
}

fn sign_error(e: &Error) -> Response<Full<Bytes>> {
    if e.is_client_error() {
        error_response(StatusCode::BAD_REQUEST, e.to_string())
    } else if e.is_not_ready() {
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Signing service is not ready, retry later",
        )
    } else {
        internal_error()
    }
}

fn internal_error() -> Response<Full<Bytes>> {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal signing error")
}

async fn app_info(state: &AppState) -> Response<Full<Bytes>> {
    // File reads stay off the async workers.
    let source = state.service.app_info_source().clone();
    let document = match tokio::task::spawn_blocking(move || source.read_document()).await {
        Ok(document) => document,
        Err(e) => {
            error!("appinfo.json reader failed: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read appinfo.json",
            );
        }
    };

    match document {
        Ok(Some(document)) => json_response(StatusCode::OK, &document),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "appinfo.json not found"),
        Err(Error::Json(e)) => {
            error!("appinfo.json is malformed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "appinfo.json is malformed")
        }
        Err(e) => {
            error!("Failed to read appinfo.json: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read appinfo.json",
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::types::ErrorResponse;
    use serde_json::Value;
    use sign_core::native::TestModeBackend;
    use sign_core::{AppInfoSource, NativeInvoker, SignResponse};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn state_with(invoker: NativeInvoker, app_info: AppInfoSource) -> AppState {
        AppState::new(
            Arc::new(SignService::with_invoker(invoker, app_info)),
            Duration::from_secs(5),
        )
    }

    fn test_mode_state() -> AppState {
        state_with(
            NativeInvoker::from_backend(Box::new(TestModeBackend)),
            AppInfoSource::new(vec![PathBuf::from("/nonexistent/appinfo.json")]),
        )
    }

    fn request(method: Method, path: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn body_bytes(response: Response<Full<Bytes>>) -> Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    async fn error_message(response: Response<Full<Bytes>>) -> String {
        let body: ErrorResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        body.error
    }

    #[tokio::test]
    async fn test_sign_in_test_mode() {
        let state = test_mode_state();
        let response = route(
            &state,
            request(
                Method::POST,
                "/api/sign",
                r#"{"cmd":"810_9","src":"0102AB","seq":1}"#,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: SignResponse = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body.platform, "Linux");
        assert_eq!(body.value.token.len(), 64);
        assert_eq!(body.value.extra.len(), 128);
        assert_eq!(body.value.sign.len(), 128);
    }

    #[tokio::test]
    async fn test_sign_validation_is_bad_request() {
        let state = test_mode_state();

        let response = route(
            &state,
            request(Method::POST, "/api/sign", r#"{"cmd":"x","src":"xyz","seq":0}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = route(
            &state,
            request(Method::POST, "/api/sign", r#"{"cmd":"","src":"01","seq":0}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_message(response).await.contains("cmd"));
    }

    #[tokio::test]
    async fn test_sign_malformed_json() {
        let state = test_mode_state();
        let response = route(&state, request(Method::POST, "/api/sign", "{not json")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_sign_body_too_large() {
        let state = test_mode_state();
        let body = format!(
            r#"{{"cmd":"x","src":"{}","seq":0}}"#,
            "0".repeat(MAX_REQUEST_SIZE)
        );
        let response = route(&state, request(Method::POST, "/api/sign", &body)).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_sign_not_initialized_is_unavailable() {
        let state = state_with(NativeInvoker::new(), AppInfoSource::default());
        let response = route(
            &state,
            request(Method::POST, "/api/sign", r#"{"cmd":"x","src":"01","seq":0}"#),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_and_root() {
        let state = test_mode_state();

        let response = route(&state, request(Method::GET, "/api/sign/health", "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["status"], "healthy");

        let response = route(&state, request(Method::GET, "/health", "")).await;
        assert_eq!(&body_bytes(response).await[..], RUNNING_MESSAGE.as_bytes());

        let response = route(&state, request(Method::GET, "/", "")).await;
        let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["code"], 200);
        assert_eq!(json["message"], RUNNING_MESSAGE);
    }

    #[tokio::test]
    async fn test_status_reports_mode() {
        let state = test_mode_state();
        let response = route(&state, request(Method::GET, "/api/sign/status", "")).await;
        let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["status"], "running");
        assert_eq!(json["mode"], "TestMode");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_app_info_route() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("appinfo.json");
        let state = state_with(
            NativeInvoker::new(),
            AppInfoSource::new(vec![path.clone()]),
        );

        let response = route(&state, request(Method::GET, "/api/sign/appinfo", "")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        fs::write(&path, r#"{"Os":"Linux","CurrentVersion":"3.2.19-39038"}"#).unwrap();
        let response = route(&state, request(Method::GET, "/api/sign/appinfo", "")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(json["CurrentVersion"], "3.2.19-39038");

        fs::write(&path, "{broken").unwrap();
        let response = route(&state, request(Method::GET, "/api/sign/appinfo", "")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_message(response).await, "appinfo.json is malformed");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_app_info_route_concurrent_reads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("appinfo.json");
        fs::write(&path, r#"{"Os":"Linux","CurrentVersion":"3.2.19-39038"}"#).unwrap();
        let state = state_with(NativeInvoker::new(), AppInfoSource::new(vec![path]));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move {
                    route(&state, request(Method::GET, "/api/sign/appinfo", ""))
                        .await
                        .status()
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_unknown_path_and_method() {
        let state = test_mode_state();

        let response = route(&state, request(Method::GET, "/nope", "")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(error_message(response).await, "not found");

        let response = route(&state, request(Method::GET, "/api/sign", "")).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
