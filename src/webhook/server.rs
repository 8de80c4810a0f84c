//! Admission webhook HTTP server.
//!
//! Serves the mutating endpoint and the health check over TLS. The API
//! server posts an `AdmissionReview` envelope to `/mutate`; the handler
//! answers with the same envelope carrying the response.
//!
//! Error surfaces follow the admission-webhook protocol: a malformed
//! envelope is an HTTP 4xx (rejected by the JSON extractor before the
//! handler runs), an envelope without a request is answered as a regular
//! admission denial, and a response-encoding failure is an HTTP 500.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_server::tls_rustls::RustlsConfig;
use kube::core::DynamicObject;
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::rules::RuleStore;
use crate::webhook::evaluator::evaluate;

/// Shared state for webhook handlers
pub struct WebhookState {
    pub rules: RuleStore,
}

impl WebhookState {
    pub fn new(rules: RuleStore) -> Self {
        Self { rules }
    }
}

/// Errors that can occur when running the webhook server
#[derive(Debug, Error)]
pub enum WebhookError {
    /// TLS configuration error
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    /// Server error
    #[error("webhook server error: {0}")]
    Server(String),
}

/// Create the webhook router
pub fn create_webhook_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/mutate", post(mutate))
        .route("/healthz", get(healthz))
        .with_state(state)
}

/// Health check handler.
///
/// Always returns 200; no dependency on the rule store or request parsing.
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Mutating admission webhook handler
async fn mutate(
    State(state): State<Arc<WebhookState>>,
    Json(review): Json<AdmissionReview<DynamicObject>>,
) -> Response {
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(req) => req,
        Err(e) => {
            error!(error = %e, "empty admission request");
            // The envelope itself was valid, so this is answered as an
            // admission denial rather than a transport error. There is no
            // uid to echo.
            return (
                StatusCode::OK,
                Json(
                    AdmissionResponse::invalid(format!("empty admission request: {e}"))
                        .into_review(),
                ),
            )
                .into_response();
        }
    };

    debug!(
        uid = %request.uid,
        group = %request.kind.group,
        version = %request.kind.version,
        kind = %request.kind.kind,
        "got admission request"
    );

    match evaluate(&state.rules, &request) {
        Ok(response) => (StatusCode::OK, Json(response.into_review())).into_response(),
        Err(e) => {
            error!(uid = %request.uid, error = %e, "error encoding response");
            (StatusCode::INTERNAL_SERVER_ERROR, "error encoding response").into_response()
        }
    }
}

/// Run the webhook server with TLS
///
/// Binds to 0.0.0.0 on the given port and serves the `/mutate` and
/// `/healthz` endpoints. TLS certificate and key are loaded from the given
/// PEM files.
pub async fn run_webhook_server(
    rules: RuleStore,
    port: u16,
    cert_path: &Path,
    key_path: &Path,
) -> Result<(), WebhookError> {
    let state = Arc::new(WebhookState::new(rules));
    let app = create_webhook_router(state);

    let config = RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(|e| WebhookError::TlsConfig(e.to_string()))?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(port, "webhook server listening with TLS");

    axum_server::bind_rustls(addr, config)
        .serve(app.into_make_service())
        .await
        .map_err(|e| WebhookError::Server(e.to_string()))?;

    Ok(())
}
