//! HTTP routing.
//!
//! ```text
//! POST /v1/:operation   Authorization: Bearer <token>, JSON body
//! GET  /health
//! ```
//!
//! Operator calls skip the bearer token and carry `adminSecret` in the body.

use crate::domain::{ApiError, ApiOperation, GatewayError};
use crate::middleware::bearer_token;
use crate::service::GatewayService;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Build the gateway router.
pub fn create_router(service: Arc<GatewayService>) -> Router {
    Router::new()
        .route("/v1/:operation", post(dispatch))
        .route("/health", get(health_check))
        .with_state(service)
}

/// Serve `service` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    service: Arc<GatewayService>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Gateway listening");
    }
    axum::serve(listener, create_router(service))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn dispatch(
    State(service): State<Arc<GatewayService>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match handle(&service, &name, &headers, &body).await {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(err) => {
            debug!(operation = %name, kind = %err.kind, reason = err.reason, "Operation failed");
            err.into_response()
        }
    }
}

async fn handle(
    service: &GatewayService,
    name: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Value, ApiError> {
    let operation: ApiOperation = name.parse()?;

    if operation.is_admin() {
        let request = parse_body(body)?;
        return match operation {
            ApiOperation::DiagnoseOrphans => reply(service.diagnose_orphans(&request)?),
            ApiOperation::CleanupOrphans => reply(service.cleanup_orphans(&request).await?),
            _ => reply(service.sweep_rate_limits(&request).await?),
        };
    }

    let caller = service.authenticate(bearer_token(headers)).await?;
    match operation {
        ApiOperation::IssuePairingCode => reply(service.issue_pairing_code(&caller).await?),
        ApiOperation::ValidatePairingCode => {
            reply(service.validate_pairing_code(&caller, parse_body(body)?).await?)
        }
        ApiOperation::ConnectToPartner => {
            reply(service.connect_to_partner(&caller, parse_body(body)?).await?)
        }
        ApiOperation::DisconnectPartner => reply(service.disconnect_partner(&caller).await?),
        ApiOperation::DeleteAccount => reply(service.delete_account(&caller).await?),
        ApiOperation::SyncSubscription => {
            reply(service.sync_subscription(&caller, parse_body(body)?).await?)
        }
        ApiOperation::AcknowledgeConnection => {
            reply(service.acknowledge_connection(&caller).await?)
        }
        ApiOperation::GetPairingStatus => reply(service.pairing_status(&caller)?),
        ApiOperation::DiagnoseOrphans
        | ApiOperation::CleanupOrphans
        | ApiOperation::SweepRateLimits => Err(GatewayError::UnknownOperation(name.to_string()).into()),
    }
}

/// An empty body reads as `{}`.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };
    serde_json::from_slice(body).map_err(|e| GatewayError::InvalidPayload(e.to_string()).into())
}

fn reply<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| GatewayError::Encoding(e.to_string()).into())
}
