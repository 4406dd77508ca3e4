//! Subsystem errors into `ApiError`, and `ApiError` into an HTTP response.

use crate::domain::{ApiError, GatewayError};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use cl_01_document_store::StoreError;
use cl_02_rate_limiter::RateLimitError;
use cl_03_pairing_codes::PairingError;
use cl_04_subscription_inheritance::InheritanceError;
use cl_05_connection_engine::ConnectionError;
use cl_06_orphan_auditor::AuditError;
use cl_07_account_deletion::DeletionError;

macro_rules! classified_into_api_error {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for ApiError {
                fn from(e: $err) -> Self {
                    ApiError::from_classified(&e)
                }
            }
        )*
    };
}

classified_into_api_error!(
    GatewayError,
    StoreError,
    PairingError,
    InheritanceError,
    ConnectionError,
    AuditError,
    DeletionError,
);

impl From<RateLimitError> for ApiError {
    fn from(e: RateLimitError) -> Self {
        let api = ApiError::from_classified(&e);
        match e {
            RateLimitError::Exceeded {
                retry_after_secs, ..
            } => api.with_retry_after(retry_after_secs),
            RateLimitError::Store(_) => api,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let retry_after = self.retry_after_secs;
        let unauthenticated = status == StatusCode::UNAUTHORIZED;

        let mut response = (status, Json(serde_json::json!({ "error": self }))).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        if unauthenticated {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
