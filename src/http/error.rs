//! Error envelope and its axum `IntoResponse` impl.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use statsgate_core::GatewayError;

#[derive(Debug, Serialize)]
struct ErrorDetails {
    code: &'static str,
    request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<&'static str>,
    retryable: bool,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<ErrorDetails>,
    #[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

/// A `GatewayError` plus the request id it occurred under, carried
/// together so the response body and the `X-Request-ID` header always
/// agree on the same generated id.
pub struct AppError {
    pub request_id: String,
    pub error: GatewayError<String>,
}

impl AppError {
    pub fn new(request_id: String, error: GatewayError<String>) -> Self {
        Self { request_id, error }
    }

    /// Status code for this error as a user-visible HTTP failure.
    ///
    /// `GatewayError::http_status` doubles as "what status would this be
    /// if it reached the caller", but `PrivateProfile`/`NoAchievements`
    /// map to 200 there because those are normally absorbed into a
    /// successful, partially-populated response as a non-critical
    /// diagnostic. When one of those reaches this impl at all, it means
    /// it failed the *critical* stats fetch, so it is surfaced as a real
    /// error status here instead.
    fn status(&self) -> StatusCode {
        let code = match self.error {
            GatewayError::PrivateProfile => 403,
            GatewayError::NoAchievements => 404,
            _ => self.error.http_status(),
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn retry_after_seconds(&self) -> Option<u64> {
        match &self.error {
            GatewayError::RateLimited { retry_after } => retry_after.map(|d| d.as_secs().max(1)),
            _ => None,
        }
    }

    fn upstream_status(&self) -> Option<u16> {
        match &self.error {
            GatewayError::UpstreamHttp { status } => Some(*status),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retry_after = self.retry_after_seconds();
        let envelope = ErrorEnvelope {
            status: status.as_u16(),
            message: self.error.to_string(),
            details: Some(ErrorDetails {
                code: self.error.code(),
                request_id: self.request_id.clone(),
                field: None,
                resource: None,
                retry_after_seconds: retry_after,
                upstream_status: self.upstream_status(),
                service: matches!(
                    self.error,
                    GatewayError::UpstreamHttp { .. }
                        | GatewayError::Network { .. }
                        | GatewayError::CircuitOpen
                )
                .then_some("steam_api"),
                retryable: self.error.is_retryable(),
            }),
            retry_after,
        };

        let mut response = (status, Json(envelope)).into_response();
        if let Some(seconds) = retry_after {
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(axum::http::header::RETRY_AFTER, value);
            }
        }
        if let Ok(value) = HeaderValue::from_str(&self.request_id) {
            response.headers_mut().insert("x-request-id", value);
        }
        response
    }
}
