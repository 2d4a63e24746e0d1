//! Shared response plumbing: `RouteResult`/`RouteErrorResponse`, the
//! `SchedulerError` -> HTTP conversion. Mirrors `web::common::RouteErrorResponse`
//! and its `From<RequestError> for RouteErrorResponse` impl, kept in the same shape.

use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use model::SchedulerError;
use serde::{Deserialize, Serialize};

pub type RouteResult<O> = Result<O, RouteErrorResponse>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteErrorResponse {
    #[serde(skip)]
    pub status_code: StatusCode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RouteErrorResponse {
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            http_method: None,
            requested_uri: None,
            message: None,
        }
    }

    pub fn not_found(method: &Method, uri: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND)
            .with_method(method)
            .with_uri(uri)
            .with_message(message)
    }

    pub fn with_method(mut self, method: &Method) -> Self {
        self.http_method = Some(method.to_string());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.requested_uri = Some(uri.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Every variant but `NoSchedule` maps to a fixed HTTP status. `NoSchedule`
/// is handled separately by the `/schedule`
/// and `/task` handlers (it is a 200 with an error-shaped body, not an HTTP
/// error), so it is not expected to reach this conversion in practice; it
/// still needs a defined mapping for any call site that does route it here.
impl From<SchedulerError> for RouteErrorResponse {
    fn from(error: SchedulerError) -> Self {
        let status = match &error {
            SchedulerError::BadInput(_) => StatusCode::BAD_REQUEST,
            SchedulerError::NotFound(_) => StatusCode::NOT_FOUND,
            SchedulerError::NoRoute { .. } => StatusCode::BAD_REQUEST,
            SchedulerError::ProviderError(_) => StatusCode::BAD_REQUEST,
            SchedulerError::NoSchedule(_) => StatusCode::OK,
            SchedulerError::Conflict(_) => StatusCode::BAD_REQUEST,
            SchedulerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status).with_message(error.to_string())
    }
}

impl IntoResponse for RouteErrorResponse {
    fn into_response(self) -> axum::response::Response {
        (self.status_code, Json(self)).into_response()
    }
}
