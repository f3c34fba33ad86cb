use std::error::Error as _;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use audit_core::{ErrorKind, PipelineError};
use serde::Serialize;
use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// Failure returned by a handler. `debug` controls whether the source chain
/// is exposed in the body.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct AppError {
    #[source]
    error: PipelineError,
    debug: bool,
}

impl AppError {
    pub fn new(error: PipelineError, debug: bool) -> Self {
        Self { error, debug }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    fn detail(&self) -> Vec<String> {
        let mut chain = Vec::new();
        let mut source = self.error.source();
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }
        chain
    }
}

#[derive(Serialize)]
struct JsonError {
    error: String,
    kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<Vec<String>>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::MissingFields => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
            ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed with {}: {}", status, self.error);
        } else {
            log::warn!("Request rejected with {}: {}", status, self.error);
        }

        HttpResponse::build(status).json(JsonError {
            error: self.error.to_string(),
            kind: self.kind(),
            detail: self.debug.then(|| self.detail()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(error: AppError) -> serde_json::Value {
        let response = error.error_response();
        let bytes = to_bytes(response.into_body()).await.expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn kinds_map_to_status_codes() {
        let cases = [
            (PipelineError::project_not_found(1), StatusCode::NOT_FOUND),
            (PipelineError::InvalidStep(11), StatusCode::BAD_REQUEST),
            (
                PipelineError::MissingFields {
                    step: 1,
                    fields: vec!["url".to_string()],
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (PipelineError::completion("timeout"), StatusCode::BAD_GATEWAY),
            (
                PipelineError::persistence("disk full"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(AppError::new(error, false).status_code(), status);
        }
    }

    #[actix_web::test]
    async fn detail_is_only_exposed_in_debug_mode() {
        let quiet = body_of(AppError::new(PipelineError::completion("HTTP 429"), false)).await;
        assert_eq!(quiet["error"], "completion service failed: HTTP 429");
        assert_eq!(quiet["kind"], "upstream");
        assert!(quiet.get("detail").is_none());

        let verbose = body_of(AppError::new(PipelineError::completion("HTTP 429"), true)).await;
        assert_eq!(verbose["detail"], serde_json::json!(["HTTP 429"]));
    }
}
