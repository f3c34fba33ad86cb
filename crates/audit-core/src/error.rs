use serde::Serialize;
use thiserror::Error;

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing context fields for step {step}: {}", fields.join(", "))]
    MissingFields { step: u32, fields: Vec<String> },

    #[error("{0} not found")]
    NotFound(String),

    #[error("unknown step {0}: steps run from 1 to 10")]
    InvalidStep(u32),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("completion service failed: {0}")]
    Completion(#[source] BoxError),

    #[error("persistence failed: {0}")]
    Persistence(#[source] BoxError),
}

impl PipelineError {
    pub fn project_not_found(project_id: i64) -> Self {
        Self::NotFound(format!("project {}", project_id))
    }

    pub fn completion(error: impl Into<BoxError>) -> Self {
        Self::Completion(error.into())
    }

    pub fn persistence(error: impl Into<BoxError>) -> Self {
        Self::Persistence(error.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingFields { .. } => ErrorKind::MissingFields,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidStep(_) | Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Fetch { .. } | Self::Completion(_) => ErrorKind::Upstream,
            Self::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

/// Coarse error category reported to callers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingFields,
    NotFound,
    InvalidInput,
    Upstream,
    Persistence,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingFields => "missing_fields",
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::Upstream => "upstream",
            Self::Persistence => "persistence",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_message_lists_every_field() {
        let error = PipelineError::MissingFields {
            step: 1,
            fields: vec!["url".to_string(), "title".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "missing context fields for step 1: url, title"
        );
        assert_eq!(error.kind(), ErrorKind::MissingFields);
    }

    #[test]
    fn upstream_failures_share_a_kind() {
        let fetch = PipelineError::Fetch {
            url: "https://acme.test".to_string(),
            message: "connection refused".to_string(),
        };
        let completion = PipelineError::completion("quota exceeded");

        assert_eq!(fetch.kind(), ErrorKind::Upstream);
        assert_eq!(completion.kind(), ErrorKind::Upstream);
        assert_eq!(
            completion.to_string(),
            "completion service failed: quota exceeded"
        );
    }

    #[test]
    fn not_found_is_distinct_from_missing_fields() {
        let error = PipelineError::project_not_found(42);
        assert_eq!(error.to_string(), "project 42 not found");
        assert_eq!(error.kind().as_str(), "not_found");
    }
}
