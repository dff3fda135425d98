use serde::Serialize;
use thiserror::Error;

use crate::capability::CapabilityError;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("QC report {bucket}/{key} not found")]
    Missing { bucket: String, key: String },

    #[error("QC report {key} is empty")]
    Empty { key: String },

    #[error("QC report {key} is not valid JSON: {source}")]
    Json {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("QC report {key} is not a non-empty JSON object")]
    NotObject { key: String },

    #[error("QC report {key} could not be decompressed: {source}")]
    Gzip {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Capability(CapabilityError),
}

/// Failure of one pipeline stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("{stage} failed: {source}")]
    Capability {
        stage: &'static str,
        #[source]
        source: CapabilityError,
    },

    #[error("invocation cancelled: progress receiver dropped")]
    Cancelled,

    #[error("{0}")]
    Unexpected(String),
}

impl StageError {
    pub fn capability(stage: &'static str, source: CapabilityError) -> Self {
        StageError::Capability { stage, source }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    DataUnavailable,
    ExternalCapabilityFailure,
    UnexpectedFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::DataUnavailable => "data_unavailable",
            FailureKind::ExternalCapabilityFailure => "external_capability_failure",
            FailureKind::UnexpectedFailure => "unexpected_failure",
        }
    }
}

/// The only error type that leaves the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {message}", kind.as_str())]
pub struct InsightError {
    pub kind: FailureKind,
    pub message: String,
}

impl InsightError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(FailureKind::UnexpectedFailure, message)
    }
}

impl From<StageError> for InsightError {
    fn from(err: StageError) -> Self {
        let kind = match &err {
            StageError::Report(ReportError::Capability(source)) if !source.is_not_found() => {
                FailureKind::ExternalCapabilityFailure
            }
            StageError::Report(_) => FailureKind::DataUnavailable,
            StageError::Capability { .. } => FailureKind::ExternalCapabilityFailure,
            StageError::Cancelled | StageError::Unexpected(_) => FailureKind::UnexpectedFailure,
        };
        InsightError::new(kind, err.to_string())
    }
}

#[cfg(test)]
#[path = "../tests/src_inline/error.rs"]
mod tests;
