use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Ways a call to the delegate inference service can fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceFailure {
    Network(String),
    Timeout,
    Authentication(u16),
    Delegate { status: Option<u16>, message: String },
}

impl Display for InferenceFailure {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            InferenceFailure::Network(msg) => write!(f, "network failure: {}", msg),
            InferenceFailure::Timeout => write!(f, "request timed out"),
            InferenceFailure::Authentication(code) => {
                write!(f, "authentication rejected (HTTP {})", code)
            }
            InferenceFailure::Delegate {
                status: Some(code),
                message,
            } => write!(f, "delegate error (HTTP {}): {}", code, message),
            InferenceFailure::Delegate {
                status: None,
                message,
            } => write!(f, "delegate error: {}", message),
        }
    }
}

/// Why a delegate reply was refused by the response validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatViolation {
    MalformedJson(String),
    NotAnObject,
    MissingIncidents,
    IncidentsNotArray,
    UnexpectedField(String),
    Incident { index: usize, reason: String },
}

impl Display for FormatViolation {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            FormatViolation::MalformedJson(msg) => write!(f, "malformed JSON: {}", msg),
            FormatViolation::NotAnObject => write!(f, "top-level value is not an object"),
            FormatViolation::MissingIncidents => write!(f, "missing `incidents` field"),
            FormatViolation::IncidentsNotArray => write!(f, "`incidents` is not an array"),
            FormatViolation::UnexpectedField(name) => {
                write!(f, "unexpected top-level field `{}`", name)
            }
            FormatViolation::Incident { index, reason } => {
                write!(f, "incident #{}: {}", index, reason)
            }
        }
    }
}

/// Incident triage error types
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Invalid video: {0}")]
    Validation(String),

    #[error("Failed to read video: {0}")]
    Encoding(#[source] std::io::Error),

    #[error("Inference failed: {0}")]
    Inference(InferenceFailure),

    #[error("Invalid response format: {0}")]
    ResponseFormat(FormatViolation),

    #[error("No video selected")]
    NoVideoSelected,

    #[error("Analysis already in progress")]
    AnalysisInFlight,

    #[error("Notification relay failed: {0}")]
    Relay(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TriageError {
    /// Stable name of the error kind, used in logs and session diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            TriageError::Validation(_) => "ValidationError",
            TriageError::Encoding(_) => "EncodingError",
            TriageError::Inference(_) => "InferenceError",
            TriageError::ResponseFormat(_) => "ResponseFormatError",
            TriageError::NoVideoSelected => "NoVideoSelected",
            TriageError::AnalysisInFlight => "AnalysisInFlight",
            TriageError::Relay(_) => "RelayError",
            TriageError::Config(_) => "ConfigError",
        }
    }
}

impl From<InferenceFailure> for TriageError {
    fn from(failure: InferenceFailure) -> Self {
        TriageError::Inference(failure)
    }
}

impl From<FormatViolation> for TriageError {
    fn from(violation: FormatViolation) -> Self {
        TriageError::ResponseFormat(violation)
    }
}

/// Result type for triage operations
pub type TriageResult<T> = Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(TriageError::Validation("x".into()).kind(), "ValidationError");
        assert_eq!(
            TriageError::from(InferenceFailure::Timeout).kind(),
            "InferenceError"
        );
        assert_eq!(
            TriageError::from(FormatViolation::NotAnObject).kind(),
            "ResponseFormatError"
        );
    }

    #[test]
    fn test_display_includes_detail() {
        let err = TriageError::from(FormatViolation::Incident {
            index: 2,
            reason: "missing field `description`".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Invalid response format: incident #2: missing field `description`"
        );

        let err = TriageError::from(InferenceFailure::Delegate {
            status: Some(500),
            message: "internal".to_string(),
        });
        assert!(err.to_string().contains("HTTP 500"));
    }
}
