//! Error types for the Boundary provider.

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while serving provider requests.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested resource was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The requested resource or data source type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// The Boundary API returned an error response.
    #[error("{context}: {status} {kind}: {message}")]
    Api {
        /// Static description of the operation that failed.
        context: String,
        /// HTTP status code.
        status: u16,
        /// Boundary error kind, e.g. `NotFound` or `InvalidArgument`.
        kind: String,
        /// Error message reported by the controller.
        message: String,
    },

    /// The HTTP request could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A gRPC transport error occurred.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// Resource already exists (create conflict).
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Permission denied (authentication/authorization failure).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Service temporarily unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Operation failed due to current state (precondition not met).
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// Operation not implemented.
    #[error("Unimplemented: {0}")]
    Unimplemented(String),

    /// Invalid request from the host runtime.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The data source generator failed.
    #[error("Code generation error: {0}")]
    Codegen(String),
}

/// Error body returned by the Boundary controller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    /// Error kind, e.g. `NotFound`.
    #[serde(default)]
    pub kind: String,
    /// Human readable message.
    #[serde(default)]
    pub message: String,
}

impl ProviderError {
    /// Build an API error from a response status and its raw body.
    ///
    /// Bodies that are not Boundary error JSON are kept verbatim as the message.
    pub fn from_api_response(context: impl Into<String>, status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<ApiErrorBody>(body).unwrap_or_else(|_| ApiErrorBody {
            kind: String::new(),
            message: body.trim().to_string(),
        });
        Self::Api {
            context: context.into(),
            status,
            kind: if parsed.kind.is_empty() {
                kind_for_status(status).to_string()
            } else {
                parsed.kind
            },
            message: parsed.message,
        }
    }

    /// Whether the error means the remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Api { status, kind, .. } => *status == 404 || kind == "NotFound",
            _ => false,
        }
    }

    /// Prefix the error with a static description of the failed operation.
    ///
    /// API errors keep their structure so [`is_not_found`](Self::is_not_found)
    /// still works after wrapping.
    pub fn context(self, context: impl Into<String>) -> Self {
        let context = context.into();
        match self {
            Self::Api {
                status,
                kind,
                message,
                ..
            } => Self::Api {
                context,
                status,
                kind,
                message,
            },
            Self::NotFound(msg) => Self::NotFound(format!("{}: {}", context, msg)),
            Self::Validation(msg) => Self::Validation(format!("{}: {}", context, msg)),
            Self::Configuration(msg) => Self::Configuration(format!("{}: {}", context, msg)),
            Self::Http(err) => Self::Unavailable(format!("{}: {}", context, err)),
            Self::Serialization(err) => Self::InvalidRequest(format!("{}: {}", context, err)),
            other => other,
        }
    }

    /// Get the error message without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Configuration(msg)
            | Self::UnknownResource(msg)
            | Self::AlreadyExists(msg)
            | Self::PermissionDenied(msg)
            | Self::Unavailable(msg)
            | Self::FailedPrecondition(msg)
            | Self::Unimplemented(msg)
            | Self::InvalidRequest(msg)
            | Self::Codegen(msg) => msg.clone(),
            Self::Api { message, .. } => message.clone(),
            Self::Http(err) => err.to_string(),
            Self::Serialization(err) => err.to_string(),
            Self::Transport(err) => err.to_string(),
        }
    }
}

fn kind_for_status(status: u16) -> &'static str {
    match status {
        400 => "InvalidArgument",
        401 => "Unauthenticated",
        403 => "PermissionDenied",
        404 => "NotFound",
        409 => "AlreadyExists",
        _ => "Unknown",
    }
}

impl From<ProviderError> for tonic::Status {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(msg) => tonic::Status::not_found(msg),
            ProviderError::Validation(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Configuration(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::UnknownResource(msg) => tonic::Status::not_found(msg),
            ProviderError::Api {
                context,
                status,
                kind,
                message,
            } => {
                let msg = format!("{}: {} {}: {}", context, status, kind, message);
                match status {
                    400 => tonic::Status::invalid_argument(msg),
                    401 => tonic::Status::unauthenticated(msg),
                    403 => tonic::Status::permission_denied(msg),
                    404 => tonic::Status::not_found(msg),
                    409 => tonic::Status::already_exists(msg),
                    _ => tonic::Status::internal(msg),
                }
            },
            ProviderError::Http(err) => tonic::Status::unavailable(format!("HTTP error: {}", err)),
            ProviderError::Serialization(err) => {
                tonic::Status::invalid_argument(format!("Serialization error: {}", err))
            },
            ProviderError::Transport(err) => {
                tonic::Status::unavailable(format!("Transport error: {}", err))
            },
            ProviderError::AlreadyExists(msg) => tonic::Status::already_exists(msg),
            ProviderError::PermissionDenied(msg) => tonic::Status::permission_denied(msg),
            ProviderError::Unavailable(msg) => tonic::Status::unavailable(msg),
            ProviderError::FailedPrecondition(msg) => tonic::Status::failed_precondition(msg),
            ProviderError::Unimplemented(msg) => tonic::Status::unimplemented(msg),
            ProviderError::InvalidRequest(msg) => tonic::Status::invalid_argument(msg),
            ProviderError::Codegen(msg) => tonic::Status::internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("hst_1234567890".to_string());
        assert_eq!(format!("{}", err), "Resource not found: hst_1234567890");

        let err = ProviderError::UnknownResource("boundary_target".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: boundary_target");
    }

    #[test]
    fn test_from_api_response_parses_boundary_body() {
        let body = r#"{"kind":"NotFound","message":"Resource not found."}"#;
        let err = ProviderError::from_api_response("error reading host", 404, body);
        assert!(err.is_not_found());
        assert_eq!(err.message(), "Resource not found.");
        assert_eq!(
            format!("{}", err),
            "error reading host: 404 NotFound: Resource not found."
        );
    }

    #[test]
    fn test_from_api_response_keeps_raw_body() {
        let err = ProviderError::from_api_response("error creating role", 502, "bad gateway\n");
        match &err {
            ProviderError::Api { kind, message, .. } => {
                assert_eq!(kind, "Unknown");
                assert_eq!(message, "bad gateway");
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_by_kind() {
        let body = r#"{"kind":"NotFound","message":"gone"}"#;
        let err = ProviderError::from_api_response("read", 400, body);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_context_replaces_api_context() {
        let err = ProviderError::from_api_response("GET hosts/hst_1", 404, "{}")
            .context("error reading host");
        assert_eq!(format!("{}", err), "error reading host: 404 NotFound: ");
        assert!(err.is_not_found());

        let err = ProviderError::Validation("bad".to_string()).context("error updating role");
        assert_eq!(err.message(), "error updating role: bad");
    }

    #[test]
    fn test_error_to_status() {
        let status: tonic::Status = ProviderError::NotFound("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::NotFound);

        let status: tonic::Status = ProviderError::Configuration("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::FailedPrecondition);

        let status: tonic::Status =
            ProviderError::from_api_response("error creating worker", 403, "{}").into();
        assert_eq!(status.code(), tonic::Code::PermissionDenied);

        let status: tonic::Status =
            ProviderError::from_api_response("error creating worker", 500, "{}").into();
        assert_eq!(status.code(), tonic::Code::Internal);

        let status: tonic::Status = ProviderError::Codegen("test".to_string()).into();
        assert_eq!(status.code(), tonic::Code::Internal);
    }
}
