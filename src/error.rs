//! Error types for the deactivation workflow.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Shorthand for a [`ErrorKind::NotFound`] error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound(message.into()))
    }

    /// True if the rule or its archive was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Invalid Duplicate Rule name: {0}")]
    InvalidRuleName(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Metadata API call failed: {0}")]
    ExternalService(String),

    #[error("Unable to deploy the deactivated rule: {message}")]
    DeploymentFailure {
        message: String,
        /// Component-level problems reported by the deploy job.
        problems: Vec<String>,
    },

    #[error("Timed out after {seconds}s waiting for {operation}")]
    Timeout { operation: String, seconds: u64 },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Invalid Duplicate Rule document: {0}")]
    InvalidRule(String),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<duprule_sf_metadata::Error> for Error {
    fn from(err: duprule_sf_metadata::Error) -> Self {
        Error {
            kind: ErrorKind::ExternalService(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<duprule_sf_auth::Error> for Error {
    fn from(err: duprule_sf_auth::Error) -> Self {
        Error {
            kind: ErrorKind::ExternalService(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error {
            kind: ErrorKind::Io(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error {
            kind: ErrorKind::Archive(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error {
            kind: ErrorKind::Archive(format!("invalid base64 payload: {}", err)),
            source: Some(Box::new(err)),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error {
            kind: ErrorKind::Io(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error {
            kind: ErrorKind::Io(format!("background file task failed: {}", err)),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_displays_bare_message() {
        let err = Error::not_found("Duplicate Rule not found in the org");
        assert_eq!(err.to_string(), "Duplicate Rule not found in the org");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_deployment_failure_display() {
        let err = Error::new(ErrorKind::DeploymentFailure {
            message: "Invalid matching rule".to_string(),
            problems: vec![],
        });
        assert_eq!(
            err.to_string(),
            "Unable to deploy the deactivated rule: Invalid matching rule"
        );
    }

    #[test]
    fn test_metadata_error_maps_to_external_service() {
        let inner = duprule_sf_metadata::Error::new(duprule_sf_metadata::ErrorKind::SoapFault(
            "sf:INVALID_SESSION_ID - Session expired".to_string(),
        ));
        let err: Error = inner.into();

        assert!(matches!(err.kind, ErrorKind::ExternalService(_)));
        assert!(err.to_string().contains("INVALID_SESSION_ID"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::new(ErrorKind::Timeout {
            operation: "retrieval".to_string(),
            seconds: 60,
        });
        assert_eq!(err.to_string(), "Timed out after 60s waiting for retrieval");
    }

    #[tokio::test]
    async fn test_failed_background_task_maps_to_io() {
        let join = tokio::task::spawn_blocking(|| -> Result<()> { panic!("zip writer crashed") });
        let err: Error = join.await.unwrap_err().into();

        assert!(matches!(err.kind, ErrorKind::Io(_)));
        assert!(err.to_string().starts_with("IO error: background file task failed"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
