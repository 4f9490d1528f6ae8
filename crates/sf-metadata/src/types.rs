//! Common types for Metadata API.

use serde::{Deserialize, Serialize};

/// Default Metadata API version.
pub const DEFAULT_API_VERSION: &str = duprule_sf_auth::DEFAULT_API_VERSION;

/// An asynchronous Metadata API job as seen through its status check.
///
/// The service owns the job lifecycle; callers only observe the id and
/// whether it has finished.
pub trait AsyncJob {
    /// Async process ID.
    fn id(&self) -> &str;

    /// Whether the service reports the job as finished.
    fn is_done(&self) -> bool;
}

/// SOAP Fault from the Metadata API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoapFault {
    pub fault_code: String,
    pub fault_string: String,
}

impl std::fmt::Display for SoapFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.fault_code, self.fault_string)
    }
}

impl std::error::Error for SoapFault {}

/// One entry of `GET /services/data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiVersionInfo {
    pub label: String,
    pub url: String,
    pub version: String,
}

impl ApiVersionInfo {
    /// Numeric ordering key, `(major, minor)`. `None` for malformed versions.
    pub(crate) fn sort_key(&self) -> Option<(u32, u32)> {
        let (major, minor) = self.version.split_once('.').unwrap_or((&self.version, "0"));
        Some((major.trim().parse().ok()?, minor.trim().parse().ok()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soap_fault_display() {
        let fault = SoapFault {
            fault_code: "sf:INVALID_SESSION_ID".to_string(),
            fault_string: "Invalid Session ID".to_string(),
        };
        assert!(fault.to_string().contains("INVALID_SESSION_ID"));
    }

    #[test]
    fn test_api_version_sort_key() {
        let info = |v: &str| ApiVersionInfo {
            label: "Winter".to_string(),
            url: format!("/services/data/v{v}"),
            version: v.to_string(),
        };
        assert_eq!(info("62.0").sort_key(), Some((62, 0)));
        assert_eq!(info("9.0").sort_key(), Some((9, 0)));
        assert_eq!(info("64").sort_key(), Some((64, 0)));
        assert!(info("9.0").sort_key() < info("10.0").sort_key());
        assert_eq!(info("next").sort_key(), None);
    }
}
