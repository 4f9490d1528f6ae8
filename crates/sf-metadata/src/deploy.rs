//! Deploy operations.

use serde::{Deserialize, Serialize};

use crate::types::AsyncJob;

/// Options for deployment.
///
/// `Default` matches the Metadata API defaults: every flag off.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Allow references to missing files in the zip.
    pub allow_missing_files: bool,
    /// Validate only, don't actually deploy.
    pub check_only: bool,
    /// Ignore warnings during deployment.
    pub ignore_warnings: bool,
    /// Rollback all changes if any component fails.
    pub rollback_on_error: bool,
    /// The zip has no enclosing package folder.
    pub single_package: bool,
}

/// Deployment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeployStatus {
    Pending,
    InProgress,
    Succeeded,
    SucceededPartial,
    Failed,
    Canceling,
    Canceled,
}

impl std::str::FromStr for DeployStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(DeployStatus::Pending),
            "InProgress" => Ok(DeployStatus::InProgress),
            "Succeeded" => Ok(DeployStatus::Succeeded),
            "SucceededPartial" => Ok(DeployStatus::SucceededPartial),
            "Failed" => Ok(DeployStatus::Failed),
            "Canceling" => Ok(DeployStatus::Canceling),
            "Canceled" => Ok(DeployStatus::Canceled),
            _ => Err(format!("Unknown deploy status: {}", s)),
        }
    }
}

/// Result of `checkDeployStatus`.
#[derive(Debug, Clone)]
pub struct DeployResult {
    /// Async process ID.
    pub id: String,
    /// Whether the operation is complete.
    pub done: bool,
    pub status: DeployStatus,
    /// Whether the deployment succeeded. Only meaningful once `done`.
    pub success: bool,
    pub error_message: Option<String>,
    pub number_components_deployed: u32,
    pub number_components_errors: u32,
    pub number_components_total: u32,
    pub component_failures: Vec<ComponentFailure>,
    pub state_detail: Option<String>,
}

impl AsyncJob for DeployResult {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

/// A component failure in deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentFailure {
    pub component_type: Option<String>,
    pub file_name: Option<String>,
    pub full_name: Option<String>,
    pub line_number: Option<u32>,
    pub column_number: Option<u32>,
    pub problem: String,
    pub problem_type: String,
}

impl std::fmt::Display for ComponentFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.component_type, &self.full_name) {
            (Some(kind), Some(name)) => write!(f, "{} {}: {}", kind, name, self.problem),
            (None, Some(name)) => write!(f, "{}: {}", name, self.problem),
            _ => f.write_str(&self.problem),
        }
    }
}
