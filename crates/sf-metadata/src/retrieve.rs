//! Retrieve operations.

use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

use crate::types::AsyncJob;

/// A `retrieveRequest` for unpackaged metadata.
#[derive(Debug, Clone)]
pub struct RetrieveRequest {
    /// Overrides the client's API version for this request.
    pub api_version: Option<String>,
    /// Return the package without an enclosing `unpackaged/` folder.
    pub single_package: bool,
    pub unpackaged: PackageManifest,
}

impl RetrieveRequest {
    /// A single-package retrieve of the given manifest.
    pub fn single_package(unpackaged: PackageManifest) -> Self {
        Self {
            api_version: None,
            single_package: true,
            unpackaged,
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }
}

/// Package manifest (package.xml).
///
/// Use this structured type to safely build package manifests without
/// risk of XML injection. All values are properly escaped when converted
/// to XML.
#[derive(Debug, Clone, Default)]
pub struct PackageManifest {
    pub types: Vec<PackageTypeMembers>,
    pub version: String,
}

impl PackageManifest {
    /// Create a new package manifest with the given API version.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            types: Vec::new(),
            version: version.into(),
        }
    }

    /// Add a metadata type with its members.
    pub fn add_type(mut self, name: impl Into<String>, members: Vec<String>) -> Self {
        self.types.push(PackageTypeMembers {
            name: name.into(),
            members,
        });
        self
    }

    /// Convert to XML elements for SOAP envelope.
    pub(crate) fn to_xml(&self) -> String {
        let mut xml_parts = Vec::new();

        for type_member in &self.types {
            let members_xml: String = type_member
                .members
                .iter()
                .map(|m| format!("<members>{}</members>", escape(m.as_str())))
                .collect::<Vec<_>>()
                .join("\n          ");

            xml_parts.push(format!(
                "<types>\n          {}\n          <name>{}</name>\n        </types>",
                members_xml,
                escape(type_member.name.as_str())
            ));
        }

        xml_parts.push(format!(
            "<version>{}</version>",
            escape(self.version.as_str())
        ));

        xml_parts.join("\n        ")
    }
}

/// Type members in a package manifest.
#[derive(Debug, Clone)]
pub struct PackageTypeMembers {
    pub name: String,
    pub members: Vec<String>,
}

/// Retrieve status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetrieveStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

impl std::str::FromStr for RetrieveStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RetrieveStatus::Pending),
            "InProgress" => Ok(RetrieveStatus::InProgress),
            "Succeeded" => Ok(RetrieveStatus::Succeeded),
            "Failed" => Ok(RetrieveStatus::Failed),
            _ => Err(format!("Unknown retrieve status: {}", s)),
        }
    }
}

/// Result of `checkRetrieveStatus`.
#[derive(Debug, Clone)]
pub struct RetrieveResult {
    /// Async process ID.
    pub id: String,
    /// Whether the operation is complete.
    pub done: bool,
    pub status: RetrieveStatus,
    pub success: bool,
    pub error_message: Option<String>,
    /// Base64-encoded zip file contents.
    pub zip_file: Option<String>,
    /// Retrieve messages (warnings/errors).
    pub messages: Vec<RetrieveMessage>,
}

impl RetrieveResult {
    /// The archive payload, if the job returned a non-empty one.
    pub fn archive(&self) -> Option<&str> {
        self.zip_file
            .as_deref()
            .map(str::trim)
            .filter(|zip| !zip.is_empty())
    }
}

impl AsyncJob for RetrieveResult {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

/// A message from retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveMessage {
    pub file_name: String,
    pub problem: String,
}
