//! # duprule-sf-metadata
//!
//! Salesforce Metadata API client for the operations `duprule` needs.
//!
//! ## Features
//!
//! - **Retrieve** - Unpackaged retrieve of named components
//! - **Deploy** - Deploy a zipped package via SOAP
//! - **Status checks** - `checkRetrieveStatus` / `checkDeployStatus`
//! - **API versions** - Highest API version the org supports
//!
//! Polling is left to the caller; every status type implements [`AsyncJob`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use duprule_sf_metadata::{MetadataClient, PackageManifest, RetrieveRequest};
//! use duprule_sf_auth::SalesforceCredentials;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), duprule_sf_metadata::Error> {
//!     let creds = SalesforceCredentials::from_env()?;
//!     let client = MetadataClient::new(&creds)?;
//!     let version = client.retrieve_max_api_version().await?;
//!     let client = client.with_api_version(&version);
//!
//!     let manifest = PackageManifest::new(&version)
//!         .add_type("DuplicateRule", vec!["Account.Standard_Rule".to_string()]);
//!     let id = client.retrieve(&RetrieveRequest::single_package(manifest)).await?;
//!     let status = client.check_retrieve_status(&id, true).await?;
//!     println!("done: {}", status.done);
//!     Ok(())
//! }
//! ```

mod client;
mod deploy;
mod error;
mod retrieve;
mod types;

pub use client::MetadataClient;
pub use deploy::{ComponentFailure, DeployOptions, DeployResult, DeployStatus};
pub use error::{Error, ErrorKind, Result};
pub use retrieve::{
    PackageManifest, PackageTypeMembers, RetrieveMessage, RetrieveRequest, RetrieveResult,
    RetrieveStatus,
};
pub use types::{ApiVersionInfo, AsyncJob, SoapFault, DEFAULT_API_VERSION};
