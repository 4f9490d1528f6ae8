//! # duprule
//!
//! Deactivate a Salesforce Duplicate Rule through the Metadata API.
//!
//! The workflow retrieves the rule as a single-package zip, flips its
//! `isActive` flag in the extracted XML, re-zips the scratch directory and
//! deploys it back, polling both asynchronous jobs until they finish.
//!
//! ## Crates
//!
//! - **duprule-sf-auth** - Credentials from the sf CLI, SFDX auth URLs or the environment
//! - **duprule-sf-metadata** - SOAP Metadata API client: retrieve, deploy, status checks
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use duprule::{ConsoleProgress, DeactivateConfig, Deactivator, RuleName};
//! use duprule::auth::SalesforceCredentials;
//! use duprule::metadata::MetadataClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let creds = SalesforceCredentials::resolve(Some("my-org")).await?;
//!     let client = MetadataClient::new(&creds)?;
//!
//!     let deactivator = Deactivator::new(client, ConsoleProgress::stdout(), DeactivateConfig::default());
//!     let outcome = deactivator
//!         .deactivate(&RuleName::new("Account.CRM_Account_Rule_1")?)
//!         .await?;
//!
//!     println!("{}", serde_json::to_string(&outcome.status())?);
//!     Ok(())
//! }
//! ```

pub use duprule_sf_auth as auth;
pub use duprule_sf_metadata as metadata;

mod archive;
mod config;
mod deactivate;
mod error;
mod poll;
mod progress;
mod rule;
mod service;
mod workspace;
mod xml;

pub use archive::{build_package, extract_archive};
pub use config::DeactivateConfig;
pub use deactivate::{DeactivateOutcome, Deactivator, StatusPayload};
pub use error::{Error, ErrorKind, Result};
pub use poll::{PollState, Poller};
pub use progress::{ConsoleProgress, Progress, ProgressSink, RecordingProgress};
pub use rule::{RuleDocument, RuleName, DUPLICATE_RULE_TYPE};
pub use service::MetadataService;
pub use workspace::ScratchWorkspace;
pub use xml::{Element, Node, XmlDocument};
