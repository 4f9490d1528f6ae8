//! # duprule-sf-auth
//!
//! Resolves an authenticated Salesforce session for the `duprule` command.
//!
//! ## Security
//!
//! - Sensitive data (tokens, secrets) are redacted in Debug output
//! - Tracing/logging skips credential parameters
//! - Error messages sanitize any credential data
//!
//! ## Credential sources
//!
//! - **sf CLI** - `sf org display --json` for an alias, username, or the default org
//! - **SFDX auth URL** - `force://...` exchanged through the refresh token grant
//! - **Environment** - `SF_INSTANCE_URL` / `SF_ACCESS_TOKEN`
//!
//! ## Example
//!
//! ```rust,ignore
//! use duprule_sf_auth::{Credentials, SalesforceCredentials};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), duprule_sf_auth::Error> {
//!     let creds = SalesforceCredentials::resolve(Some("my-sandbox")).await?;
//!     println!("Connected to {}", creds.instance_url());
//!     Ok(())
//! }
//! ```

mod credentials;
mod error;
mod oauth;

pub use credentials::{AuthUrl, Credentials, SalesforceCredentials};
pub use error::{Error, ErrorKind, Result};
pub use oauth::{OAuthClient, OAuthConfig, TokenResponse};

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";

/// API version assumed until the org reports its own maximum.
pub const DEFAULT_API_VERSION: &str = "62.0";
