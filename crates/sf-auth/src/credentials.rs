//! Credentials trait and the sources `duprule` can load a session from.
//!
//! All credential types implement custom Debug to redact sensitive data.

use tracing::{debug, instrument};

use crate::error::{Error, ErrorKind, Result};
use crate::oauth::{OAuthClient, OAuthConfig};
use crate::{DEFAULT_API_VERSION, PRODUCTION_LOGIN_URL, SANDBOX_LOGIN_URL};

/// Trait for Salesforce credentials.
pub trait Credentials: Send + Sync {
    /// Get the Salesforce instance URL.
    fn instance_url(&self) -> &str;

    /// Get the access token.
    fn access_token(&self) -> &str;

    /// Get the API version (e.g., "62.0").
    fn api_version(&self) -> &str;

    /// Returns true if the credentials appear to be valid (non-empty).
    fn is_valid(&self) -> bool {
        !self.instance_url().is_empty() && !self.access_token().is_empty()
    }
}

/// An authenticated org session.
///
/// Sensitive fields (access_token, refresh_token) are redacted in Debug output
/// to prevent accidental exposure in logs.
#[derive(Clone)]
pub struct SalesforceCredentials {
    instance_url: String,
    access_token: String,
    api_version: String,
    refresh_token: Option<String>,
}

impl std::fmt::Debug for SalesforceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceCredentials")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl SalesforceCredentials {
    /// Create new credentials with the given values.
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            instance_url: instance_url.into(),
            access_token: access_token.into(),
            api_version: api_version.into(),
            refresh_token: None,
        }
    }

    /// Attach the refresh token the session was minted from.
    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Get the refresh token if available.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Change the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Resolve a session the way the `duprule` command does.
    ///
    /// 1. `target_org` (alias or username) through the sf CLI
    /// 2. `SF_AUTH_URL`
    /// 3. `SF_INSTANCE_URL` + `SF_ACCESS_TOKEN`
    /// 4. the sf CLI default org
    #[instrument]
    pub async fn resolve(target_org: Option<&str>) -> Result<Self> {
        if let Some(org) = target_org {
            return Self::from_sf_cli(Some(org)).await;
        }

        if let Ok(auth_url) = std::env::var("SF_AUTH_URL") {
            if !auth_url.trim().is_empty() {
                debug!("using SF_AUTH_URL");
                return Self::from_sfdx_auth_url(auth_url.trim()).await;
            }
        }

        match Self::from_env() {
            Ok(creds) => {
                debug!("using SF_INSTANCE_URL/SF_ACCESS_TOKEN");
                Ok(creds)
            }
            Err(err) if matches!(err.kind, ErrorKind::EnvVar(_)) => {
                debug!("falling back to the sf CLI default org");
                Self::from_sf_cli(None).await
            }
            Err(err) => Err(err),
        }
    }

    /// Load credentials from environment variables.
    ///
    /// Required environment variables:
    /// - `SF_INSTANCE_URL` or `SALESFORCE_INSTANCE_URL`
    /// - `SF_ACCESS_TOKEN` or `SALESFORCE_ACCESS_TOKEN`
    ///
    /// Optional:
    /// - `SF_API_VERSION` or `SALESFORCE_API_VERSION` (default: "62.0")
    pub fn from_env() -> Result<Self> {
        let instance_url = std::env::var("SF_INSTANCE_URL")
            .or_else(|_| std::env::var("SALESFORCE_INSTANCE_URL"))
            .map_err(|_| Error::new(ErrorKind::EnvVar("SF_INSTANCE_URL".to_string())))?;

        let access_token = std::env::var("SF_ACCESS_TOKEN")
            .or_else(|_| std::env::var("SALESFORCE_ACCESS_TOKEN"))
            .map_err(|_| Error::new(ErrorKind::EnvVar("SF_ACCESS_TOKEN".to_string())))?;

        let api_version = std::env::var("SF_API_VERSION")
            .or_else(|_| std::env::var("SALESFORCE_API_VERSION"))
            .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());

        Ok(Self::new(instance_url, access_token, api_version))
    }

    /// Load credentials from the sf CLI.
    ///
    /// With `None` the CLI's default target org is used. Requires `sf` on
    /// the PATH and the org to be authenticated.
    pub async fn from_sf_cli(target_org: Option<&str>) -> Result<Self> {
        use tokio::process::Command;

        let mut command = Command::new("sf");
        command.args(["org", "display", "--json"]);
        if let Some(org) = target_org {
            command.args(["--target-org", org]);
        }

        let output = command
            .output()
            .await
            .map_err(|e| Error::new(ErrorKind::SfdxCli(format!("Failed to run sf CLI: {}", e))))?;

        if !output.status.success() {
            // `sf --json` reports failures on stdout
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = serde_json::from_slice::<serde_json::Value>(&output.stdout)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| stderr.trim().to_string());
            return Err(Error::new(ErrorKind::SfdxCli(format!(
                "sf org display failed: {}",
                message
            ))));
        }

        Self::from_org_display_json(&output.stdout)
    }

    /// Parse the output of `sf org display --json`.
    pub fn from_org_display_json(stdout: &[u8]) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_slice(stdout)?;

        let result = json.get("result").ok_or_else(|| {
            Error::new(ErrorKind::SfdxCli("Missing 'result' in output".to_string()))
        })?;

        let instance_url = result
            .get("instanceUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::new(ErrorKind::SfdxCli("Missing instanceUrl".to_string())))?;

        let access_token = result
            .get("accessToken")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::new(ErrorKind::SfdxCli("Missing accessToken".to_string())))?;

        let api_version = result
            .get("apiVersion")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_API_VERSION);

        Ok(Self::new(instance_url, access_token, api_version))
    }

    /// Load credentials from an SFDX auth URL.
    ///
    /// The refresh token in the URL is exchanged for an access token.
    ///
    /// # Example
    /// ```no_run
    /// # use duprule_sf_auth::SalesforceCredentials;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let auth_url = std::env::var("SF_AUTH_URL")?;
    /// let creds = SalesforceCredentials::from_sfdx_auth_url(&auth_url).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn from_sfdx_auth_url(auth_url: &str) -> Result<Self> {
        let parsed = AuthUrl::parse(auth_url)?;

        let mut config = OAuthConfig::new(&parsed.client_id);
        if let Some(secret) = &parsed.client_secret {
            config = config.with_secret(secret);
        }
        let oauth_client = OAuthClient::new(config);

        let token_response = oauth_client
            .refresh_token(&parsed.refresh_token, parsed.token_endpoint())
            .await
            .map_err(|e| {
                if matches!(&e.kind, ErrorKind::OAuth { error, .. } if error == "invalid_grant") {
                    Error::new(ErrorKind::OAuth {
                        error: "invalid_grant".to_string(),
                        description: format!(
                            "Refresh token expired or invalid. Generate a fresh SF_AUTH_URL using: \
                            `sf org display --verbose --json | jq -r '.result.sfdxAuthUrl'`. \
                            Original error: {}",
                            e
                        ),
                    })
                } else {
                    e
                }
            })?;

        Ok(Self::new(
            token_response.instance_url,
            token_response.access_token,
            DEFAULT_API_VERSION,
        )
        .with_refresh_token(parsed.refresh_token))
    }
}

impl Credentials for SalesforceCredentials {
    fn instance_url(&self) -> &str {
        &self.instance_url
    }

    fn access_token(&self) -> &str {
        &self.access_token
    }

    fn api_version(&self) -> &str {
        &self.api_version
    }
}

/// A parsed SFDX auth URL.
///
/// Formats:
/// - `force://<client_id>:<client_secret>:<refresh_token>@<instance_url>`
/// - `force://<client_id>::<refresh_token>@<instance_url>` (empty client_secret)
/// - `force://<client_id>:<client_secret>:<refresh_token>:<username>@<instance_url>`
#[derive(Clone, PartialEq, Eq)]
pub struct AuthUrl {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub refresh_token: String,
    pub username: Option<String>,
    pub instance_url: String,
}

impl std::fmt::Debug for AuthUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthUrl")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("refresh_token", &"[REDACTED]")
            .field("username", &self.username)
            .field("instance_url", &self.instance_url)
            .finish()
    }
}

impl AuthUrl {
    pub fn parse(auth_url: &str) -> Result<Self> {
        let url = auth_url.strip_prefix("force://").ok_or_else(|| {
            Error::new(ErrorKind::InvalidInput(
                "Auth URL must start with force://".to_string(),
            ))
        })?;

        // The username cannot contain '@': the first '@' separates the instance
        let (credentials_part, instance_url) = url.split_once('@').ok_or_else(|| {
            Error::new(ErrorKind::InvalidInput(
                "Invalid auth URL format: missing @".to_string(),
            ))
        })?;

        let cred_parts: Vec<&str> = credentials_part.splitn(4, ':').collect();
        if cred_parts.len() < 3 || cred_parts[2].is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "Invalid auth URL format: expected client_id:client_secret:refresh_token[:username]"
                    .to_string(),
            )));
        }

        Ok(Self {
            client_id: cred_parts[0].to_string(),
            client_secret: Some(cred_parts[1])
                .filter(|s| !s.is_empty())
                .map(String::from),
            refresh_token: cred_parts[2].to_string(),
            username: cred_parts
                .get(3)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string()),
            instance_url: instance_url.to_string(),
        })
    }

    /// Token endpoint host for the refresh grant.
    ///
    /// Local test servers are used directly; sandbox and scratch orgs go
    /// through test.salesforce.com.
    pub fn token_endpoint(&self) -> &str {
        let instance = self.instance_url.as_str();
        if instance.contains("localhost") || instance.contains("127.0.0.1") {
            instance
        } else if instance.contains("test.salesforce.com")
            || instance.contains("sandbox")
            || instance.contains(".scratch.")
        {
            SANDBOX_LOGIN_URL
        } else {
            PRODUCTION_LOGIN_URL
        }
    }
}
