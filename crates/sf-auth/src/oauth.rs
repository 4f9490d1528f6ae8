//! OAuth 2.0 refresh token exchange.
//!
//! `duprule` never runs an interactive login. A session either already
//! exists (sf CLI, environment) or is minted from the refresh token carried
//! in an SFDX auth URL.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{Error, ErrorKind, Result};

/// Connected app identity used for the refresh grant.
///
/// The consumer secret is redacted in Debug output.
#[derive(Clone)]
pub struct OAuthConfig {
    /// Consumer key (client_id).
    pub consumer_key: String,
    consumer_secret: Option<String>,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("consumer_key", &self.consumer_key)
            .field(
                "consumer_secret",
                &self.consumer_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl OAuthConfig {
    pub fn new(consumer_key: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: None,
        }
    }

    /// Set the consumer secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.consumer_secret = Some(secret.into());
        self
    }
}

/// OAuth client for the token endpoint.
#[derive(Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for OAuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OAuthClient {
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The refresh_token parameter is not logged to prevent credential exposure.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
        login_url: &str,
    ) -> Result<TokenResponse> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.consumer_key.as_str()),
        ];

        if let Some(secret) = &self.config.consumer_secret {
            params.push(("client_secret", secret.as_str()));
        }

        let body = serde_urlencoded::to_string(params)?;

        let response = self
            .http_client
            .post(format!(
                "{}/services/oauth2/token",
                login_url.trim_end_matches('/')
            ))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response
                .json::<OAuthErrorResponse>()
                .await
                .unwrap_or_else(|_| OAuthErrorResponse {
                    error: status.to_string(),
                    error_description: "token endpoint returned a non-JSON error".to_string(),
                });
            return Err(Error::new(ErrorKind::OAuth {
                error: error.error,
                description: error.error_description,
            }));
        }

        Ok(response.json::<TokenResponse>().await?)
    }
}

/// Token endpoint response.
///
/// The access token is redacted in Debug output.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub instance_url: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub issued_at: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_config_debug_redacts_secret() {
        let config = OAuthConfig::new("consumer").with_secret("very_secret_value");
        let debug = format!("{:?}", config);
        assert!(debug.contains("consumer"));
        assert!(!debug.contains("very_secret_value"));
    }

    #[tokio::test]
    async fn test_refresh_token_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("client_secret=s3cret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh_token",
                "instance_url": "https://na1.salesforce.com",
                "token_type": "Bearer"
            })))
            .mount(&mock_server)
            .await;

        let client = OAuthClient::new(OAuthConfig::new("client").with_secret("s3cret"));
        let token = client
            .refresh_token("refresh", &mock_server.uri())
            .await
            .expect("refresh should succeed");

        assert_eq!(token.access_token, "fresh_token");
        assert_eq!(token.instance_url, "https://na1.salesforce.com");
        assert!(!format!("{:?}", token).contains("fresh_token"));
    }

    #[tokio::test]
    async fn test_refresh_token_oauth_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/services/oauth2/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "expired access/refresh token"
            })))
            .mount(&mock_server)
            .await;

        let client = OAuthClient::new(OAuthConfig::new("client"));
        let err = client
            .refresh_token("refresh", &mock_server.uri())
            .await
            .unwrap_err();

        assert!(
            matches!(&err.kind, ErrorKind::OAuth { error, .. } if error == "invalid_grant"),
            "unexpected error: {err}"
        );
    }
}
