//! Metadata API client.

use duprule_sf_auth::Credentials;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::error::{Error, ErrorKind, Result};
use crate::types::DEFAULT_API_VERSION;

mod deploy;
mod retrieve;
mod versions;
mod xml_helpers;

/// SOAP Action header name.
static SOAP_ACTION_HEADER: HeaderName = HeaderName::from_static("soapaction");

/// Salesforce Metadata API client.
pub struct MetadataClient {
    instance_url: String,
    access_token: String,
    api_version: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for MetadataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataClient")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl MetadataClient {
    /// Create a new Metadata API client from credentials.
    pub fn new(credentials: &impl Credentials) -> Result<Self> {
        if !credentials.is_valid() {
            return Err(Error::new(ErrorKind::Auth(
                "credentials are missing an instance URL or access token".to_string(),
            )));
        }
        Ok(Self::from_parts(
            credentials.instance_url(),
            credentials.access_token(),
        )
        .with_api_version(credentials.api_version()))
    }

    /// Create a new Metadata API client from instance URL and access token.
    pub fn from_parts(instance_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        let instance_url: String = instance_url.into();
        Self {
            instance_url: instance_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// The API version requests are sent with.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Get the Metadata API SOAP endpoint URL.
    pub(crate) fn metadata_url(&self) -> String {
        format!("{}/services/Soap/m/{}", self.instance_url, self.api_version)
    }

    /// Build common headers for SOAP requests.
    pub(crate) fn build_headers(&self, soap_action: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/xml;charset=UTF-8"),
        );
        headers.insert(SOAP_ACTION_HEADER.clone(), header_value(soap_action)?);
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", self.access_token))?,
        );
        Ok(headers)
    }

    /// Wrap an operation body in a SOAP envelope carrying the session header.
    pub(crate) fn envelope(&self, body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <soap:Header>
    <SessionHeader xmlns="http://soap.sforce.com/2006/04/metadata">
      <sessionId>{session_id}</sessionId>
    </SessionHeader>
  </soap:Header>
  <soap:Body>
    {body}
  </soap:Body>
</soap:Envelope>"#,
            session_id = quick_xml::escape::escape(self.access_token.as_str()),
            body = body,
        )
    }

    /// POST a SOAP operation and return the response body.
    ///
    /// SOAP faults take precedence over the HTTP status, since the Metadata
    /// API reports them with a 500.
    pub(crate) async fn call(&self, soap_action: &str, body: &str) -> Result<String> {
        debug!(action = soap_action, url = %self.metadata_url(), "metadata SOAP call");

        let response = self
            .http_client
            .post(self.metadata_url())
            .headers(self.build_headers(soap_action)?)
            .body(self.envelope(body))
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if let Some(fault) = self.parse_soap_fault(&response_text) {
            return Err(Error::with_source(
                ErrorKind::SoapFault(fault.to_string()),
                fault,
            ));
        }

        if !status.is_success() {
            return Err(Error::new(ErrorKind::Http(format!(
                "{} returned HTTP {}",
                soap_action, status
            ))));
        }

        Ok(response_text)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| {
        Error::new(ErrorKind::Auth(
            "header value contains invalid characters".to_string(),
        ))
    })
}
