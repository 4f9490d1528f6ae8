use reqwest::header::{ACCEPT, AUTHORIZATION};
use tracing::{debug, instrument};

use crate::error::{Error, ErrorKind, Result};
use crate::types::ApiVersionInfo;

impl super::MetadataClient {
    /// List the API versions the org supports (`GET /services/data`).
    #[instrument(skip(self))]
    pub async fn api_versions(&self) -> Result<Vec<ApiVersionInfo>> {
        let response = self
            .http_client
            .get(format!("{}/services/data", self.instance_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.access_token))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::new(ErrorKind::Http(format!(
                "API version listing returned HTTP {}",
                status
            ))));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// The highest API version the org supports, e.g. `"62.0"`.
    pub async fn retrieve_max_api_version(&self) -> Result<String> {
        let versions = self.api_versions().await?;

        let max = versions
            .into_iter()
            .filter_map(|info| info.sort_key().map(|key| (key, info)))
            .max_by_key(|(key, _)| *key)
            .map(|(_, info)| info.version)
            .ok_or_else(|| {
                Error::new(ErrorKind::InvalidResponse(
                    "org reported no API versions".to_string(),
                ))
            })?;

        debug!(version = %max, "max API version");
        Ok(max)
    }
}
