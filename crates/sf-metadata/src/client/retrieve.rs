use quick_xml::escape::escape;
use tracing::instrument;

use crate::error::{Error, ErrorKind, Result};
use crate::retrieve::{RetrieveRequest, RetrieveResult};

impl super::MetadataClient {
    /// Start a retrieve operation for unpackaged metadata.
    ///
    /// All manifest values are XML-escaped. Returns the async process ID.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use duprule_sf_metadata::{PackageManifest, RetrieveRequest};
    ///
    /// let manifest = PackageManifest::new("62.0")
    ///     .add_type("DuplicateRule", vec!["Account.CRM_Account_Rule_1".to_string()]);
    ///
    /// let async_id = client.retrieve(&RetrieveRequest::single_package(manifest)).await?;
    /// ```
    #[instrument(skip(self, request), fields(api_version = %self.api_version))]
    pub async fn retrieve(&self, request: &RetrieveRequest) -> Result<String> {
        let body = format!(
            r#"<retrieve xmlns="http://soap.sforce.com/2006/04/metadata">
      <retrieveRequest>
        <apiVersion>{api_version}</apiVersion>
        <singlePackage>{single_package}</singlePackage>
        <unpackaged>
        {package_xml}
        </unpackaged>
      </retrieveRequest>
    </retrieve>"#,
            api_version = escape(request.api_version.as_deref().unwrap_or(&self.api_version)),
            single_package = request.single_package,
            package_xml = request.unpackaged.to_xml(),
        );

        let response_text = self.call("retrieve", &body).await?;

        self.extract_element(&response_text, "id").ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse(
                "No async process ID in retrieve response".to_string(),
            ))
        })
    }

    /// Check the status of a retrieve operation.
    #[instrument(skip(self))]
    pub async fn check_retrieve_status(
        &self,
        async_process_id: &str,
        include_zip: bool,
    ) -> Result<RetrieveResult> {
        let body = format!(
            r#"<checkRetrieveStatus xmlns="http://soap.sforce.com/2006/04/metadata">
      <asyncProcessId>{process_id}</asyncProcessId>
      <includeZip>{include_zip}</includeZip>
    </checkRetrieveStatus>"#,
            process_id = escape(async_process_id),
            include_zip = include_zip,
        );

        let response_text = self.call("checkRetrieveStatus", &body).await?;
        self.parse_retrieve_result(&response_text)
    }
}
