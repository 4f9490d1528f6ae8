use base64::{engine::general_purpose, Engine as _};
use quick_xml::escape::escape;
use tracing::instrument;

use crate::deploy::{DeployOptions, DeployResult};
use crate::error::{Error, ErrorKind, Result};

impl super::MetadataClient {
    /// Deploy a metadata package.
    ///
    /// The `package_zip` must be a properly structured zip file with metadata
    /// in the correct directory structure (e.g., `duplicateRules/Account.Rule.duplicateRule`).
    ///
    /// Returns the async process ID for tracking the deployment.
    #[instrument(skip(self, package_zip), fields(zip_bytes = package_zip.len()))]
    pub async fn deploy(&self, package_zip: &[u8], options: &DeployOptions) -> Result<String> {
        let encoded_zip = general_purpose::STANDARD.encode(package_zip);

        let body = format!(
            r#"<deploy xmlns="http://soap.sforce.com/2006/04/metadata">
      <ZipFile>{zip_file}</ZipFile>
      <DeployOptions>
        <allowMissingFiles>{allow_missing}</allowMissingFiles>
        <checkOnly>{check_only}</checkOnly>
        <ignoreWarnings>{ignore_warnings}</ignoreWarnings>
        <rollbackOnError>{rollback_on_error}</rollbackOnError>
        <singlePackage>{single_package}</singlePackage>
      </DeployOptions>
    </deploy>"#,
            zip_file = encoded_zip,
            allow_missing = options.allow_missing_files,
            check_only = options.check_only,
            ignore_warnings = options.ignore_warnings,
            rollback_on_error = options.rollback_on_error,
            single_package = options.single_package,
        );

        let response_text = self.call("deploy", &body).await?;

        self.extract_element(&response_text, "id").ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse(
                "No async process ID in deploy response".to_string(),
            ))
        })
    }

    /// Check the status of a deploy operation.
    #[instrument(skip(self))]
    pub async fn check_deploy_status(
        &self,
        async_process_id: &str,
        include_details: bool,
    ) -> Result<DeployResult> {
        let body = format!(
            r#"<checkDeployStatus xmlns="http://soap.sforce.com/2006/04/metadata">
      <asyncProcessId>{process_id}</asyncProcessId>
      <includeDetails>{include_details}</includeDetails>
    </checkDeployStatus>"#,
            process_id = escape(async_process_id),
            include_details = include_details,
        );

        let response_text = self.call("checkDeployStatus", &body).await?;
        self.parse_deploy_result(&response_text)
    }
}

#[cfg(test)]
mod tests {
    use super::super::MetadataClient;
    use crate::deploy::{DeployOptions, DeployStatus};
    use wiremock::matchers::{body_string_contains, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_deploy_encodes_zip_and_options() {
        let mock_server = MockServer::start().await;

        // base64 of "PK\x03\x04"
        Mock::given(method("POST"))
            .and(header("soapaction", "deploy"))
            .and(body_string_contains("<ZipFile>UEsDBA==</ZipFile>"))
            .and(body_string_contains("<rollbackOnError>true</rollbackOnError>"))
            .and(body_string_contains("<singlePackage>true</singlePackage>"))
            .and(body_string_contains("<checkOnly>false</checkOnly>"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<soapenv:Envelope><soapenv:Body><deployResponse><result><done>false</done><id>0Af4Y000003OdTWSA0</id><state>Queued</state></result></deployResponse></soapenv:Body></soapenv:Envelope>",
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = MetadataClient::from_parts(mock_server.uri(), "token");
        let options = DeployOptions {
            rollback_on_error: true,
            single_package: true,
            ..Default::default()
        };

        let id = client.deploy(b"PK\x03\x04", &options).await.unwrap();
        assert_eq!(id, "0Af4Y000003OdTWSA0");
    }

    #[tokio::test]
    async fn test_check_deploy_status_reads_top_level_flags() {
        let mock_server = MockServer::start().await;

        // The nested componentSuccesses block reports success before the
        // deploy's own flag; only the top-level one counts.
        Mock::given(method("POST"))
            .and(header("soapaction", "checkDeployStatus"))
            .and(body_string_contains("<includeDetails>true</includeDetails>"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<soapenv:Envelope><soapenv:Body><checkDeployStatusResponse><result>\
                 <checkOnly>false</checkOnly>\
                 <details><componentSuccesses><fullName>package.xml</fullName><id>0Af1</id><success>true</success></componentSuccesses>\
                 <componentFailures><componentType>DuplicateRule</componentType><fullName>Account.R</fullName><problem>Invalid matching rule</problem><problemType>Error</problemType><success>false</success></componentFailures></details>\
                 <done>true</done><id>0Af2</id><numberComponentErrors>1</numberComponentErrors><numberComponentsDeployed>0</numberComponentsDeployed><numberComponentsTotal>1</numberComponentsTotal>\
                 <status>Failed</status><success>false</success></result></checkDeployStatusResponse></soapenv:Body></soapenv:Envelope>",
            ))
            .mount(&mock_server)
            .await;

        let client = MetadataClient::from_parts(mock_server.uri(), "token");
        let result = client.check_deploy_status("0Af2", true).await.unwrap();

        assert_eq!(result.id, "0Af2");
        assert!(result.done);
        assert!(!result.success);
        assert_eq!(result.status, DeployStatus::Failed);
        assert_eq!(result.number_components_errors, 1);
        assert_eq!(result.component_failures.len(), 1);
        assert_eq!(result.component_failures[0].problem, "Invalid matching rule");
    }
}
