use crate::deploy::{ComponentFailure, DeployResult, DeployStatus};
use crate::error::{Error, ErrorKind, Result};
use crate::retrieve::{RetrieveMessage, RetrieveResult, RetrieveStatus};
use crate::types::SoapFault;

/// Nested blocks whose fields shadow the top-level fields of a result.
const DEPLOY_NESTED: &[&str] = &["details"];
const RETRIEVE_NESTED: &[&str] = &["fileProperties", "messages"];

/// Parse a Metadata API boolean.
///
/// The two status endpoints have not always agreed on how `done` is encoded,
/// so both go through here: `true`/`false` in any case, or `1`/`0`.
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("true") || value == "1" {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") || value == "0" {
        Some(false)
    } else {
        None
    }
}

/// Remove every `<tag>...</tag>` block for the given tags.
pub(crate) fn strip_blocks(xml: &str, tags: &[&str]) -> String {
    let mut out = xml.to_string();
    for tag in tags {
        let start_tag = format!("<{}>", tag);
        let end_tag = format!("</{}>", tag);
        while let Some(start) = out.find(&start_tag) {
            match out[start..].find(&end_tag) {
                Some(end) => out.replace_range(start..start + end + end_tag.len(), ""),
                None => break,
            }
        }
    }
    out
}

impl super::MetadataClient {
    /// Parse a SOAP fault from the response.
    pub(crate) fn parse_soap_fault(&self, xml: &str) -> Option<SoapFault> {
        if !xml.contains("faultcode") {
            return None;
        }

        let fault_code = self.extract_element(xml, "faultcode")?;
        let fault_string = self
            .extract_element(xml, "faultstring")
            .unwrap_or_else(|| "Unknown error".to_string());

        Some(SoapFault {
            fault_code,
            fault_string,
        })
    }

    /// Extract a simple element value from XML.
    pub(crate) fn extract_element(&self, xml: &str, tag: &str) -> Option<String> {
        let end_tag = format!("</{}>", tag);

        let start_patterns = [
            format!("<{}>", tag),
            format!("<sf:{}>", tag),
            format!("<met:{}>", tag),
            format!("<tns:{}>", tag),
        ];

        for start in &start_patterns {
            if let Some(start_idx) = xml.find(start.as_str()) {
                let content_start = start_idx + start.len();
                let search_from = &xml[content_start..];
                let prefixed_end = start.replacen('<', "</", 1);
                if let Some(end_idx) = search_from
                    .find(&end_tag)
                    .or_else(|| search_from.find(&prefixed_end))
                {
                    return Some(unescape_text(&search_from[..end_idx]));
                }
            }
        }
        None
    }

    /// Read a boolean element. Missing elements are `None`; unrecognized
    /// values are an error rather than a silent `false`.
    pub(crate) fn extract_flag(&self, xml: &str, tag: &str) -> Result<Option<bool>> {
        match self.extract_element(xml, tag) {
            None => Ok(None),
            Some(raw) => parse_flag(&raw).map(Some).ok_or_else(|| {
                Error::new(ErrorKind::InvalidResponse(format!(
                    "Unrecognized <{}> value: {:?}",
                    tag, raw
                )))
            }),
        }
    }

    /// Parse deploy result from XML.
    pub(crate) fn parse_deploy_result(&self, xml: &str) -> Result<DeployResult> {
        let top = strip_blocks(xml, DEPLOY_NESTED);

        let id = self
            .extract_element(&top, "id")
            .ok_or_else(|| Error::new(ErrorKind::InvalidResponse("Missing id".to_string())))?;

        let done = self.extract_flag(&top, "done")?.unwrap_or(false);
        let success = self.extract_flag(&top, "success")?.unwrap_or(false);

        let status = self
            .extract_element(&top, "status")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DeployStatus::Pending);

        let count = |tag: &str| -> u32 {
            self.extract_element(&top, tag)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(0)
        };

        Ok(DeployResult {
            id,
            done,
            status,
            success,
            error_message: self.extract_element(&top, "errorMessage"),
            number_components_deployed: count("numberComponentsDeployed"),
            number_components_errors: count("numberComponentErrors"),
            number_components_total: count("numberComponentsTotal"),
            component_failures: self.parse_component_failures(xml),
            state_detail: self.extract_element(&top, "stateDetail"),
        })
    }

    /// Parse component failures from XML.
    pub(crate) fn parse_component_failures(&self, xml: &str) -> Vec<ComponentFailure> {
        self.blocks(xml, "componentFailures")
            .into_iter()
            .map(|block| ComponentFailure {
                component_type: self.extract_element(block, "componentType"),
                file_name: self.extract_element(block, "fileName"),
                full_name: self.extract_element(block, "fullName"),
                line_number: self
                    .extract_element(block, "lineNumber")
                    .and_then(|s| s.parse().ok()),
                column_number: self
                    .extract_element(block, "columnNumber")
                    .and_then(|s| s.parse().ok()),
                problem: self
                    .extract_element(block, "problem")
                    .unwrap_or_else(|| "Unknown problem".to_string()),
                problem_type: self
                    .extract_element(block, "problemType")
                    .unwrap_or_else(|| "Error".to_string()),
            })
            .collect()
    }

    /// Parse retrieve result from XML.
    pub(crate) fn parse_retrieve_result(&self, xml: &str) -> Result<RetrieveResult> {
        let top = strip_blocks(xml, RETRIEVE_NESTED);

        let id = self
            .extract_element(&top, "id")
            .ok_or_else(|| Error::new(ErrorKind::InvalidResponse("Missing id".to_string())))?;

        let done = self.extract_flag(&top, "done")?.unwrap_or(false);
        let success = self.extract_flag(&top, "success")?.unwrap_or(false);

        let status = self
            .extract_element(&top, "status")
            .and_then(|s| s.parse().ok())
            .unwrap_or(RetrieveStatus::Pending);

        Ok(RetrieveResult {
            id,
            done,
            status,
            success,
            error_message: self.extract_element(&top, "errorMessage"),
            zip_file: self.extract_element(&top, "zipFile"),
            messages: self.parse_retrieve_messages(xml),
        })
    }

    /// Parse retrieve messages from XML.
    pub(crate) fn parse_retrieve_messages(&self, xml: &str) -> Vec<RetrieveMessage> {
        self.blocks(xml, "messages")
            .into_iter()
            .filter_map(|block| {
                Some(RetrieveMessage {
                    file_name: self.extract_element(block, "fileName")?,
                    problem: self.extract_element(block, "problem")?,
                })
            })
            .collect()
    }

    /// Every `<tag>...</tag>` block, tags included.
    fn blocks<'a>(&self, xml: &'a str, tag: &str) -> Vec<&'a str> {
        let start_tag = format!("<{}>", tag);
        let end_tag = format!("</{}>", tag);
        let mut blocks = Vec::new();
        let mut search_from = xml;

        while let Some(start) = search_from.find(&start_tag) {
            let remaining = &search_from[start..];
            match remaining.find(&end_tag) {
                Some(end) => {
                    blocks.push(&remaining[..end + end_tag.len()]);
                    search_from = &remaining[end + end_tag.len()..];
                }
                None => break,
            }
        }

        blocks
    }
}

fn unescape_text(raw: &str) -> String {
    quick_xml::escape::unescape(raw)
        .map(|text| text.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::super::MetadataClient;
    use super::{parse_flag, strip_blocks};
    use crate::deploy::DeployStatus;
    use crate::error::ErrorKind;
    use crate::retrieve::RetrieveStatus;

    #[test]
    fn test_extract_element() {
        let client = MetadataClient::from_parts("url", "token");
        let xml = "<root><id>12345</id><done>true</done></root>";

        assert_eq!(client.extract_element(xml, "id"), Some("12345".to_string()));
        assert_eq!(
            client.extract_element(xml, "done"),
            Some("true".to_string())
        );
        assert_eq!(client.extract_element(xml, "missing"), None);
    }

    #[test]
    fn test_extract_element_with_namespaced_tags() {
        let client = MetadataClient::from_parts("url", "token");
        let xml = "<root><sf:id>12345</sf:id></root>";
        assert_eq!(client.extract_element(xml, "id"), Some("12345".to_string()));

        let xml = "<root><met:status>Succeeded</status></root>";
        assert_eq!(
            client.extract_element(xml, "status"),
            Some("Succeeded".to_string())
        );
    }

    #[test]
    fn test_extract_element_unescapes_entities() {
        let client = MetadataClient::from_parts("url", "token");
        let xml = "<errorMessage>Rule &apos;A &amp; B&apos; is &lt;invalid&gt;</errorMessage>";
        assert_eq!(
            client.extract_element(xml, "errorMessage"),
            Some("Rule 'A & B' is <invalid>".to_string())
        );
    }

    #[test]
    fn test_parse_flag_variants() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("False"), Some(false));
        assert_eq!(parse_flag(" true \n"), Some(true));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag(""), None);
        assert_eq!(parse_flag("yes"), None);
        assert_eq!(parse_flag("truthy"), None);
    }

    #[test]
    fn test_strip_blocks() {
        let xml = "<r><details><id>inner</id></details><id>outer</id><details><x/></details></r>";
        assert_eq!(strip_blocks(xml, &["details"]), "<r><id>outer</id></r>");
        assert_eq!(strip_blocks("<r><details>", &["details"]), "<r><details>");
    }

    #[test]
    fn test_parse_soap_fault() {
        let client = MetadataClient::from_parts("url", "token");

        let xml = r#"
        <soap:Envelope>
            <soap:Body>
                <soap:Fault>
                    <faultcode>sf:INVALID_SESSION_ID</faultcode>
                    <faultstring>Session expired or invalid</faultstring>
                </soap:Fault>
            </soap:Body>
        </soap:Envelope>"#;

        let fault = client.parse_soap_fault(xml).unwrap();
        assert_eq!(fault.fault_code, "sf:INVALID_SESSION_ID");
        assert_eq!(fault.fault_string, "Session expired or invalid");
    }

    #[test]
    fn test_parse_soap_fault_returns_none_for_success() {
        let client = MetadataClient::from_parts("url", "token");
        let xml =
            "<soap:Envelope><soap:Body><result><id>123</id></result></soap:Body></soap:Envelope>";
        assert!(client.parse_soap_fault(xml).is_none());
    }

    #[test]
    fn test_parse_deploy_result() {
        let client = MetadataClient::from_parts("url", "token");
        let xml = r#"
            <checkDeployStatusResponse>
                <result>
                    <id>0Af123</id>
                    <done>true</done>
                    <status>Succeeded</status>
                    <success>true</success>
                    <numberComponentsDeployed>1</numberComponentsDeployed>
                    <numberComponentErrors>0</numberComponentErrors>
                    <numberComponentsTotal>1</numberComponentsTotal>
                </result>
            </checkDeployStatusResponse>
        "#;

        let result = client.parse_deploy_result(xml).unwrap();
        assert_eq!(result.id, "0Af123");
        assert!(result.done);
        assert_eq!(result.status, DeployStatus::Succeeded);
        assert!(result.success);
        assert_eq!(result.number_components_deployed, 1);
    }

    #[test]
    fn test_parse_deploy_result_pending_without_success() {
        let client = MetadataClient::from_parts("url", "token");
        let xml = "<result><id>0Af123</id><done>false</done><status>InProgress</status><stateDetail>Processing Type: DuplicateRule</stateDetail></result>";

        let result = client.parse_deploy_result(xml).unwrap();
        assert!(!result.done);
        assert!(!result.success);
        assert_eq!(result.status, DeployStatus::InProgress);
        assert_eq!(
            result.state_detail.as_deref(),
            Some("Processing Type: DuplicateRule")
        );
    }

    #[test]
    fn test_parse_deploy_result_rejects_garbage_done() {
        let client = MetadataClient::from_parts("url", "token");
        let xml = "<result><id>0Af123</id><done>maybe</done></result>";

        let err = client.parse_deploy_result(xml).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidResponse(_)));
        assert!(err.to_string().contains("done"));
    }

    #[test]
    fn test_parse_component_failures() {
        let client = MetadataClient::from_parts("url", "token");
        let xml = r#"
            <componentFailures>
                <componentType>DuplicateRule</componentType>
                <fileName>duplicateRules/Account.Rule.duplicateRule</fileName>
                <fullName>Account.Rule</fullName>
                <lineNumber>10</lineNumber>
                <problem>Invalid value</problem>
                <problemType>Error</problemType>
            </componentFailures>
        "#;

        let failures = client.parse_component_failures(xml);
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures[0].component_type,
            Some("DuplicateRule".to_string())
        );
        assert_eq!(failures[0].problem, "Invalid value");
        assert_eq!(failures[0].line_number, Some(10));
    }

    #[test]
    fn test_parse_retrieve_result() {
        let client = MetadataClient::from_parts("url", "token");
        let xml = r#"
            <checkRetrieveStatusResponse>
                <result>
                    <done>true</done>
                    <fileProperties>
                        <fullName>Account.Rule</fullName>
                        <fileName>duplicateRules/Account.Rule.duplicateRule</fileName>
                        <type>DuplicateRule</type>
                        <id>0Bm123</id>
                    </fileProperties>
                    <id>09S123</id>
                    <status>Succeeded</status>
                    <success>true</success>
                    <zipFile>UEsDBBQ...</zipFile>
                </result>
            </checkRetrieveStatusResponse>
        "#;

        let result = client.parse_retrieve_result(xml).unwrap();
        assert_eq!(result.id, "09S123");
        assert!(result.done);
        assert!(result.success);
        assert_eq!(result.status, RetrieveStatus::Succeeded);
        assert!(result.zip_file.is_some());
    }

    #[test]
    fn test_parse_retrieve_result_done_as_text_false() {
        let client = MetadataClient::from_parts("url", "token");
        let xml = "<result><done>false</done><id>09S123</id><status>InProgress</status></result>";

        let result = client.parse_retrieve_result(xml).unwrap();
        assert!(!result.done);
        assert_eq!(result.status, RetrieveStatus::InProgress);
        assert!(result.zip_file.is_none());
    }

    #[test]
    fn test_parse_retrieve_result_missing_done_is_pending() {
        let client = MetadataClient::from_parts("url", "token");
        let xml = "<result><id>09S123</id></result>";

        let result = client.parse_retrieve_result(xml).unwrap();
        assert!(!result.done);
    }

    #[test]
    fn test_parse_retrieve_result_with_messages() {
        let client = MetadataClient::from_parts("url", "token");
        let xml = r#"
            <result>
                <done>true</done>
                <id>09S789</id>
                <messages>
                    <fileName>unpackaged/package.xml</fileName>
                    <problem>Entity of type 'DuplicateRule' named 'Account.Missing' cannot be found</problem>
                </messages>
                <status>Succeeded</status>
                <success>true</success>
            </result>
        "#;

        let result = client.parse_retrieve_result(xml).unwrap();
        assert!(result.success);
        assert_eq!(result.messages.len(), 1);
        assert_eq!(result.messages[0].file_name, "unpackaged/package.xml");
        assert!(result.messages[0].problem.contains("cannot be found"));
    }
}
