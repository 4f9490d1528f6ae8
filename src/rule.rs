//! Duplicate Rule names and documents.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};
use crate::xml::{Element, XmlDocument};

/// Metadata type name used in retrieve manifests.
pub const DUPLICATE_RULE_TYPE: &str = "DuplicateRule";

/// Folder the Metadata API places Duplicate Rules in.
pub(crate) const DUPLICATE_RULE_FOLDER: &str = "duplicateRules";

const ROOT_ELEMENT: &str = "DuplicateRule";
const IS_ACTIVE: &str = "isActive";
const MASTER_LABEL: &str = "masterLabel";

/// Fully-qualified API name of a Duplicate Rule, e.g.
/// `Account.CRM_Account_Rule_1`.
///
/// The name becomes part of a file path, so separators and `..` are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleName(String);

impl RuleName {
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(invalid_name("name must not be empty"));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(invalid_name(format!(
                "'{}' must not contain path separators",
                name
            )));
        }
        if name.contains("..") {
            return Err(invalid_name(format!("'{}' must not contain '..'", name)));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<name>.duplicateRule`
    pub fn file_name(&self) -> String {
        format!("{}.duplicateRule", self.0)
    }
}

impl FromStr for RuleName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RuleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn invalid_name(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidRuleName(message.into()))
}

/// A parsed `.duplicateRule` file.
///
/// Only `isActive` is ever changed; everything else is written back as read.
#[derive(Debug, Clone)]
pub struct RuleDocument {
    doc: XmlDocument,
}

impl RuleDocument {
    pub fn parse(xml: &str) -> Result<Self> {
        let doc = XmlDocument::parse(xml)?;
        if doc.root.local_name() != ROOT_ELEMENT {
            return Err(Error::new(ErrorKind::InvalidRule(format!(
                "expected <{}> root element, found <{}>",
                ROOT_ELEMENT, doc.root.name
            ))));
        }
        Ok(Self { doc })
    }

    pub fn root(&self) -> &Element {
        &self.doc.root
    }

    /// Text of a top-level field.
    pub fn field(&self, name: &str) -> Option<String> {
        self.doc.root.child_text(name)
    }

    pub fn master_label(&self) -> Option<String> {
        self.field(MASTER_LABEL)
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
    }

    /// Raw `isActive` text, if the element is present.
    pub fn is_active(&self) -> Option<String> {
        self.field(IS_ACTIVE)
    }

    /// True only when the `isActive` text is exactly `false`. Metadata
    /// booleans are text, so anything else (padded values and a missing
    /// element included) counts as active.
    pub fn is_inactive(&self) -> bool {
        self.is_active().is_some_and(|value| value == "false")
    }

    /// Set `isActive` to `false`, appending the element if it is missing.
    pub fn deactivate(&mut self) {
        match self.doc.root.child_mut(IS_ACTIVE) {
            Some(element) => element.set_text("false"),
            None => self.doc.root.push(Element::with_text(IS_ACTIVE, "false")),
        }
    }

    pub fn to_xml(&self) -> Result<String> {
        self.doc.to_xml_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::Node;

    const ACTIVE_RULE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DuplicateRule xmlns="http://soap.sforce.com/2006/04/metadata">
    <actionOnInsert>Allow</actionOnInsert>
    <actionOnUpdate>Allow</actionOnUpdate>
    <alertText>Use one of these records?</alertText>
    <description>Standard rule</description>
    <duplicateRuleFilter xsi:nil="true" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"/>
    <duplicateRuleMatchRules>
        <matchRuleSObjectType>Account</matchRuleSObjectType>
        <matchingRule>Standard_Account_Match_Rule_v1_0</matchingRule>
        <objectMapping xsi:nil="true" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"/>
    </duplicateRuleMatchRules>
    <isActive>true</isActive>
    <masterLabel>CRM Account Rule 1</masterLabel>
    <operationsOnInsert>Alert</operationsOnInsert>
    <operationsOnInsert>Report</operationsOnInsert>
    <securityOption>EnforceSharingRules</securityOption>
    <sortOrder>1</sortOrder>
</DuplicateRule>
"#;

    #[test]
    fn test_rule_name_validation() {
        assert_eq!(
            RuleName::new("  Account.CRM_Account_Rule_1 ").unwrap().as_str(),
            "Account.CRM_Account_Rule_1"
        );
        for bad in ["", "   ", "../etc/passwd", "Account/Rule", "Account\\Rule", "Account..Rule"] {
            let err = RuleName::new(bad).unwrap_err();
            assert!(
                matches!(err.kind, ErrorKind::InvalidRuleName(_)),
                "expected InvalidRuleName for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_rule_name_file_name() {
        let name: RuleName = "Lead.Standard_Rule".parse().unwrap();
        assert_eq!(name.file_name(), "Lead.Standard_Rule.duplicateRule");
        assert_eq!(name.to_string(), "Lead.Standard_Rule");
    }

    #[test]
    fn test_reads_label_and_flag() {
        let rule = RuleDocument::parse(ACTIVE_RULE).unwrap();
        assert_eq!(rule.master_label().as_deref(), Some("CRM Account Rule 1"));
        assert_eq!(rule.is_active().as_deref(), Some("true"));
        assert!(!rule.is_inactive());
    }

    #[test]
    fn test_inactive_comparison_is_textual() {
        let xml = |value: &str| format!("<DuplicateRule><isActive>{}</isActive></DuplicateRule>", value);

        assert!(RuleDocument::parse(&xml("false")).unwrap().is_inactive());
        assert!(!RuleDocument::parse(&xml(" false ")).unwrap().is_inactive());
        assert!(!RuleDocument::parse(&xml("False")).unwrap().is_inactive());
        assert!(!RuleDocument::parse(&xml("0")).unwrap().is_inactive());
        assert!(!RuleDocument::parse("<DuplicateRule/>").unwrap().is_inactive());
    }

    #[test]
    fn test_deactivate_changes_only_is_active() {
        let original = RuleDocument::parse(ACTIVE_RULE).unwrap();
        let mut rule = original.clone();
        rule.deactivate();

        let written = RuleDocument::parse(&rule.to_xml().unwrap()).unwrap();
        assert!(written.is_inactive());

        let before: Vec<_> = original.root().elements().collect();
        let after: Vec<_> = written.root().elements().collect();
        assert_eq!(before.len(), after.len());
        for (b, a) in before.iter().zip(&after) {
            assert_eq!(b.name, a.name);
            if b.name != "isActive" {
                assert_eq!(b, a);
            }
        }
        assert_eq!(original.root().attributes, written.root().attributes);
    }

    #[test]
    fn test_deactivate_keeps_text_whitespace() {
        let mut rule = RuleDocument::parse(
            "<DuplicateRule><alertText>  Use one of these records?  </alertText>\
             <description> </description><isActive>true</isActive></DuplicateRule>",
        )
        .unwrap();
        assert_eq!(rule.field("alertText").as_deref(), Some("  Use one of these records?  "));
        assert_eq!(rule.field("description").as_deref(), Some(" "));

        rule.deactivate();
        let xml = rule.to_xml().unwrap();
        assert!(xml.contains("<alertText>  Use one of these records?  </alertText>"));
        assert!(xml.contains("<description> </description>"));

        let written = RuleDocument::parse(&xml).unwrap();
        assert_eq!(written.field("alertText").as_deref(), Some("  Use one of these records?  "));
        assert_eq!(written.field("description").as_deref(), Some(" "));
        assert!(written.is_inactive());
    }

    #[test]
    fn test_deactivate_appends_missing_flag() {
        let mut rule =
            RuleDocument::parse("<DuplicateRule><masterLabel>R</masterLabel></DuplicateRule>").unwrap();
        assert_eq!(rule.is_active(), None);

        rule.deactivate();

        let last = rule.root().children.last().unwrap();
        assert!(matches!(last, Node::Element(e) if e.name == "isActive"));
        assert!(rule.is_inactive());
    }

    #[test]
    fn test_untouched_round_trip_keeps_fields() {
        let rule = RuleDocument::parse(ACTIVE_RULE).unwrap();
        let reparsed = RuleDocument::parse(&rule.to_xml().unwrap()).unwrap();

        for field in ["masterLabel", "isActive", "description", "sortOrder", "securityOption"] {
            assert_eq!(rule.field(field), reparsed.field(field), "field {}", field);
        }
        assert_eq!(rule.root(), reparsed.root());
    }

    #[test]
    fn test_missing_label_is_none() {
        let rule =
            RuleDocument::parse("<DuplicateRule><masterLabel>  </masterLabel></DuplicateRule>").unwrap();
        assert_eq!(rule.master_label(), None);
    }

    #[test]
    fn test_wrong_root_rejected() {
        let err = RuleDocument::parse("<MatchingRule><isActive>true</isActive></MatchingRule>")
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidRule(_)));
        assert!(err.to_string().contains("MatchingRule"));
    }
}
