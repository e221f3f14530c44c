//! Inbound search query model.
//!
//! A request body is decoded into a [`RawQuery`], which holds exactly what the caller sent.
//! [`RawQuery::with_defaults`] then produces a [`Query`] with every optional field filled in, and
//! [`Query::validate`] reports every violated rule at once. Only a [`ValidatedQuery`] can be
//! handed to the directory.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Scope applied when the caller does not send one.
pub const DEFAULT_SCOPE: &str = "base";

/// Search breadth relative to the search base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Base object only.
    Base,
    /// One level below the base.
    OneLevel,
    /// Entire subtree.
    Subtree,
}

impl SearchScope {
    /// Parses the wire representation (`base`, `one`, `sub`), ignoring case.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if value.eq_ignore_ascii_case("base") {
            Some(Self::Base)
        } else if value.eq_ignore_ascii_case("one") {
            Some(Self::OneLevel)
        } else if value.eq_ignore_ascii_case("sub") {
            Some(Self::Subtree)
        } else {
            None
        }
    }

    /// Wire representation of the scope.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::OneLevel => "one",
            Self::Subtree => "sub",
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field-level violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Name of the offending query field
    pub parameter: String,
    /// Human-readable description of the violation
    pub error: String,
}

impl ValidationError {
    /// Creates a new violation.
    #[must_use]
    pub fn new(parameter: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            error: error.into(),
        }
    }
}

/// Query body exactly as decoded from JSON.
///
/// Every field is optional so that absent and `null` members decode cleanly; a member of the
/// wrong JSON type is still a decode error. Keys are accepted in lower, capitalised or upper case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawQuery {
    /// Protocol filter string
    #[serde(default, alias = "Filter", alias = "FILTER")]
    pub filter: Option<String>,
    /// Search base
    #[serde(default, alias = "Base", alias = "BASE")]
    pub base: Option<String>,
    /// Attributes to project
    #[serde(default, alias = "Attributes", alias = "ATTRIBUTES")]
    pub attributes: Option<Vec<String>>,
    /// Search scope
    #[serde(default, alias = "Scope", alias = "SCOPE")]
    pub scope: Option<String>,
}

impl RawQuery {
    /// Fills absent fields: `scope` becomes [`DEFAULT_SCOPE`], everything else becomes empty.
    #[must_use]
    pub fn with_defaults(self) -> Query {
        Query {
            filter: self.filter.unwrap_or_default(),
            base: self.base.unwrap_or_default(),
            attributes: self.attributes.unwrap_or_default(),
            scope: self.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
        }
    }
}

/// Search query with defaults applied, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Protocol filter string, opaque to the gateway
    pub filter: String,
    /// Search base
    pub base: String,
    /// Attributes to project, in request order
    pub attributes: Vec<String>,
    /// Scope as sent by the caller (or the default)
    pub scope: String,
}

impl Query {
    /// Decodes a request body and applies defaults.
    ///
    /// A `null` body decodes like an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequestMalformed`] if the body is not a JSON object of the expected shape.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let raw: Option<RawQuery> = serde_json::from_slice(body)?;
        Ok(raw.unwrap_or_default().with_defaults())
    }

    /// Checks every rule and returns all violations, in field order.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut violations = Vec::new();

        if self.filter.is_empty() {
            violations.push(ValidationError::new("filter", "REQUIRED field"));
        }

        if self.base.is_empty() {
            violations.push(ValidationError::new("base", "REQUIRED field"));
        } else if !is_search_base(&self.base) {
            violations.push(ValidationError::new(
                "base",
                "base does not appear to be a valid LDAP path",
            ));
        }

        if self.attributes.is_empty() {
            violations.push(ValidationError::new(
                "attributes",
                "attributes to be returned MUST be defined",
            ));
        }

        if SearchScope::parse(&self.scope).is_none() {
            violations.push(ValidationError::new(
                "scope",
                "If specified, scope MUST be one of 'base', 'one', or 'sub'",
            ));
        }

        violations
    }

    /// Validates the query and converts it into a [`ValidatedQuery`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationFailed`] carrying the complete list of violations.
    pub fn into_validated(self) -> Result<ValidatedQuery> {
        let violations = self.validate();
        if !violations.is_empty() {
            return Err(Error::ValidationFailed(violations));
        }

        let scope = SearchScope::parse(&self.scope)
            .ok_or_else(|| Error::InternalError(format!("unvalidated scope `{}`", self.scope)))?;

        Ok(ValidatedQuery {
            filter: self.filter,
            base: self.base,
            attributes: self.attributes,
            scope,
        })
    }
}

/// A query that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    filter: String,
    base: String,
    attributes: Vec<String>,
    scope: SearchScope,
}

impl ValidatedQuery {
    /// Protocol filter string.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Search base.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Requested attributes, in request order.
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Search scope.
    #[must_use]
    pub const fn scope(&self) -> SearchScope {
        self.scope
    }
}

/// Structural check of a search base: `ou=` components followed by `dc=` components.
///
/// Component values are not inspected beyond excluding commas. A single trailing comma is
/// tolerated.
fn is_search_base(base: &str) -> bool {
    let trimmed = base.strip_suffix(',').unwrap_or(base);
    if trimmed.is_empty() {
        return false;
    }

    let mut seen_dc = false;
    for component in trimmed.split(',') {
        if has_prefix_ignore_case(component, "ou=") {
            if seen_dc {
                return false;
            }
        } else if has_prefix_ignore_case(component, "dc=") {
            seen_dc = true;
        } else {
            return false;
        }
    }

    true
}

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(filter: &str, base: &str, attributes: &[&str], scope: &str) -> Query {
        Query {
            filter: filter.to_string(),
            base: base.to_string(),
            attributes: attributes.iter().map(|a| (*a).to_string()).collect(),
            scope: scope.to_string(),
        }
    }

    fn parameters(violations: &[ValidationError]) -> Vec<&str> {
        violations.iter().map(|v| v.parameter.as_str()).collect()
    }

    #[test]
    fn parse_applies_default_scope() {
        let query =
            Query::parse(br#"{"filter":"(cn=*)","base":"dc=example,dc=com","attributes":["cn"]}"#)
                .unwrap();
        assert_eq!(query.scope, "base");
        assert!(query.validate().is_empty());
    }

    #[test]
    fn parse_treats_null_as_absent() {
        let query = Query::parse(br#"{"filter":null,"scope":null}"#).unwrap();
        assert_eq!(query.scope, "base");
        assert!(query.filter.is_empty());
        assert!(query.attributes.is_empty());
    }

    #[test]
    fn parse_accepts_capitalised_keys() {
        let query = Query::parse(
            br#"{"Filter":"(cn=*)","Base":"dc=example,dc=com","Attributes":["cn"],"SCOPE":"one"}"#,
        )
        .unwrap();
        assert_eq!(query.filter, "(cn=*)");
        assert_eq!(query.base, "dc=example,dc=com");
        assert_eq!(query.attributes, vec!["cn"]);
        assert_eq!(query.scope, "one");
        assert!(query.validate().is_empty());
    }

    #[test]
    fn null_body_fails_validation_not_decoding() {
        let query = Query::parse(b"null").unwrap();
        assert_eq!(query.scope, DEFAULT_SCOPE);
        assert_eq!(query.validate().len(), 3);
    }

    #[test]
    fn parse_keeps_explicit_empty_scope() {
        let query = Query::parse(br#"{"scope":""}"#).unwrap();
        assert_eq!(query.scope, "");
        assert!(parameters(&query.validate()).contains(&"scope"));
    }

    #[test]
    fn parse_rejects_wrong_types() {
        let err = Query::parse(br#"{"attributes":"cn"}"#).unwrap_err();
        assert!(matches!(err, Error::RequestMalformed(_)));

        let err = Query::parse(b"not json").unwrap_err();
        assert!(matches!(err, Error::RequestMalformed(_)));
    }

    #[test]
    fn empty_query_reports_every_violation() {
        let violations = query("", "", &[], "").validate();
        assert_eq!(
            parameters(&violations),
            vec!["filter", "base", "attributes", "scope"]
        );
        assert_eq!(violations[0].error, "REQUIRED field");
        assert_eq!(violations[1].error, "REQUIRED field");
    }

    #[test]
    fn empty_filter_is_rejected() {
        let violations = query("", "dc=example,dc=com", &["cn"], "base").validate();
        assert_eq!(parameters(&violations), vec!["filter"]);
    }

    #[test]
    fn scope_is_case_insensitive() {
        let validated = query("(cn=*)", "dc=example,dc=com", &["cn"], "SUB")
            .into_validated()
            .unwrap();
        assert_eq!(validated.scope(), SearchScope::Subtree);

        let validated = query("(cn=*)", "dc=example,dc=com", &["cn"], "One")
            .into_validated()
            .unwrap();
        assert_eq!(validated.scope(), SearchScope::OneLevel);
    }

    #[test]
    fn unknown_scope_is_rejected() {
        let violations = query("(cn=*)", "dc=example,dc=com", &["cn"], "subtree").validate();
        assert_eq!(parameters(&violations), vec!["scope"]);
        assert_eq!(
            violations[0].error,
            "If specified, scope MUST be one of 'base', 'one', or 'sub'"
        );
    }

    #[test]
    fn missing_attributes_never_validate() {
        let err = query("(cn=*)", "dc=example,dc=com", &[], "base")
            .into_validated()
            .unwrap_err();
        match err {
            Error::ValidationFailed(violations) => {
                assert_eq!(parameters(&violations), vec!["attributes"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn accepted_search_bases() {
        for base in [
            "dc=example,dc=com",
            "ou=People,dc=example,dc=com",
            "OU=Staff,ou=People,DC=example,DC=com",
            "ou=People",
            "dc=com,",
            "ou=,dc=",
            "ou=Sales Team,dc=example",
        ] {
            assert!(is_search_base(base), "expected `{base}` to be accepted");
        }
    }

    #[test]
    fn rejected_search_bases() {
        for base in [
            "cn=admin,dc=example,dc=com",
            "dc=example,ou=People",
            "ou=People,,dc=com",
            ",dc=com",
            ",",
            "dc=com,,",
            "example.com",
            "ou=People, dc=example",
        ] {
            assert!(!is_search_base(base), "expected `{base}` to be rejected");
        }
    }

    #[test]
    fn malformed_base_reports_format_violation() {
        let violations = query("(cn=*)", "cn=x,dc=example", &["cn"], "base").validate();
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].error,
            "base does not appear to be a valid LDAP path"
        );
    }

    #[test]
    fn validation_errors_serialize_as_pairs() {
        let json = serde_json::to_string(&vec![ValidationError::new("filter", "REQUIRED field")])
            .unwrap();
        assert_eq!(json, r#"[{"parameter":"filter","error":"REQUIRED field"}]"#);
    }
}
