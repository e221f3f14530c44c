//! Directory entries and their JSON-friendly shape.

use ldap3::SearchEntry;
use ldapquery_core::types::ResultEntry;
use std::collections::{BTreeMap, HashMap};

/// Pseudo-attribute that is answered from the entry's own DN.
pub const DISTINGUISHED_NAME: &str = "distinguishedname";

/// LDAP entry representation used by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LdapEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Attribute map (values preserved order from server).
    pub attributes: HashMap<String, Vec<String>>,
}

impl LdapEntry {
    /// Creates an entry with no attributes.
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// Adds an attribute with its values.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.attributes.insert(name.into(), values);
        self
    }

    /// Returns the first value of the attribute if present.
    ///
    /// An exact name match wins; otherwise the name is matched ignoring ASCII case, since servers
    /// may return attribute names in their schema casing rather than the requested one.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.values(attribute)
            .and_then(|values| values.first().map(String::as_str))
    }

    /// Returns all values for the attribute.
    #[must_use]
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attributes
            .get(attribute)
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
                    .map(|(_, values)| values)
            })
            .map(Vec::as_slice)
    }

    /// Projects the requested attributes into a [`ResultEntry`].
    ///
    /// `distinguishedName` (any case) is filled from the entry's DN. Every other requested
    /// attribute maps to its first value, or an empty string when the entry lacks it.
    #[must_use]
    pub fn shape(&self, requested: &[String]) -> ResultEntry {
        let mut shaped = ResultEntry {
            distinguished_name: None,
            attributes: BTreeMap::new(),
        };

        for attribute in requested {
            if attribute.eq_ignore_ascii_case(DISTINGUISHED_NAME) {
                shaped.distinguished_name = Some(self.dn.clone());
                continue;
            }

            shaped.attributes.insert(
                attribute.clone(),
                self.first(attribute).unwrap_or_default().to_string(),
            );
        }

        shaped
    }
}

/// Values that are not valid UTF-8 arrive in `bin_attrs`; they are kept, lossily decoded, so a
/// binary attribute is never mistaken for a missing one.
impl From<SearchEntry> for LdapEntry {
    fn from(entry: SearchEntry) -> Self {
        let mut attributes = entry.attrs;
        for (name, values) in entry.bin_attrs {
            attributes.entry(name).or_insert_with(|| {
                values
                    .iter()
                    .map(|value| String::from_utf8_lossy(value).into_owned())
                    .collect()
            });
        }

        Self {
            dn: entry.dn,
            attributes,
        }
    }
}

/// Shapes every entry, preserving server order.
#[must_use]
pub fn shape_entries(entries: &[LdapEntry], requested: &[String]) -> Vec<ResultEntry> {
    entries.iter().map(|entry| entry.shape(requested)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requested(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_string()).collect()
    }

    #[test]
    fn distinguished_name_comes_from_entry_identity() {
        let entry = LdapEntry::new("cn=a,dc=x").with_attribute("mail", vec!["a@x.com".to_string()]);

        let shaped = entry.shape(&requested(&["distinguishedName", "mail"]));
        assert_eq!(shaped.distinguished_name.as_deref(), Some("cn=a,dc=x"));
        assert_eq!(shaped.attributes.len(), 1);
        assert_eq!(shaped.attributes["mail"], "a@x.com");
    }

    #[test]
    fn distinguished_name_match_ignores_case() {
        let entry = LdapEntry::new("cn=b,dc=x");
        let shaped = entry.shape(&requested(&["DISTINGUISHEDNAME"]));
        assert_eq!(shaped.distinguished_name.as_deref(), Some("cn=b,dc=x"));
        assert!(shaped.attributes.is_empty());
    }

    #[test]
    fn missing_attribute_becomes_empty_string() {
        let entry = LdapEntry::new("cn=c,dc=x");
        let shaped = entry.shape(&requested(&["telephoneNumber"]));
        assert_eq!(shaped.attributes["telephoneNumber"], "");
        assert!(shaped.distinguished_name.is_none());
    }

    #[test]
    fn only_first_value_is_kept() {
        let entry = LdapEntry::new("cn=d,dc=x").with_attribute(
            "memberOf",
            vec!["cn=g1,dc=x".to_string(), "cn=g2,dc=x".to_string()],
        );
        let shaped = entry.shape(&requested(&["memberOf"]));
        assert_eq!(shaped.attributes["memberOf"], "cn=g1,dc=x");
    }

    #[test]
    fn attribute_lookup_falls_back_to_case_insensitive() {
        let entry =
            LdapEntry::new("cn=e,dc=x").with_attribute("sAMAccountName", vec!["e".to_string()]);
        assert_eq!(entry.first("samaccountname"), Some("e"));

        let shaped = entry.shape(&requested(&["samaccountname"]));
        assert_eq!(shaped.attributes["samaccountname"], "e");
    }

    #[test]
    fn unrequested_attributes_are_not_projected() {
        let entry = LdapEntry::new("cn=f,dc=x")
            .with_attribute("mail", vec!["f@x.com".to_string()])
            .with_attribute("userPassword", vec!["secret".to_string()]);
        let shaped = entry.shape(&requested(&["mail"]));
        assert_eq!(shaped.attributes.len(), 1);
        assert!(!shaped.attributes.contains_key("userPassword"));
    }

    #[test]
    fn binary_values_are_kept() {
        let mut attrs = HashMap::new();
        attrs.insert("cn".to_string(), vec!["g".to_string()]);
        let mut bin_attrs = HashMap::new();
        bin_attrs.insert("objectGUID".to_string(), vec![vec![0xff, 0x41, 0x42]]);
        bin_attrs.insert("cn".to_string(), vec![vec![0xfe]]);

        let entry = LdapEntry::from(SearchEntry {
            dn: "cn=g,dc=x".to_string(),
            attrs,
            bin_attrs,
        });

        let shaped = entry.shape(&requested(&["objectGUID", "cn"]));
        assert_eq!(shaped.attributes["objectGUID"], "\u{fffd}AB");
        assert_eq!(shaped.attributes["cn"], "g");
    }

    #[test]
    fn shape_entries_preserves_order() {
        let entries = vec![LdapEntry::new("cn=1,dc=x"), LdapEntry::new("cn=2,dc=x")];
        let shaped = shape_entries(&entries, &requested(&["distinguishedName"]));
        let dns: Vec<_> = shaped
            .iter()
            .filter_map(|entry| entry.distinguished_name.as_deref())
            .collect();
        assert_eq!(dns, vec!["cn=1,dc=x", "cn=2,dc=x"]);
    }
}
