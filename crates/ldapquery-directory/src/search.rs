//! Protocol-level search parameters.

use ldap3::{DerefAliases, Scope, SearchOptions};
use ldapquery_core::query::{SearchScope, ValidatedQuery};

/// Entries requested per page of a paged search.
pub const PAGE_SIZE: i32 = 10_000;

/// Search request handed to an [`LdapSession`](crate::LdapSession).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Search base
    pub base: String,
    /// Search scope
    pub scope: SearchScope,
    /// Protocol filter
    pub filter: String,
    /// Attributes to return
    pub attributes: Vec<String>,
}

impl SearchRequest {
    /// Builds the request for a validated query.
    #[must_use]
    pub fn from_query(query: &ValidatedQuery) -> Self {
        Self {
            base: query.base().to_string(),
            scope: query.scope(),
            filter: query.filter().to_string(),
            attributes: query.attributes().to_vec(),
        }
    }

    /// Scope in `ldap3` terms.
    #[must_use]
    pub fn ldap_scope(&self) -> Scope {
        ldap_scope(self.scope)
    }
}

/// Maps the gateway scope onto the protocol's three-valued scope.
#[must_use]
pub const fn ldap_scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::Subtree => Scope::Subtree,
    }
}

/// Options for every search: never dereference aliases, no size or time limit.
#[must_use]
pub fn search_options() -> SearchOptions {
    SearchOptions::new()
        .deref(DerefAliases::Never)
        .sizelimit(0)
        .timelimit(0)
}
