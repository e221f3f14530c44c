//! Directory access for the LDAP query gateway.
//!
//! This crate opens authenticated connections with randomized host failover, translates
//! validated queries into paged LDAP searches and flattens the returned entries.

#![deny(missing_docs)]

mod client;
mod connector;
mod entry;
pub mod result_code;
mod search;

pub use client::{DirectoryClient, DirectoryConnection};
pub use connector::{LdapConnector, LdapSession, ProtocolError, RealLdapConnector};
pub use entry::{shape_entries, LdapEntry, DISTINGUISHED_NAME};
pub use search::{ldap_scope, search_options, SearchRequest, PAGE_SIZE};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = ldapquery_core::Result<T>;
