//! Directory client: host failover, bind and search.

use ldapquery_core::config::DirectoryConfig;
use ldapquery_core::error::Error;
use ldapquery_core::query::ValidatedQuery;
use ldapquery_core::types::ResultEntry;
use rand::seq::SliceRandom;
use rand::Rng;
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::connector::{LdapConnector, LdapSession, RealLdapConnector};
use crate::entry::shape_entries;
use crate::search::SearchRequest;
use crate::Result;

/// Directory client with pluggable LDAP backend.
///
/// Every call to [`DirectoryClient::connect`] opens a fresh connection; nothing is pooled.
pub struct DirectoryClient {
    config: Arc<DirectoryConfig>,
    connector: Box<dyn LdapConnector>,
}

impl DirectoryClient {
    /// Creates a client that uses the real LDAP connector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the TLS settings in `config` are unusable.
    pub fn new(config: Arc<DirectoryConfig>) -> Result<Self> {
        let connector = RealLdapConnector::new(&config)?;
        Ok(Self {
            config,
            connector: Box::new(connector),
        })
    }

    /// Creates a client with a custom connector.
    #[must_use]
    pub fn with_connector(config: Arc<DirectoryConfig>, connector: Box<dyn LdapConnector>) -> Self {
        Self { config, connector }
    }

    /// Directory configuration in use.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Opens an authenticated connection.
    ///
    /// Hosts are tried in a fresh random order until one accepts the dial. Only the dial is
    /// retried across hosts; the bind is attempted once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryUnreachable`] when no host accepts a connection and
    /// [`Error::DirectoryBindFailed`] when the bind is rejected.
    pub async fn connect(&self) -> Result<DirectoryConnection> {
        let order = {
            let mut rng = rand::thread_rng();
            host_order(self.config.hosts.len(), &mut rng)
        };

        let port = self.config.port;
        let mut dialed = None;

        for index in order {
            let host = &self.config.hosts[index];
            debug!(host = %host, port, "attempting to connect to directory");

            match self.connector.connect(host, port).await {
                Ok(session) => {
                    dialed = Some((host.clone(), session));
                    break;
                }
                Err(err) => {
                    error!(host = %host, port, error = %err, "unable to dial LDAP directory server");
                }
            }
        }

        let (host, mut session) = dialed.ok_or(Error::DirectoryUnreachable)?;

        if let Err(err) = session
            .simple_bind(
                &self.config.bind_dn,
                self.config.bind_password.expose_secret(),
            )
            .await
        {
            let message = err.friendly_message();
            warn!(host = %host, error = %err, "directory rejected bind");
            return Err(Error::DirectoryBindFailed(message));
        }

        debug!(host = %host, port, "bound to directory");
        Ok(DirectoryConnection { host, session })
    }
}

/// An authenticated connection, owned by a single request.
///
/// Dropping the connection releases the socket; [`DirectoryConnection::close`] additionally
/// sends an unbind.
pub struct DirectoryConnection {
    host: String,
    session: Box<dyn LdapSession>,
}

impl DirectoryConnection {
    /// Host this connection is bound to.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Runs a paged search and shapes the entries.
    ///
    /// An empty result is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SearchFailed`] with the friendly result-code text when available.
    pub async fn search(&mut self, query: &ValidatedQuery) -> Result<Vec<ResultEntry>> {
        let request = SearchRequest::from_query(query);
        debug!(
            host = %self.host,
            base = %request.base,
            scope = %request.scope,
            filter = %request.filter,
            "dispatching paged search"
        );

        let entries = self
            .session
            .search_paged(&request)
            .await
            .map_err(|err| Error::SearchFailed(err.friendly_message()))?;

        Ok(shape_entries(&entries, query.attributes()))
    }

    /// Unbinds and closes the connection.
    pub async fn close(mut self) {
        if let Err(err) = self.session.unbind().await {
            debug!(host = %self.host, error = %err, "unbind failed while closing connection");
        }
    }
}

/// Uniformly random permutation of `0..len`.
pub(crate) fn host_order<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);
    order
}
