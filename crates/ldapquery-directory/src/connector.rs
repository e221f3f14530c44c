//! LDAP transport seam and its `ldap3` implementation.

use async_trait::async_trait;
use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, SearchEntry};
use ldapquery_core::config::DirectoryConfig;
use ldapquery_core::error::Error;
use native_tls::{Certificate, TlsConnector};
use std::fs;
use thiserror::Error;
use url::Url;

use crate::entry::LdapEntry;
use crate::result_code;
use crate::search::{search_options, SearchRequest, PAGE_SIZE};
use crate::Result;

/// Failure reported by the directory or the transport beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProtocolError {
    /// LDAP result code, when the failure came from an LDAP result
    pub code: Option<u32>,
    /// Raw error text
    pub message: String,
}

impl ProtocolError {
    /// Error carrying an LDAP result code.
    #[must_use]
    pub fn with_code(code: u32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Transport-level error without a result code.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Standard description of the result code when known, else the raw text.
    #[must_use]
    pub fn friendly_message(&self) -> String {
        self.code
            .and_then(result_code::describe)
            .map_or_else(|| self.message.clone(), str::to_string)
    }
}

impl From<ldap3::LdapError> for ProtocolError {
    fn from(err: ldap3::LdapError) -> Self {
        match err {
            ldap3::LdapError::LdapResult { result } => {
                Self::with_code(result.rc, result.to_string())
            }
            other => Self::transport(other.to_string()),
        }
    }
}

/// An open connection to one directory host.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LdapSession: Send {
    /// Authenticates the connection.
    async fn simple_bind(
        &mut self,
        dn: &str,
        password: &str,
    ) -> std::result::Result<(), ProtocolError>;

    /// Runs a paged search, fetching every page.
    async fn search_paged(
        &mut self,
        request: &SearchRequest,
    ) -> std::result::Result<Vec<LdapEntry>, ProtocolError>;

    /// Unbinds and closes the connection.
    async fn unbind(&mut self) -> std::result::Result<(), ProtocolError>;
}

/// Dials a single directory host.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LdapConnector: Send + Sync {
    /// Opens an unauthenticated connection to `host:port`.
    async fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> std::result::Result<Box<dyn LdapSession>, ProtocolError>;
}

/// Real LDAP connector backed by `ldap3`.
pub struct RealLdapConnector {
    scheme: &'static str,
    settings: LdapConnSettings,
}

impl RealLdapConnector {
    /// Creates a connector for the TLS mode and timeouts in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the TLS settings cannot be built.
    pub fn new(config: &DirectoryConfig) -> Result<Self> {
        Ok(Self {
            scheme: config.scheme(),
            settings: build_ldap_settings(config)?,
        })
    }
}

#[async_trait]
impl LdapConnector for RealLdapConnector {
    async fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> std::result::Result<Box<dyn LdapSession>, ProtocolError> {
        let url = directory_url(self.scheme, host, port)?;
        let (conn, ldap) = LdapConnAsync::with_settings(self.settings.clone(), url.as_str()).await?;
        ldap3::drive!(conn);
        Ok(Box::new(RealLdapSession { inner: ldap }))
    }
}

struct RealLdapSession {
    inner: Ldap,
}

#[async_trait]
impl LdapSession for RealLdapSession {
    async fn simple_bind(
        &mut self,
        dn: &str,
        password: &str,
    ) -> std::result::Result<(), ProtocolError> {
        self.inner.simple_bind(dn, password).await?.success()?;
        Ok(())
    }

    async fn search_paged(
        &mut self,
        request: &SearchRequest,
    ) -> std::result::Result<Vec<LdapEntry>, ProtocolError> {
        let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(PAGE_SIZE)),
        ];

        let mut stream = self
            .inner
            .with_search_options(search_options())
            .streaming_search_with(
                adapters,
                &request.base,
                request.ldap_scope(),
                &request.filter,
                request.attributes.clone(),
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(entry) = stream.next().await? {
            entries.push(LdapEntry::from(SearchEntry::construct(entry)));
        }
        stream.finish().await.success()?;

        Ok(entries)
    }

    async fn unbind(&mut self) -> std::result::Result<(), ProtocolError> {
        self.inner.unbind().await?;
        Ok(())
    }
}

fn directory_url(
    scheme: &str,
    host: &str,
    port: u16,
) -> std::result::Result<Url, ProtocolError> {
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_string()
    };

    Url::parse(&format!("{scheme}://{host}:{port}"))
        .map_err(|err| ProtocolError::transport(format!("invalid directory host `{host}`: {err}")))
}

fn build_ldap_settings(config: &DirectoryConfig) -> Result<LdapConnSettings> {
    let mut settings = LdapConnSettings::new()
        .set_conn_timeout(config.connect_timeout())
        .set_starttls(config.start_tls && !config.use_ssl);

    if config.ssl_skip_verify {
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()
            .map_err(|err| {
                Error::ConfigError(format!("failed to construct TLS connector: {err}"))
            })?;
        settings = settings.set_connector(connector).set_no_tls_verify(true);
    } else if let Some(cert_path) = config.tls_ca_cert.as_ref() {
        let pem = fs::read(cert_path).map_err(|err| {
            Error::ConfigError(format!(
                "failed to read directory CA certificate {}: {err}",
                cert_path.display()
            ))
        })?;
        let certificate = Certificate::from_pem(&pem).map_err(|err| {
            Error::ConfigError(format!("invalid directory CA certificate: {err}"))
        })?;
        let connector = TlsConnector::builder()
            .add_root_certificate(certificate)
            .build()
            .map_err(|err| {
                Error::ConfigError(format!("failed to load directory CA certificate: {err}"))
            })?;
        settings = settings.set_connector(connector);
    }

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn friendly_message_prefers_result_code_text() {
        let err = ProtocolError::with_code(49, "rc=49 (invalidCredentials), dn: \"\", text: \"80090308\"");
        assert_eq!(err.friendly_message(), "Invalid Credentials");
    }

    #[test]
    fn friendly_message_falls_back_to_raw_text() {
        let err = ProtocolError::with_code(999, "rc=999 vendor specific");
        assert_eq!(err.friendly_message(), "rc=999 vendor specific");

        let err = ProtocolError::transport("connection reset by peer");
        assert_eq!(err.friendly_message(), "connection reset by peer");
    }

    #[test]
    fn directory_url_uses_scheme_and_port() {
        let url = directory_url("ldap", "dc1.example.com", 389).unwrap();
        assert_eq!(url.as_str(), "ldap://dc1.example.com:389");

        let url = directory_url("ldaps", "10.0.0.4", 636).unwrap();
        assert_eq!(url.as_str(), "ldaps://10.0.0.4:636");
    }

    #[test]
    fn directory_url_brackets_ipv6_hosts() {
        let url = directory_url("ldap", "::1", 389).unwrap();
        assert_eq!(url.as_str(), "ldap://[::1]:389");
    }

    #[test]
    fn directory_url_rejects_garbage() {
        let err = directory_url("ldap", "bad host", 389).unwrap_err();
        assert!(err.code.is_none());
    }

    #[test]
    fn missing_ca_certificate_is_a_config_error() {
        let config = DirectoryConfig::new(vec!["dc1".to_string()], "cn=admin", "secret")
            .with_tls_ca_cert(PathBuf::from("/nonexistent/ca.pem"));
        let err = RealLdapConnector::new(&config).err().unwrap();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
