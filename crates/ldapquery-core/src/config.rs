//! Configuration structures for the gateway.
//!
//! [`GatewayConfig`] is loaded once at startup, validated, and then shared read-only by every
//! request. The directory section is never mutated by request handling.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

use crate::error::{Error, Result};

/// Default LDAP port.
pub const DEFAULT_DIRECTORY_PORT: u16 = 389;
/// Default HTTP listen port.
pub const DEFAULT_SERVER_PORT: u16 = 9999;
/// Default directory dial timeout (seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 60;

/// Complete process configuration.
#[derive(Debug, Deserialize, Validate)]
pub struct GatewayConfig {
    /// HTTP server settings
    #[validate(nested)]
    pub server: ServerConfig,

    /// Directory connection settings
    #[validate(nested)]
    pub directory: DirectoryConfig,
}

impl GatewayConfig {
    /// Parses a TOML document.
    ///
    /// The result is not validated; call [`GatewayConfig::check`] once all overrides are applied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the document cannot be decoded.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the file cannot be read or decoded.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::ConfigError(format!(
                "unable to read config file {}: {err}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing every failed rule.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServerConfig {
    /// Address to listen on
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Port to listen on
    #[validate(range(min = 1))]
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Enables debug logging
    #[serde(default)]
    pub debug: bool,

    /// Client IPs allowed to query
    #[validate(length(min = 1))]
    #[serde(default)]
    pub allowed_sources: Vec<String>,
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

const fn default_server_port() -> u16 {
    DEFAULT_SERVER_PORT
}

impl ServerConfig {
    /// Creates a server configuration allowing the given sources.
    #[must_use]
    pub fn new(allowed_sources: Vec<String>) -> Self {
        Self {
            listen_address: default_listen_address(),
            port: DEFAULT_SERVER_PORT,
            debug: false,
            allowed_sources,
        }
    }

    /// Set the listen port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable debug logging.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// `listen_address:port` string for binding.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen_address, self.port)
    }
}

/// Directory connection settings.
#[derive(Debug, Deserialize, Validate)]
pub struct DirectoryConfig {
    /// Directory hosts, tried in random order
    #[validate(length(min = 1))]
    pub hosts: Vec<String>,

    /// Port shared by every host
    #[validate(range(min = 1))]
    #[serde(default = "default_directory_port")]
    pub port: u16,

    /// DN used for the bind
    #[validate(length(min = 1))]
    pub bind_dn: String,

    /// Password used for the bind
    #[serde(deserialize_with = "deserialize_secret")]
    pub bind_password: SecretString,

    /// Dial `ldaps://` instead of `ldap://`
    #[serde(default)]
    pub use_ssl: bool,

    /// Upgrade plain connections with StartTLS
    #[serde(default)]
    pub start_tls: bool,

    /// Skip TLS certificate verification
    #[serde(default)]
    pub ssl_skip_verify: bool,

    /// Optional CA certificate (PEM) for TLS verification
    #[serde(default)]
    pub tls_ca_cert: Option<PathBuf>,

    /// Dial timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

const fn default_directory_port() -> u16 {
    DEFAULT_DIRECTORY_PORT
}

const fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl DirectoryConfig {
    /// Creates a plain-LDAP directory configuration with default port and timeout.
    #[must_use]
    pub fn new(
        hosts: Vec<String>,
        bind_dn: impl Into<String>,
        bind_password: impl Into<String>,
    ) -> Self {
        Self {
            hosts,
            port: DEFAULT_DIRECTORY_PORT,
            bind_dn: bind_dn.into(),
            bind_password: SecretString::from(bind_password.into()),
            use_ssl: false,
            start_tls: false,
            ssl_skip_verify: false,
            tls_ca_cert: None,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    /// Set the directory port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Dial over LDAPS.
    #[must_use]
    pub const fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    /// Upgrade with StartTLS.
    #[must_use]
    pub const fn with_start_tls(mut self, start_tls: bool) -> Self {
        self.start_tls = start_tls;
        self
    }

    /// Skip TLS certificate verification.
    #[must_use]
    pub const fn with_ssl_skip_verify(mut self, skip: bool) -> Self {
        self.ssl_skip_verify = skip;
        self
    }

    /// Set the CA certificate path.
    #[must_use]
    pub fn with_tls_ca_cert(mut self, path: PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set the dial timeout in seconds.
    #[must_use]
    pub const fn with_connect_timeout_secs(mut self, seconds: u64) -> Self {
        self.connect_timeout_secs = seconds;
        self
    }

    /// Dial timeout as a [`Duration`].
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// URL scheme used for dialing.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        if self.use_ssl {
            "ldaps"
        } else {
            "ldap"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const SAMPLE: &str = r#"
[server]
port = 8080
debug = true
allowed_sources = ["127.0.0.1", "10.0.0.5"]

[directory]
hosts = ["dc1.example.com", "dc2.example.com"]
bind_dn = "cn=svc-query,ou=Service,dc=example,dc=com"
bind_password = "hunter2"
start_tls = true
"#;

    #[test]
    fn parses_toml_with_defaults() {
        let config = GatewayConfig::from_toml_str(SAMPLE).unwrap();
        config.check().unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.server.debug);
        assert_eq!(config.server.listen_address, "0.0.0.0");
        assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.directory.hosts.len(), 2);
        assert_eq!(config.directory.port, DEFAULT_DIRECTORY_PORT);
        assert_eq!(config.directory.bind_password.expose_secret(), "hunter2");
        assert!(config.directory.start_tls);
        assert!(!config.directory.use_ssl);
        assert_eq!(config.directory.scheme(), "ldap");
        assert_eq!(config.directory.connect_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn debug_output_redacts_password() {
        let config = GatewayConfig::from_toml_str(SAMPLE).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn rejects_empty_hosts_and_sources() {
        let config = GatewayConfig {
            server: ServerConfig::new(Vec::new()),
            directory: DirectoryConfig::new(Vec::new(), "cn=admin,dc=example,dc=com", "secret"),
        };

        let err = config.check().unwrap_err();
        let Error::ConfigError(message) = err else {
            panic!("expected config error");
        };
        assert!(message.contains("hosts"));
        assert!(message.contains("allowed_sources"));
    }

    #[test]
    fn rejects_missing_bind_password() {
        let err = GatewayConfig::from_toml_str(
            r#"
[server]
allowed_sources = ["127.0.0.1"]

[directory]
hosts = ["dc1"]
bind_dn = "cn=admin"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn builder_overrides() {
        let config = DirectoryConfig::new(vec!["dc1".to_string()], "cn=admin", "secret")
            .with_port(636)
            .with_ssl(true)
            .with_start_tls(true)
            .with_ssl_skip_verify(true)
            .with_connect_timeout_secs(3);

        assert_eq!(config.port, 636);
        assert!(config.start_tls);
        assert_eq!(config.scheme(), "ldaps");
        assert!(config.ssl_skip_verify);
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn server_builder_overrides() {
        let server = ServerConfig::new(vec!["127.0.0.1".to_string()])
            .with_port(8443)
            .with_debug(true);

        assert!(server.debug);
        assert_eq!(server.bind_address(), "0.0.0.0:8443");
        assert!(server.validate().is_ok());
    }
}
