//! Command-line arguments and config loading.
//!
//! A TOML config file supplies the base values; every flag that is given overrides the matching
//! file value. Without a config file the required flags must all be present.

use clap::Parser;
use ldapquery_core::config::{DirectoryConfig, GatewayConfig, ServerConfig};
use ldapquery_core::error::{Error, Result};
use secrecy::SecretString;
use std::path::PathBuf;

/// HTTP gateway for LDAP directory searches.
#[derive(Debug, Parser)]
#[command(name = "ldap-queryd", version, about)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "LDAPQUERY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to listen for requests on
    #[arg(long, env = "LDAPQUERY_PORT")]
    pub port: Option<u16>,

    /// Enable debug logging
    #[arg(long, env = "LDAPQUERY_DEBUG")]
    pub debug: bool,

    /// IPs of sources allowed to make queries (comma separated)
    #[arg(long, env = "LDAPQUERY_ALLOWED_SOURCES", value_delimiter = ',')]
    pub allowed_sources: Vec<String>,

    /// LDAP hosts to query (comma separated)
    #[arg(long, env = "LDAPQUERY_DIRECTORY_HOSTS", value_delimiter = ',')]
    pub directory_hosts: Vec<String>,

    /// LDAP port shared by every host
    #[arg(long, env = "LDAPQUERY_DIRECTORY_PORT")]
    pub directory_port: Option<u16>,

    /// DN of the account used to bind to the directory
    #[arg(long, env = "LDAPQUERY_DIRECTORY_BIND_DN")]
    pub directory_bind_dn: Option<String>,

    /// Password of the account used to bind to the directory
    #[arg(long, env = "LDAPQUERY_DIRECTORY_BIND_PW", hide_env_values = true)]
    pub directory_bind_pw: Option<String>,

    /// Dial the directory over LDAPS
    #[arg(long)]
    pub directory_use_ssl: bool,

    /// Upgrade directory connections with StartTLS
    #[arg(long)]
    pub directory_start_tls: bool,

    /// Skip directory certificate verification
    #[arg(long)]
    pub directory_ssl_skip_verify: bool,
}

impl Cli {
    /// Builds the gateway configuration from the config file (if any) and the flags.
    ///
    /// The result is not validated; call [`GatewayConfig::check`] on it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the config file cannot be loaded, or, when no config
    /// file is given, naming every missing required flag.
    pub fn into_config(self) -> Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => GatewayConfig::load(path)?,
            None => self.config_from_flags()?,
        };

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.debug {
            config.server.debug = true;
        }
        if !self.allowed_sources.is_empty() {
            config.server.allowed_sources = trimmed(self.allowed_sources);
        }
        if !self.directory_hosts.is_empty() {
            config.directory.hosts = trimmed(self.directory_hosts);
        }
        if let Some(port) = self.directory_port {
            config.directory.port = port;
        }
        if let Some(bind_dn) = self.directory_bind_dn {
            config.directory.bind_dn = bind_dn;
        }
        if let Some(password) = self.directory_bind_pw {
            config.directory.bind_password = SecretString::from(password);
        }
        if self.directory_use_ssl {
            config.directory.use_ssl = true;
        }
        if self.directory_start_tls {
            config.directory.start_tls = true;
        }
        if self.directory_ssl_skip_verify {
            config.directory.ssl_skip_verify = true;
        }

        Ok(config)
    }

    fn config_from_flags(&self) -> Result<GatewayConfig> {
        let mut missing = Vec::new();
        if self.allowed_sources.is_empty() {
            missing.push("--allowed-sources");
        }
        if self.directory_hosts.is_empty() {
            missing.push("--directory-hosts");
        }
        if matches!(self.directory_bind_dn.as_deref(), None | Some("")) {
            missing.push("--directory-bind-dn");
        }
        if matches!(self.directory_bind_pw.as_deref(), None | Some("")) {
            missing.push("--directory-bind-pw");
        }
        if !missing.is_empty() {
            return Err(Error::ConfigError(format!(
                "missing required flag(s): {}",
                missing.join(", ")
            )));
        }

        // Overrides applied by the caller fill in every value below.
        Ok(GatewayConfig {
            server: ServerConfig::new(Vec::new()),
            directory: DirectoryConfig::new(Vec::new(), String::new(), String::new()),
        })
    }
}

fn trimmed(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}
