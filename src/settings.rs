//! Immutable, validated configuration for the logging backends.
//!
//! All knobs are resolved once, up front, into a plain [`Settings`] value.
//! [`Settings::from_env`] reads the process environment; tests and embedding
//! applications may build the value directly instead. Network-enabled
//! environments derive a [`TransportConfig`] from it via
//! [`Settings::transport_config`].

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::Error;

/// Connection timeout applied when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
/// Default collector port for the TCP/TLS transport.
pub const DEFAULT_TLS_PORT: u16 = 12201;
/// Default collector port for the UDP transport.
pub const DEFAULT_UDP_PORT: u16 = 12202;
/// GELF version tag sent when none is configured.
pub const DEFAULT_GELF_VERSION: &str = "1.1";

const ENV_ENVIRONMENT: &str = "GRAYLOG_ENV";
const ENV_HOST: &str = "GRAYLOG_HOST";
const ENV_TLS_PORT: &str = "GRAYLOG_TLS_PORT";
const ENV_UDP_PORT: &str = "GRAYLOG_UDP_PORT";
const ENV_TRANSPORT: &str = "GRAYLOG_TRANSPORT";
const ENV_SKIP_TLS_VERIFY: &str = "GRAYLOG_SKIP_TLS_VERIFY";
const ENV_TIMEOUT_SECS: &str = "GRAYLOG_TIMEOUT_SECS";
const ENV_GELF_VERSION: &str = "GRAYLOG_VERSION";
const ENV_APP_NAME: &str = "APP_NAME";
const ENV_LOG_HOSTNAME: &str = "LOG_HOSTNAME";
const ENV_HOSTNAME: &str = "HOSTNAME";
const ENV_NO_COLOR: &str = "NO_COLOR";

/// Wire transport used to reach the collector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    /// TCP with a mandatory TLS handshake.
    Tls,
    /// Connectionless datagrams, send-and-forget.
    Udp,
}

impl FromStr for TransportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tls" => Ok(Self::Tls),
            "udp" => Ok(Self::Udp),
            other => Err(Error::ConfigInvalid(format!(
                "unsupported transport kind {other:?} (expected \"tls\" or \"udp\")"
            ))),
        }
    }
}

/// Resolved configuration consumed by initialization.
///
/// A plain value type: construct it, validate it, pass it around. Nothing
/// mutates it after resolution.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Application name stamped into every forwarded entry.
    pub app_name: String,
    /// Raw deployment-environment indicator, if any. Interpreted by
    /// [`Environment::resolve`](crate::env::Environment::resolve).
    pub environment: Option<String>,
    /// Collector address.
    pub host: String,
    /// Collector port for the TLS transport.
    pub tls_port: u16,
    /// Collector port for the UDP transport.
    pub udp_port: u16,
    /// Which transport to construct for network-enabled environments.
    pub transport: TransportKind,
    /// Disable TLS certificate verification. Explicit opt-in; leave off
    /// outside of tests.
    pub skip_tls_verify: bool,
    /// Per-attempt connection timeout.
    pub connect_timeout: Duration,
    /// GELF version tag sent with every message.
    pub gelf_version: String,
    /// Hostname reported in the GELF `host` field.
    pub hostname: String,
    /// Colorize console level names.
    pub colors: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: String::new(),
            environment: None,
            host: String::new(),
            tls_port: DEFAULT_TLS_PORT,
            udp_port: DEFAULT_UDP_PORT,
            transport: TransportKind::Tls,
            skip_tls_verify: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            gelf_version: DEFAULT_GELF_VERSION.to_owned(),
            hostname: "localhost".to_owned(),
            colors: true,
        }
    }
}

impl Settings {
    /// Build settings from the process environment.
    ///
    /// Malformed values are configuration errors; absent values fall back
    /// to the documented defaults. Whether the environment indicator itself
    /// is present is judged later, during environment resolution.
    pub fn from_env() -> Result<Self, Error> {
        let defaults = Self::default();
        Ok(Self {
            app_name: env::var(ENV_APP_NAME).unwrap_or_default(),
            environment: env::var(ENV_ENVIRONMENT).ok().filter(|v| !v.is_empty()),
            host: env::var(ENV_HOST).unwrap_or_default(),
            tls_port: parse_var(ENV_TLS_PORT)?.unwrap_or(defaults.tls_port),
            udp_port: parse_var(ENV_UDP_PORT)?.unwrap_or(defaults.udp_port),
            transport: match env::var(ENV_TRANSPORT) {
                Ok(raw) => raw.parse()?,
                Err(_) => defaults.transport,
            },
            skip_tls_verify: flag_var(ENV_SKIP_TLS_VERIFY),
            connect_timeout: parse_var(ENV_TIMEOUT_SECS)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            gelf_version: env::var(ENV_GELF_VERSION).unwrap_or(defaults.gelf_version),
            hostname: env::var(ENV_LOG_HOSTNAME)
                .or_else(|_| env::var(ENV_HOSTNAME))
                .unwrap_or(defaults.hostname),
            // NO_COLOR only counts when set to a non-empty value.
            colors: env::var_os(ENV_NO_COLOR).is_none_or(|v| v.is_empty()),
        })
    }

    /// Check the fields the network tier depends on.
    ///
    /// Only called for staging and production initializers; console-only
    /// backends have no use for a collector address.
    pub fn validate_for_network(&self) -> Result<(), Error> {
        if self.host.is_empty() {
            return Err(Error::ConfigInvalid(format!(
                "{ENV_HOST} is required for network-enabled environments"
            )));
        }
        if self.app_name.is_empty() {
            return Err(Error::ConfigInvalid(format!(
                "{ENV_APP_NAME} is required for network-enabled environments"
            )));
        }
        Ok(())
    }

    /// Derive the transport configuration for the configured kind.
    pub fn transport_config(&self) -> TransportConfig {
        let port = match self.transport {
            TransportKind::Tls => self.tls_port,
            TransportKind::Udp => self.udp_port,
        };
        TransportConfig {
            kind: self.transport,
            host: self.host.clone(),
            port,
            skip_tls_verify: self.skip_tls_verify,
            connect_timeout: self.connect_timeout,
        }
    }
}

/// Everything the transport constructor needs to reach the collector.
///
/// Owned by the backend selector and passed by value into constructors;
/// never mutated after resolution.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub kind: TransportKind,
    pub host: String,
    pub port: u16,
    pub skip_tls_verify: bool,
    pub connect_timeout: Duration,
}

fn parse_var<T>(name: &str) -> Result<Option<T>, Error>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| Error::ConfigInvalid(format!("{name}={raw:?}: {e}"))),
        Err(_) => Ok(None),
    }
}

fn flag_var(name: &str) -> bool {
    matches!(
        env::var(name).as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("True")
    )
}
