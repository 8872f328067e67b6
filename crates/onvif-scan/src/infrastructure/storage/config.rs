//! TOML configuration file for `onvif-scan`.
//!
//! Every field is optional; a missing table or key takes its default.
//!
//! ```toml
//! [discovery]
//! duration_ms = 3000
//! multicast_addr = "239.255.255.250:3702"
//! probe_types = "dn:NetworkVideoTransmitter"
//! recv_buffer_size = 10240
//! on_malformed = "abort"          # or "skip"
//!
//! [transport]
//! timeout_ms = 5000
//! http_basic_auth = true
//! ws_security = true
//!
//! [credentials]
//! username = "admin"
//! password = "secret"
//! token_offset_secs = 0
//! ```
//!
//! Command-line flags are applied on top of the loaded values by the binary.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use onvif_core::discovery::{
    DiscoveryConfig, MalformedResponsePolicy, DEFAULT_RECV_BUFFER_SIZE, MULTICAST_ADDR,
    NETWORK_VIDEO_TRANSMITTER,
};
use onvif_core::soap::TransportConfig;
use serde::Deserialize;
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScanConfig {
    #[serde(default)]
    pub discovery: DiscoverySection,
    #[serde(default)]
    pub transport: TransportSection,
    #[serde(default)]
    pub credentials: CredentialsSection,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DiscoverySection {
    /// How long to collect answers.
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    #[serde(default = "default_multicast_addr")]
    pub multicast_addr: SocketAddr,
    #[serde(default = "default_probe_types")]
    pub probe_types: String,
    #[serde(default = "default_recv_buffer_size")]
    pub recv_buffer_size: usize,
    #[serde(default)]
    pub on_malformed: MalformedResponsePolicy,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TransportSection {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_true")]
    pub http_basic_auth: bool,
    #[serde(default = "default_true")]
    pub ws_security: bool,
}

/// Device credentials.  An empty username means unauthenticated requests.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CredentialsSection {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Seconds added to the local clock when dating tokens.  May be negative.
    #[serde(default)]
    pub token_offset_secs: i64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_duration_ms() -> u64 {
    3000
}
fn default_multicast_addr() -> SocketAddr {
    MULTICAST_ADDR
}
fn default_probe_types() -> String {
    NETWORK_VIDEO_TRANSMITTER.to_string()
}
fn default_recv_buffer_size() -> usize {
    DEFAULT_RECV_BUFFER_SIZE
}
fn default_timeout_ms() -> u64 {
    5000
}
fn default_true() -> bool {
    true
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            multicast_addr: default_multicast_addr(),
            probe_types: default_probe_types(),
            recv_buffer_size: default_recv_buffer_size(),
            on_malformed: MalformedResponsePolicy::default(),
        }
    }
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            http_basic_auth: default_true(),
            ws_security: default_true(),
        }
    }
}

// ── Conversion into core settings ─────────────────────────────────────────────

impl DiscoverySection {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn to_discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            multicast_addr: self.multicast_addr,
            probe_types: self.probe_types.clone(),
            recv_buffer_size: self.recv_buffer_size,
            on_malformed: self.on_malformed,
        }
    }
}

impl TransportSection {
    pub fn to_transport_config(&self) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_millis(self.timeout_ms),
            http_basic_auth: self.http_basic_auth,
            ws_security: self.ws_security,
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses a configuration document.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys, and
/// [`ConfigError::Invalid`] for out-of-range values.
pub fn parse_config(content: &str) -> Result<ScanConfig, ConfigError> {
    let config: ScanConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

impl ScanConfig {
    /// Checks values the schema alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discovery.recv_buffer_size == 0 {
            return Err(ConfigError::Invalid {
                field: "discovery.recv_buffer_size",
                reason: "must be at least 1 byte",
            });
        }
        Ok(())
    }
}

/// Loads the configuration from `path`, or returns defaults when no path is
/// given.
///
/// An explicitly named file must exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, and otherwise
/// whatever [`parse_config`] returns for its content.
pub fn load_config(path: Option<&Path>) -> Result<ScanConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(ScanConfig::default());
    };
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_defaults_match_core_defaults() {
        // Arrange / Act
        let cfg = ScanConfig::default();

        // Assert
        assert_eq!(cfg.discovery.to_discovery_config(), DiscoveryConfig::default());
        assert_eq!(cfg.transport.to_transport_config(), TransportConfig::default());
        assert_eq!(cfg.discovery.duration(), Duration::from_secs(3));
        assert!(cfg.credentials.username.is_empty());
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        assert_eq!(parse_config("").unwrap(), ScanConfig::default());
    }

    #[test]
    fn test_partial_tables_keep_remaining_defaults() {
        // Arrange
        let doc = r#"
            [discovery]
            on_malformed = "skip"

            [transport]
            ws_security = false

            [credentials]
            username = "admin"
            token_offset_secs = -30
        "#;

        // Act
        let cfg = parse_config(doc).unwrap();

        // Assert
        assert_eq!(cfg.discovery.on_malformed, MalformedResponsePolicy::Skip);
        assert_eq!(cfg.discovery.multicast_addr, MULTICAST_ADDR);
        assert!(!cfg.transport.ws_security);
        assert!(cfg.transport.http_basic_auth);
        assert_eq!(cfg.transport.timeout_ms, 5000);
        assert_eq!(cfg.credentials.username, "admin");
        assert_eq!(cfg.credentials.password, "");
        assert_eq!(cfg.credentials.token_offset_secs, -30);
    }

    #[test]
    fn test_custom_values_flow_into_core_configs() {
        let doc = r#"
            [discovery]
            multicast_addr = "127.0.0.1:3702"
            recv_buffer_size = 4096
            probe_types = "tds:Device"

            [transport]
            timeout_ms = 1500
        "#;

        let cfg = parse_config(doc).unwrap();
        let discovery = cfg.discovery.to_discovery_config();
        let transport = cfg.transport.to_transport_config();

        assert_eq!(discovery.multicast_addr.to_string(), "127.0.0.1:3702");
        assert_eq!(discovery.recv_buffer_size, 4096);
        assert_eq!(discovery.probe_types, "tds:Device");
        assert_eq!(transport.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = parse_config("[transport]\ntimeout = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_invalid_policy_is_rejected() {
        assert!(parse_config("[discovery]\non_malformed = \"ignore\"\n").is_err());
    }

    #[test]
    fn test_zero_receive_buffer_is_rejected() {
        // Arrange
        let doc = "[discovery]\nrecv_buffer_size = 0\n";

        // Act
        let err = parse_config(doc).unwrap_err();

        // Assert
        assert!(
            matches!(
                err,
                ConfigError::Invalid {
                    field: "discovery.recv_buffer_size",
                    ..
                }
            ),
            "got {err:?}"
        );
    }

    #[test]
    fn test_load_without_path_returns_defaults() {
        assert_eq!(load_config(None).unwrap(), ScanConfig::default());
    }

    #[test]
    fn test_load_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("onvif_scan_missing_{}.toml", Uuid::new_v4()));
        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_reads_file_from_disk() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("onvif_scan_test_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scan.toml");
        std::fs::write(&path, "[discovery]\nduration_ms = 750\n").unwrap();

        // Act
        let cfg = load_config(Some(&path)).unwrap();

        // Assert
        assert_eq!(cfg.discovery.duration(), Duration::from_millis(750));

        // Cleanup
        let _ = std::fs::remove_dir_all(&dir);
    }
}
