//! onvif-scan entry point.
//!
//! Finds ONVIF devices on the local network and queries their identity.
//!
//! # Usage
//!
//! ```text
//! onvif-scan [--config PATH] [--verbose] discover [--duration-ms N] [--json]
//! onvif-scan [--config PATH] [--verbose] device-info --address URL
//!            [--username U] [--password P] [--token-offset-secs S]
//!            [--no-basic-auth] [--no-ws-security] [--json]
//! ```
//!
//! Settings come from the TOML file given with `--config` (see
//! `infrastructure::storage::config`), then flags override individual values.
//! Logs go to stderr; results go to stdout.
//!
//! | Variable             | Description                         |
//! |----------------------|-------------------------------------|
//! | `RUST_LOG`           | Log filter (default `info`)         |
//! | `ONVIF_SCAN_CONFIG`  | Same as `--config`                  |
//! | `ONVIF_PASSWORD`     | Same as `--password`                |

use std::path::PathBuf;

use anyhow::Context;
use chrono::Duration as ChronoDuration;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use onvif_core::discovery::Discovery;
use onvif_core::soap::SoapClient;
use onvif_scan::application::{
    discover_devices, get_device_information, render_json, render_table, Credentials,
};
use onvif_scan::infrastructure::storage::{load_config, ScanConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "onvif-scan",
    about = "Discover ONVIF devices and query their identity",
    version
)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, env = "ONVIF_SCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level regardless of RUST_LOG.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Multicast a WS-Discovery probe and list the devices that answer.
    Discover {
        /// How long to collect answers, in milliseconds.
        #[arg(long)]
        duration_ms: Option<u64>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Call GetDeviceInformation on one device.
    DeviceInfo {
        /// Device service address, e.g. http://10.0.0.5/onvif/device_service.
        #[arg(long)]
        address: String,

        #[arg(long)]
        username: Option<String>,

        #[arg(long, env = "ONVIF_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Seconds added to the local clock when dating the security token.
        #[arg(long, allow_negative_numbers = true)]
        token_offset_secs: Option<i64>,

        /// Do not send HTTP basic credentials.
        #[arg(long)]
        no_basic_auth: bool,

        /// Do not add the WS-Security header.
        #[arg(long)]
        no_ws_security: bool,

        /// Print JSON instead of key/value lines.
        #[arg(long)]
        json: bool,
    },
}

impl Command {
    /// Writes flag values over the file configuration.
    fn apply_overrides(&self, config: &mut ScanConfig) {
        match self {
            Command::Discover { duration_ms, .. } => {
                if let Some(ms) = duration_ms {
                    config.discovery.duration_ms = *ms;
                }
            }
            Command::DeviceInfo {
                username,
                password,
                token_offset_secs,
                no_basic_auth,
                no_ws_security,
                ..
            } => {
                if let Some(username) = username {
                    config.credentials.username = username.clone();
                }
                if let Some(password) = password {
                    config.credentials.password = password.clone();
                }
                if let Some(secs) = token_offset_secs {
                    config.credentials.token_offset_secs = *secs;
                }
                if *no_basic_auth {
                    config.transport.http_basic_auth = false;
                }
                if *no_ws_security {
                    config.transport.ws_security = false;
                }
            }
        }
    }
}

/// Credentials from the effective configuration, or `None` without a username.
fn credentials(config: &ScanConfig) -> Option<Credentials> {
    let c = &config.credentials;
    if c.username.is_empty() {
        return None;
    }
    Some(Credentials {
        username: c.username.clone(),
        password: c.password.clone(),
        token_offset: ChronoDuration::seconds(c.token_offset_secs),
    })
}

/// Resolves on Ctrl+C; never resolves if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl+C signal: {e}");
        std::future::pending::<()>().await;
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = load_config(cli.config.as_deref()).with_context(|| {
        format!(
            "failed to load configuration{}",
            cli.config
                .as_ref()
                .map(|p| format!(" from {}", p.display()))
                .unwrap_or_default()
        )
    })?;
    cli.command.apply_overrides(&mut config);

    match &cli.command {
        Command::Discover { json, .. } => {
            let discovery = Discovery::new(config.discovery.to_discovery_config());
            let devices = discover_devices(&discovery, config.discovery.duration(), ctrl_c())
                .await
                .context("discovery failed")?;
            if *json {
                println!("{}", render_json(&devices)?);
            } else {
                print!("{}", render_table(&devices));
            }
        }
        Command::DeviceInfo { address, json, .. } => {
            let client = SoapClient::new(config.transport.to_transport_config())
                .context("failed to create SOAP client")?;
            let credentials = credentials(&config);
            info!(
                "querying {address} ({})",
                if credentials.is_some() {
                    "authenticated"
                } else {
                    "anonymous"
                }
            );
            let device = get_device_information(&client, address, credentials.as_ref())
                .await
                .with_context(|| format!("GetDeviceInformation on {address} failed"))?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&device)?);
            } else {
                println!("Manufacturer:     {}", device.manufacturer);
                println!("Model:            {}", device.model);
                println!("Firmware version: {}", device.firmware_version);
                println!("Serial number:    {}", device.serial_number);
                println!("Hardware ID:      {}", device.hardware_id);
            }
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_parses_with_defaults() {
        // Arrange / Act
        let cli = Cli::parse_from(["onvif-scan", "discover"]);

        // Assert
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
        assert!(matches!(
            cli.command,
            Command::Discover {
                duration_ms: None,
                json: false
            }
        ));
    }

    #[test]
    fn test_global_flags_are_accepted_after_subcommand() {
        let cli = Cli::parse_from(["onvif-scan", "discover", "--verbose", "--config", "scan.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("scan.toml")));
    }

    #[test]
    fn test_duration_flag_overrides_file_value() {
        // Arrange
        let cli = Cli::parse_from(["onvif-scan", "discover", "--duration-ms", "1200"]);
        let mut config = ScanConfig::default();

        // Act
        cli.command.apply_overrides(&mut config);

        // Assert
        assert_eq!(config.discovery.duration_ms, 1200);
    }

    #[test]
    fn test_device_info_flags_override_credentials_and_transport() {
        // Arrange
        let cli = Cli::parse_from([
            "onvif-scan",
            "device-info",
            "--address",
            "http://10.0.0.5/onvif/device_service",
            "--username",
            "admin",
            "--password",
            "pw",
            "--token-offset-secs",
            "-20",
            "--no-basic-auth",
        ]);
        let mut config = ScanConfig::default();
        config.credentials.username = "from-file".into();

        // Act
        cli.command.apply_overrides(&mut config);

        // Assert
        assert_eq!(config.credentials.username, "admin");
        assert_eq!(config.credentials.password, "pw");
        assert_eq!(config.credentials.token_offset_secs, -20);
        assert!(!config.transport.http_basic_auth);
        assert!(config.transport.ws_security);
    }

    #[test]
    fn test_absent_flags_keep_file_values() {
        let cli = Cli::parse_from(["onvif-scan", "device-info", "--address", "http://cam/x"]);
        let mut config = ScanConfig::default();
        config.credentials.username = "from-file".into();

        cli.command.apply_overrides(&mut config);

        assert_eq!(config.credentials.username, "from-file");
        assert!(config.transport.http_basic_auth);
    }

    #[test]
    fn test_credentials_absent_without_username() {
        let mut config = ScanConfig::default();
        assert_eq!(credentials(&config), None);

        config.credentials.username = "admin".into();
        config.credentials.token_offset_secs = 7;
        let c = credentials(&config).unwrap();
        assert_eq!(c.token_offset, ChronoDuration::seconds(7));
    }

    #[test]
    fn test_device_info_requires_address() {
        assert!(Cli::try_parse_from(["onvif-scan", "device-info"]).is_err());
    }
}
