//! onvif-scan library crate.
//!
//! Command-line front end over `onvif-core`.
//!
//! ```text
//! onvif-scan (main.rs)     clap parsing, logging setup, output
//!   ├── application/       discovery run, GetDeviceInformation binding
//!   └── infrastructure/
//!         └── storage/     TOML configuration file
//! ```
//!
//! Only `Discovery::discover_until` and `SoapClient::send_request` are used
//! from the core; everything ONVIF-operation specific lives here.

/// Application layer: the operations the CLI exposes.
pub mod application;

/// Infrastructure layer: configuration file.
pub mod infrastructure;
