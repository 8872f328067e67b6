//! Application layer: the operations `onvif-scan` exposes.
//!
//! - **`discover`** – runs the discovery engine and renders the device list.
//! - **`device_info`** – `GetDeviceInformation` request and response binding.

pub mod device_info;
pub mod discover;

pub use device_info::{get_device_information, Credentials, DeviceInfoError, DeviceInformation};
pub use discover::{discover_devices, render_json, render_table};
