//! `GetDeviceInformation` binding for the device management service.
//!
//! Builds the request body and reads the five identity fields from the
//! response by path.  Absent fields come back empty; only a response with no
//! `GetDeviceInformationResponse` element at all is rejected.

use chrono::Duration as ChronoDuration;
use onvif_core::soap::{SoapClient, SoapError, SoapRequest};
use onvif_core::ParsedEnvelope;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Device management service WSDL namespace.
pub const DEVICE_WSDL_NS: &str = "http://www.onvif.org/ver10/device/wsdl";

const RESPONSE_PATH: &str = "Envelope.Body.GetDeviceInformationResponse";

#[derive(Debug, Error)]
pub enum DeviceInfoError {
    #[error(transparent)]
    Soap(#[from] SoapError),

    #[error("response from {address} has no GetDeviceInformationResponse")]
    MissingResponse { address: String },
}

/// Identity of a device as reported by `GetDeviceInformation`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInformation {
    pub manufacturer: String,
    pub model: String,
    pub firmware_version: String,
    pub serial_number: String,
    pub hardware_id: String,
}

impl DeviceInformation {
    /// Reads the fields from a decoded response, or `None` if the envelope is
    /// not a `GetDeviceInformationResponse`.
    pub fn from_envelope(envelope: &ParsedEnvelope) -> Option<Self> {
        let response = envelope.find(RESPONSE_PATH)?;
        let field = |name: &str| {
            response
                .child(name)
                .map(|e| e.text.clone())
                .unwrap_or_default()
        };
        Some(Self {
            manufacturer: field("Manufacturer"),
            model: field("Model"),
            firmware_version: field("FirmwareVersion"),
            serial_number: field("SerialNumber"),
            hardware_id: field("HardwareId"),
        })
    }
}

/// Username, password and token clock offset for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub token_offset: ChronoDuration,
}

/// Request for `GetDeviceInformation`, authenticated when `credentials` has a
/// username.
pub fn device_information_request(credentials: Option<&Credentials>) -> SoapRequest {
    let request = SoapRequest::new(
        "<tds:GetDeviceInformation/>",
        [format!(r#"xmlns:tds="{DEVICE_WSDL_NS}""#)],
    );
    match credentials {
        Some(c) => request.with_credentials(&c.username, &c.password, c.token_offset),
        None => request,
    }
}

/// Queries `address` for its identity.
///
/// # Errors
///
/// Returns [`DeviceInfoError::Soap`] for any transport outcome other than
/// success, and [`DeviceInfoError::MissingResponse`] if the answer is not a
/// `GetDeviceInformationResponse`.
pub async fn get_device_information(
    client: &SoapClient,
    address: &str,
    credentials: Option<&Credentials>,
) -> Result<DeviceInformation, DeviceInfoError> {
    let request = device_information_request(credentials);
    let envelope = client.send_request(address, &request).await?;
    let info = DeviceInformation::from_envelope(&envelope).ok_or_else(|| {
        DeviceInfoError::MissingResponse {
            address: address.to_string(),
        }
    })?;
    debug!("{address}: {} {}", info.manufacturer, info.model);
    Ok(info)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
