//! Response correlator: turns a `ProbeMatches` datagram into a [`Device`].
//!
//! A response belongs to our probe only if its `RelatesTo` header equals the
//! probe's `MessageID`.  Other sessions sharing the multicast group produce
//! responses that fail this check; those surface as
//! [`CorrelationError::Unrelated`] and are expected to be filtered by the
//! caller, not reported.
//!
//! Field extraction:
//!
//! | Field           | Path (under `Envelope.Body.ProbeMatches.ProbeMatch`) | Processing                         |
//! |-----------------|------------------------------------------------------|------------------------------------|
//! | ID              | `EndpointReference.Address`                          | strip `urn:uuid:`                  |
//! | Name            | `Scopes`                                             | `.../name/<X>` scope, `_` -> space |
//! | ServiceAddress  | `XAddrs`                                             | first whitespace-separated URL     |

use thiserror::Error;

use crate::domain::{Device, ParsedEnvelope, XmlError};

pub const ENDPOINT_PREFIX: &str = "urn:uuid:";
pub const NAME_SCOPE_PREFIX: &str = "onvif://www.onvif.org/name/";

const RELATES_TO_PATH: &str = "Envelope.Header.RelatesTo";
const PROBE_MATCH_PATH: &str = "Envelope.Body.ProbeMatches.ProbeMatch";

/// Why a datagram did not yield a device.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CorrelationError {
    /// The datagram is not a decodable XML document.
    #[error("malformed discovery response: {0}")]
    Malformed(#[from] XmlError),

    /// The response answers some other probe.
    #[error("response relates to {actual:?}, expected {expected}")]
    Unrelated {
        expected: String,
        actual: Option<String>,
    },

    /// A required field is absent or empty.
    #[error("discovery response is missing {0}")]
    MissingField(&'static str),

    /// The device advertised no service address.
    #[error("device {id} advertised no service address")]
    NoServiceAddress { id: String },
}

/// Parses one discovery response and checks it against `expected_message_id`.
///
/// # Errors
///
/// See [`CorrelationError`].  Only `Unrelated` is routine.
pub fn parse_probe_match(expected_message_id: &str, raw: &[u8]) -> Result<Device, CorrelationError> {
    let envelope = ParsedEnvelope::parse(raw)?;

    let relates_to = envelope.value_for_path(RELATES_TO_PATH);
    if relates_to != Some(expected_message_id) {
        return Err(CorrelationError::Unrelated {
            expected: expected_message_id.to_string(),
            actual: relates_to.map(str::to_string),
        });
    }

    let field = |name: &str| {
        envelope
            .value_for_path(&format!("{PROBE_MATCH_PATH}.{name}"))
            .unwrap_or_default()
    };

    let address = field("EndpointReference.Address");
    let id = address.strip_prefix(ENDPOINT_PREFIX).unwrap_or(address);
    if id.is_empty() {
        return Err(CorrelationError::MissingField("EndpointReference/Address"));
    }

    let name = device_name(field("Scopes")).unwrap_or_default();

    let service_address = field("XAddrs")
        .split_whitespace()
        .next()
        .ok_or_else(|| CorrelationError::NoServiceAddress { id: id.to_string() })?;

    Ok(Device::new(id, name, service_address))
}

/// Extracts the display name from a space-separated scope list.
fn device_name(scopes: &str) -> Option<String> {
    scopes
        .split_whitespace()
        .find_map(|scope| scope.strip_prefix(NAME_SCOPE_PREFIX))
        .map(|name| name.replace('_', " "))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
