//! # onvif-core
//!
//! Client-side protocol core for ONVIF network video devices.
//!
//! Two protocols are covered:
//!
//! - **`discovery`** – WS-Discovery.  A `Probe` is multicast from every usable
//!   local IPv4 address; `ProbeMatches` answers that relate to our probe are
//!   turned into [`Device`] values until a deadline.
//!
//! - **`soap`** – SOAP 1.2 over HTTP.  A caller-supplied body is wrapped in an
//!   envelope, optionally signed with a WS-Security `UsernameToken`, POSTed to
//!   the device, and the answer is returned as a [`ParsedEnvelope`] or a
//!   classified [`SoapError`].
//!
//! Supporting modules:
//!
//! - **`security`** – password digest token and the randomness/clock
//!   capabilities it draws from.
//! - **`domain`** – `Device`, `DiscoveryRequest`, and the generic XML tree used
//!   to read every response.
//!
//! Typed operation bindings (media, PTZ, ...) are not part of this crate;
//! callers supply body fragments and read answers by path.

pub mod discovery;
pub mod domain;
pub mod security;
pub mod soap;

pub use discovery::{
    parse_probe_match, CorrelationError, Discovery, DiscoveryConfig, DiscoveryError,
    MalformedResponsePolicy,
};
pub use domain::{Device, DiscoveryRequest, ParsedEnvelope, XmlElement, XmlError};
pub use security::{SecurityToken, TokenGenerationError};
pub use soap::{EnvelopeBuilder, SoapClient, SoapError, SoapErrorKind, SoapRequest, TransportConfig};
