//! SOAP-over-HTTP request protocol.
//!
//! # Sub-modules
//!
//! - **`envelope`** – Builds the request document from a body fragment, the
//!   caller's namespace declarations, and (for authenticated requests) a
//!   WS-Security header.  Pure: no I/O.
//!
//! - **`transport`** – POSTs the document to a device service address and
//!   classifies the answer as success, SOAP fault, timeout, or transport error.

pub mod envelope;
pub mod transport;

pub use envelope::{collapse_whitespace, EnvelopeBuilder, SoapRequest, SOAP_ENV_NS};
pub use transport::{SoapClient, SoapError, SoapErrorKind, TransportConfig, FAULT_REASON_PATH};
