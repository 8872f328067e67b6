//! Domain types shared by both protocol engines.
//!
//! Nothing in here performs I/O: [`Device`] and [`DiscoveryRequest`] are plain
//! values, and [`ParsedEnvelope`] is a decoded XML tree queried by path.

pub mod device;
pub mod envelope;

pub use device::{Device, DiscoveryRequest};
pub use envelope::{ParsedEnvelope, XmlElement, XmlError};
