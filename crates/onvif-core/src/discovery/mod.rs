//! WS-Discovery over UDP multicast.
//!
//! # Sub-modules
//!
//! - **`probe`** – Renders the `Probe` datagram for one discovery request.
//!
//! - **`correlator`** – Decodes a `ProbeMatches` response, checks that it
//!   answers our probe, and extracts the device fields.
//!
//! - **`interfaces`** – Chooses the local IPv4 addresses to probe from.
//!
//! - **`engine`** – Runs one session per address until the deadline and
//!   merges the devices found.

pub mod correlator;
pub mod engine;
pub mod interfaces;
pub mod probe;

pub use correlator::{parse_probe_match, CorrelationError};
pub use engine::{
    Discovery, DiscoveryConfig, DiscoveryError, MalformedResponsePolicy, DEFAULT_RECV_BUFFER_SIZE,
};
pub use interfaces::{eligible_addresses, InterfaceSource, SystemInterfaces};
pub use probe::{build_probe, MULTICAST_ADDR, NETWORK_VIDEO_TRANSMITTER};
