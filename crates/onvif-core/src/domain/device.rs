//! Identity records produced by discovery.

use serde::Serialize;

use crate::security::Entropy;

/// A network video device that answered a WS-Discovery probe.
///
/// Only the response correlator creates devices from the wire; the value is
/// immutable afterwards and owned by whoever called `discover`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Device {
    id: String,
    name: String,
    service_address: String,
}

impl Device {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        service_address: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            service_address: service_address.into(),
        }
    }

    /// Stable endpoint identifier, usually a UUID without the `urn:uuid:` prefix.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name taken from the `name` scope.  Empty when the device
    /// advertises none.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URL for SOAP requests (the first advertised XAddr).
    pub fn service_address(&self) -> &str {
        &self.service_address
    }
}

/// One outstanding probe: the message ID responses must echo in `RelatesTo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRequest {
    message_id: String,
}

impl DiscoveryRequest {
    /// Creates a request with a fresh message ID drawn from `entropy`.
    pub fn new(entropy: &dyn Entropy) -> Self {
        Self {
            message_id: entropy.message_id(),
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::OsEntropy;

    #[test]
    fn test_device_accessors_return_constructor_values() {
        let d = Device::new("dev1", "Front Door", "http://10.0.0.5/onvif/device_service");
        assert_eq!(d.id(), "dev1");
        assert_eq!(d.name(), "Front Door");
        assert_eq!(d.service_address(), "http://10.0.0.5/onvif/device_service");
    }

    #[test]
    fn test_discovery_requests_get_distinct_message_ids() {
        let a = DiscoveryRequest::new(&OsEntropy);
        let b = DiscoveryRequest::new(&OsEntropy);
        assert_ne!(a.message_id(), b.message_id());
    }
}
