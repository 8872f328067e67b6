//! WS-Discovery `Probe` message.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use crate::domain::DiscoveryRequest;
use crate::soap::collapse_whitespace;

/// Well-known WS-Discovery multicast group and port.
pub const MULTICAST_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(239, 255, 255, 250), 3702));

pub const PROBE_ACTION: &str = "http://schemas.xmlsoap.org/ws/2005/04/discovery/Probe";
pub const DISCOVERY_TO: &str = "urn:schemas-xmlsoap-org:ws:2005:04:discovery";

/// Device class probed for by default (ONVIF cameras and encoders).
pub const NETWORK_VIDEO_TRANSMITTER: &str = "dn:NetworkVideoTransmitter";

/// Renders the probe datagram for `request`.
///
/// `types` goes into `d:Types` verbatim; the `dn:` prefix is bound to the
/// ONVIF network WSDL namespace.
pub fn build_probe(request: &DiscoveryRequest, types: &str) -> String {
    let probe = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<e:Envelope
    xmlns:e="http://www.w3.org/2003/05/soap-envelope"
    xmlns:w="http://schemas.xmlsoap.org/ws/2004/08/addressing"
    xmlns:d="http://schemas.xmlsoap.org/ws/2005/04/discovery"
    xmlns:dn="http://www.onvif.org/ver10/network/wsdl">
    <e:Header>
        <w:MessageID>{message_id}</w:MessageID>
        <w:To e:mustUnderstand="true">{DISCOVERY_TO}</w:To>
        <w:Action e:mustUnderstand="true">{PROBE_ACTION}</w:Action>
    </e:Header>
    <e:Body>
        <d:Probe>
            <d:Types>{types}</d:Types>
        </d:Probe>
    </e:Body>
</e:Envelope>"#,
        message_id = quick_xml::escape::escape(request.message_id()),
        types = quick_xml::escape::escape(types),
    );
    collapse_whitespace(&probe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParsedEnvelope;
    use crate::security::{Entropy, TokenGenerationError};

    struct Fixed;

    impl Entropy for Fixed {
        fn fill_nonce(&self, _buf: &mut [u8]) -> Result<(), TokenGenerationError> {
            Ok(())
        }
        fn message_id(&self) -> String {
            "uuid:abc".to_string()
        }
    }

    #[test]
    fn test_probe_carries_message_id_action_and_types() {
        // Arrange
        let request = DiscoveryRequest::new(&Fixed);

        // Act
        let probe = build_probe(&request, NETWORK_VIDEO_TRANSMITTER);
        let doc = ParsedEnvelope::parse(probe.as_bytes()).expect("probe must be well-formed");

        // Assert
        assert_eq!(doc.value_for_path("Envelope.Header.MessageID"), Some("uuid:abc"));
        assert_eq!(doc.value_for_path("Envelope.Header.Action"), Some(PROBE_ACTION));
        assert_eq!(doc.value_for_path("Envelope.Header.To"), Some(DISCOVERY_TO));
        assert_eq!(
            doc.value_for_path("Envelope.Body.Probe.Types"),
            Some("dn:NetworkVideoTransmitter")
        );
    }

    #[test]
    fn test_probe_has_no_inter_element_whitespace() {
        let probe = build_probe(&DiscoveryRequest::new(&Fixed), NETWORK_VIDEO_TRANSMITTER);
        assert!(!probe.contains('\n'));
        assert!(!probe.contains(">  <") && !probe.contains("> <"));
    }

    #[test]
    fn test_multicast_address_is_ws_discovery_group() {
        assert_eq!(MULTICAST_ADDR.to_string(), "239.255.255.250:3702");
    }
}
