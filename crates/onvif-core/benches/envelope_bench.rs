//! Criterion benchmarks for request building and response decoding.
//!
//! Run with:
//! ```bash
//! cargo bench --package onvif-core --bench envelope_bench
//! ```

use chrono::Duration;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use onvif_core::discovery::parse_probe_match;
use onvif_core::soap::{EnvelopeBuilder, SoapRequest};

const DEVICE_NS: &str = r#"xmlns:tds="http://www.onvif.org/ver10/device/wsdl""#;

const PROBE_MATCH: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://www.w3.org/2003/05/soap-envelope"
    xmlns:wsa="http://schemas.xmlsoap.org/ws/2004/08/addressing"
    xmlns:d="http://schemas.xmlsoap.org/ws/2005/04/discovery">
  <SOAP-ENV:Header>
    <wsa:MessageID>uuid:resp</wsa:MessageID>
    <wsa:RelatesTo>uuid:bench</wsa:RelatesTo>
  </SOAP-ENV:Header>
  <SOAP-ENV:Body>
    <d:ProbeMatches>
      <d:ProbeMatch>
        <wsa:EndpointReference><wsa:Address>urn:uuid:dev1</wsa:Address></wsa:EndpointReference>
        <d:Types>dn:NetworkVideoTransmitter</d:Types>
        <d:Scopes>onvif://www.onvif.org/type/video_encoder onvif://www.onvif.org/name/Front_Door</d:Scopes>
        <d:XAddrs>http://10.0.0.5/onvif/device_service</d:XAddrs>
        <d:MetadataVersion>1</d:MetadataVersion>
      </d:ProbeMatch>
    </d:ProbeMatches>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

fn bench_build(c: &mut Criterion) {
    let builder = EnvelopeBuilder::new();
    let plain = SoapRequest::new("<tds:GetDeviceInformation/>", [DEVICE_NS]);
    let signed = plain
        .clone()
        .with_credentials("admin", "password", Duration::zero());

    let mut group = c.benchmark_group("envelope_build");
    group.bench_function("unauthenticated", |b| {
        b.iter(|| builder.build(black_box(&plain)))
    });
    group.bench_function("ws_security", |b| {
        b.iter(|| builder.build(black_box(&signed)))
    });
    group.finish();
}

fn bench_parse_probe_match(c: &mut Criterion) {
    c.bench_function("parse_probe_match", |b| {
        b.iter(|| parse_probe_match(black_box("uuid:bench"), black_box(PROBE_MATCH.as_bytes())))
    });
}

criterion_group!(benches, bench_build, bench_parse_probe_match);
criterion_main!(benches);
