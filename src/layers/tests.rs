use super::transport::{count_options, looks_like_tls};
use super::{DecodeError, DecodeState, LayerType};
use crate::testutil::*;
use tls_parser::{TlsHandshakeType, TlsRecordType, TlsVersion};

use LayerType::*;

fn assert_well_ordered(layers: &[LayerType]) {
    for (idx, layer) in layers.iter().enumerate() {
        let prev = idx.checked_sub(1).map(|p| layers[p]);
        let ok = match layer {
            Ethernet => prev.is_none(),
            IPv4 | IPv6 => prev == Some(Ethernet),
            TCP => matches!(prev, Some(IPv4) | Some(IPv6)),
            TLS => prev == Some(TCP),
            Payload => matches!(prev, Some(TCP) | Some(TLS)),
        };
        assert!(ok, "{layer:?} out of place in {layers:?}");
    }
}

#[test]
fn client_hello_decodes_every_layer() {
    let frame = client_hello_frame();
    let mut state = DecodeState::new();

    state.decode(&frame).expect("decode client hello");

    assert_eq!(state.layers(), &[Ethernet, IPv4, TCP, TLS, Payload]);
    assert_eq!(state.ipv4().source, [10, 0, 0, 5]);
    assert_eq!(state.ipv4().destination, [93, 184, 216, 34]);
    assert_eq!(state.tcp().source_port, 51000);
    assert_eq!(state.tcp().destination_port, 443);
    assert_eq!(state.tcp_option_count(), 5);

    let tls = state.tls();
    assert_eq!(tls.record_type, TlsRecordType::Handshake);
    assert_eq!(tls.version, TlsVersion::Tls10);
    assert_eq!(tls.length, 6);
    assert_eq!(tls.handshake_type, Some(TlsHandshakeType::ClientHello));
    assert!(tls.is_client_hello());
    assert_eq!(tls.version_name(), "TLS 1.0");

    assert_eq!(state.payload(), &CLIENT_HELLO[5..]);
}

#[test]
fn ipv6_client_hello_decodes() {
    let frame = ipv6_client_hello_frame();
    let mut state = DecodeState::new();

    state.decode(&frame).expect("decode ipv6");

    assert_eq!(state.layers(), &[Ethernet, IPv6, TCP, TLS, Payload]);
    assert_eq!(state.ipv6().source, V6_CLIENT);
    assert_eq!(state.ipv6().destination, V6_SERVER);
    assert_eq!(state.tcp().source_port, 40000);
    assert_eq!(state.tcp_option_count(), 1);
}

#[test]
fn empty_segment_ends_at_tcp() {
    let frame = ipv4_tcp_frame([10, 0, 0, 1], [10, 0, 0, 2], 1000, 443, &[], &[]);
    let mut state = DecodeState::new();

    state.decode(&frame).expect("decode bare tcp");

    assert_eq!(state.layers(), &[Ethernet, IPv4, TCP]);
    assert_eq!(state.tcp_option_count(), 0);
}

#[test]
fn non_tls_payload_is_opaque() {
    let body = b"GET / HTTP/1.1\r\n";
    let frame = ipv4_tcp_frame([10, 0, 0, 1], [10, 0, 0, 2], 1000, 80, &[], body);
    let mut state = DecodeState::new();

    state.decode(&frame).expect("decode http");

    assert_eq!(state.layers(), &[Ethernet, IPv4, TCP, Payload]);
    assert_eq!(state.payload(), body);
}

#[test]
fn non_tcp_transport_ends_at_ip() {
    let frame = ipv4_udp_frame(&[1, 2, 3, 4]);
    let mut state = DecodeState::new();

    state.decode(&frame).expect("decode udp");

    assert_eq!(state.layers(), &[Ethernet, IPv4]);
}

#[test]
fn non_ip_ethertype_ends_at_ethernet() {
    let mut state = DecodeState::new();

    state.decode(&arp_frame()).expect("decode arp");

    assert_eq!(state.layers(), &[Ethernet]);
}

#[test]
fn runt_frame_yields_no_layers() {
    let mut state = DecodeState::new();

    state.decode(&[0u8; 10]).expect("runt frames are not errors");

    assert!(state.layers().is_empty());
}

#[test]
fn fragment_stops_after_ipv4() {
    let mut frame = client_hello_frame();
    // more-fragments flag
    frame[14 + 6] |= 0x20;
    let mut state = DecodeState::new();

    state.decode(&frame).expect("decode fragment");

    assert_eq!(state.layers(), &[Ethernet, IPv4]);
}

#[test]
fn truncated_tcp_header_is_not_an_error() {
    let mut frame = client_hello_frame();
    frame.truncate(IPV4_TCP_OFFSET + 10);
    let mut state = DecodeState::new();

    state.decode(&frame).expect("truncation is graceful");

    assert_eq!(state.layers(), &[Ethernet, IPv4]);
}

#[test]
fn bad_ip_version_is_a_decode_error() {
    let mut frame = client_hello_frame();
    frame[14] = 0x65;
    let mut state = DecodeState::new();

    let err = state.decode(&frame).expect_err("version 6 inside an IPv4 ethertype");

    assert!(matches!(err, DecodeError::Ipv4(_)));
    assert_eq!(state.layers(), &[Ethernet]);
}

#[test]
fn short_tcp_data_offset_is_a_decode_error() {
    let mut frame = client_hello_frame();
    frame[IPV4_TCP_OFFSET + 12] = 0x40;
    let mut state = DecodeState::new();

    let err = state.decode(&frame).expect_err("data offset 4");

    assert!(matches!(err, DecodeError::Tcp(_)));
    assert_eq!(state.layers(), &[Ethernet, IPv4]);
}

#[test]
fn ethernet_padding_is_not_payload() {
    let mut frame = ipv4_tcp_frame([10, 0, 0, 1], [10, 0, 0, 2], 1000, 443, &[], &[]);
    frame.resize(60, 0);
    let mut state = DecodeState::new();

    state.decode(&frame).expect("decode padded frame");

    assert_eq!(state.layers(), &[Ethernet, IPv4, TCP]);
}

#[test]
fn layers_never_skip_a_parent() {
    let mut fragment = client_hello_frame();
    fragment[14 + 6] |= 0x20;
    let mut truncated = client_hello_frame();
    truncated.truncate(IPV4_TCP_OFFSET + 7);
    let mut bad_version = client_hello_frame();
    bad_version[14] = 0x65;

    let frames = vec![
        client_hello_frame(),
        ipv6_client_hello_frame(),
        ipv4_tcp_frame([10, 0, 0, 1], [10, 0, 0, 2], 1, 2, &[], b"hello"),
        ipv4_udp_frame(&CLIENT_HELLO),
        arp_frame(),
        fragment,
        truncated,
        bad_version,
        vec![],
    ];

    let mut state = DecodeState::new();
    for frame in &frames {
        let _ = state.decode(frame);
        assert_well_ordered(state.layers());
    }
}

#[test]
fn reused_state_matches_fresh_state() {
    let first = ipv6_tcp_frame(V6_CLIENT, V6_SERVER, 40000, 8443, b"a much longer payload than the next one");
    let second = ipv4_tcp_frame([172, 16, 0, 9], [172, 16, 0, 1], 2222, 22, &[], b"ssh");

    let mut reused = DecodeState::new();
    reused.decode(&first).expect("decode first");
    reused.decode(&second).expect("decode second");

    let mut fresh = DecodeState::new();
    fresh.decode(&second).expect("decode fresh");

    assert_eq!(reused.layers(), fresh.layers());
    assert_eq!(reused.ethernet(), fresh.ethernet());
    assert_eq!(reused.ipv4(), fresh.ipv4());
    assert_eq!(reused.tcp(), fresh.tcp());
    assert_eq!(reused.tcp_option_count(), fresh.tcp_option_count());
    assert_eq!(reused.payload(), fresh.payload());
    assert!(!reused.contains(IPv6));
}

#[test]
fn option_count_follows_wire_layout() {
    assert_eq!(count_options(&[]).unwrap(), 0);
    assert_eq!(count_options(&[1, 1, 1, 1]).unwrap(), 4);
    // MSS then END padding
    assert_eq!(count_options(&[2, 4, 0x05, 0xb4, 0, 0, 0, 0]).unwrap(), 2);
    // unknown kind with a sane length still counts
    assert_eq!(count_options(&[34, 2, 1, 1]).unwrap(), 3);
}

#[test]
fn bad_option_length_is_malformed() {
    // length byte pointing past the end
    assert!(matches!(
        count_options(&[8, 10, 0, 0]),
        Err(DecodeError::TcpOptions { kind: 8, offset: 0 })
    ));
    // length byte below the minimum, after a NOP
    assert!(matches!(
        count_options(&[1, 3, 1, 1]),
        Err(DecodeError::TcpOptions { kind: 3, offset: 1 })
    ));
    // kind with no room for its length byte
    assert!(matches!(
        count_options(&[1, 1, 1, 2]),
        Err(DecodeError::TcpOptions { kind: 2, offset: 3 })
    ));
}

#[test]
fn bad_option_length_drops_tcp_layer() {
    let frame = ipv4_tcp_frame_raw_options(&[1, 1, 8, 10], &CLIENT_HELLO);
    let mut state = DecodeState::new();

    let err = state.decode(&frame).expect_err("option runs past the header");

    assert!(matches!(err, DecodeError::TcpOptions { kind: 8, offset: 2 }));
    assert_eq!(state.layers(), &[Ethernet, IPv4]);
}

#[test]
fn raw_nop_options_are_counted() {
    let frame = ipv4_tcp_frame_raw_options(&[1; 12], &CLIENT_HELLO);
    let mut state = DecodeState::new();

    state.decode(&frame).expect("decode nop padded header");

    assert_eq!(state.tcp_option_count(), 12);
    assert!(state.tls().is_client_hello());
}

#[test]
fn tls_detection_requires_record_header() {
    assert!(looks_like_tls(&CLIENT_HELLO));
    assert!(looks_like_tls(&[0x17, 0x03, 0x03, 0x00, 0x10]));
    assert!(!looks_like_tls(&[0x16, 0x03, 0x01]));
    assert!(!looks_like_tls(&[0x16, 0x02, 0x01, 0x00, 0x01]));
    assert!(!looks_like_tls(b"GET /"));
}

#[test]
fn non_handshake_record_has_no_handshake_type() {
    let frame = ipv4_tcp_frame(
        [10, 0, 0, 1],
        [10, 0, 0, 2],
        443,
        51000,
        &[],
        &[0x17, 0x03, 0x03, 0x00, 0x02, 0xaa, 0xbb],
    );
    let mut state = DecodeState::new();

    state.decode(&frame).expect("decode application data");

    assert_eq!(state.tls().record_type, TlsRecordType::ApplicationData);
    assert_eq!(state.tls().handshake_type, None);
    assert!(!state.tls().is_client_hello());
}
