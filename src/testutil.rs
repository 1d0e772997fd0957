//! Frame builders shared by the unit tests.

use etherparse::{PacketBuilder, TcpOptionElement};

pub const CLIENT_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];
pub const SERVER_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x02];

/// Offset of the TCP header in an untagged Ethernet + option-less IPv4 frame.
pub const IPV4_TCP_OFFSET: usize = 14 + 20;

/// TLS 1.0 record header (Handshake) followed by the start of a ClientHello.
pub const CLIENT_HELLO: [u8; 11] = [
    0x16, 0x03, 0x01, 0x00, 0x06, // record: handshake, TLS 1.0, len 6
    0x01, 0x00, 0x00, 0x02, // handshake: ClientHello, len 2
    0x03, 0x03, // legacy_version TLS 1.2
];

/// MSS, NOP, window scale, SACK permitted and timestamps: 20 bytes, no padding.
pub fn syn_options() -> [TcpOptionElement; 5] {
    [
        TcpOptionElement::MaximumSegmentSize(1460),
        TcpOptionElement::Noop,
        TcpOptionElement::WindowScale(7),
        TcpOptionElement::SelectiveAcknowledgementPermitted,
        TcpOptionElement::Timestamp(1, 0),
    ]
}

pub fn ipv4_tcp_frame(
    src: [u8; 4],
    dst: [u8; 4],
    src_port: u16,
    dst_port: u16,
    options: &[TcpOptionElement],
    payload: &[u8],
) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(CLIENT_MAC, SERVER_MAC)
        .ipv4(src, dst, 64)
        .tcp(src_port, dst_port, 1, 64240)
        .options(options)
        .unwrap();

    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

pub fn ipv4_tcp_frame_raw_options(options: &[u8], payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(CLIENT_MAC, SERVER_MAC)
        .ipv4([10, 0, 0, 5], [93, 184, 216, 34], 64)
        .tcp(51000, 443, 1, 64240)
        .options_raw(options)
        .unwrap();

    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

pub fn ipv6_tcp_frame(
    src: [u8; 16],
    dst: [u8; 16],
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(CLIENT_MAC, SERVER_MAC)
        .ipv6(src, dst, 64)
        .tcp(src_port, dst_port, 1, 65535)
        .options(&[TcpOptionElement::MaximumSegmentSize(1440)])
        .unwrap();

    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

pub fn ipv4_udp_frame(payload: &[u8]) -> Vec<u8> {
    let builder = PacketBuilder::ethernet2(CLIENT_MAC, SERVER_MAC)
        .ipv4([192, 168, 1, 10], [192, 168, 1, 20], 64)
        .udp(5353, 443);

    let mut frame = Vec::with_capacity(builder.size(payload.len()));
    builder.write(&mut frame, payload).unwrap();
    frame
}

/// Ethernet header carrying an ARP body.
pub fn arp_frame() -> Vec<u8> {
    let mut frame = Vec::with_capacity(42);
    frame.extend_from_slice(&SERVER_MAC);
    frame.extend_from_slice(&CLIENT_MAC);
    frame.extend_from_slice(&[0x08, 0x06]);
    frame.extend_from_slice(&[0u8; 28]);
    frame
}

/// 10.0.0.5:51000 -> 93.184.216.34:443 carrying a ClientHello, five TCP options.
pub fn client_hello_frame() -> Vec<u8> {
    ipv4_tcp_frame(
        [10, 0, 0, 5],
        [93, 184, 216, 34],
        51000,
        443,
        &syn_options(),
        &CLIENT_HELLO,
    )
}

pub const V6_CLIENT: [u8; 16] = [0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01];
pub const V6_SERVER: [u8; 16] = [0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x02];

pub fn ipv6_client_hello_frame() -> Vec<u8> {
    ipv6_tcp_frame(V6_CLIENT, V6_SERVER, 40000, 443, &CLIENT_HELLO)
}
