//! Kernel-side selection of TLS ClientHello segments.
//!
//! The TLS record starts right after the TCP options, so its offset is read
//! from the TCP data-offset nibble (header length in 32-bit words) at capture
//! time instead of being a constant.


/// TLS record content type for handshake messages.
pub const TLS_RECORD_HANDSHAKE: u8 = 0x16;
/// Handshake message type of a ClientHello.
pub const TLS_HANDSHAKE_CLIENT_HELLO: u8 = 0x01;
/// The handshake type follows the 5-byte record header.
pub const HANDSHAKE_TYPE_OFFSET: usize = 5;

/// Offset of the TCP data-offset byte within the TCP header.
const DATA_OFFSET_BYTE: usize = 12;

const ETHERNET_HEADER_LEN: usize = 14;
const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86dd;
const IPV6_HEADER_LEN: usize = 40;
const IP_PROTO_TCP: u8 = 6;

/// `tcp[12]` masked and shifted so the word count lands in bytes.
fn payload_offset_expr() -> String {
    format!("((tcp[{DATA_OFFSET_BYTE}:1] & 0xf0) >> 2)")
}

/// BPF expression matching TCP segments whose payload opens with a TLS
/// handshake record carrying a ClientHello.
pub fn client_hello_filter() -> String {
    let offset = payload_offset_expr();
    format!(
        "(tcp[{offset}+{HANDSHAKE_TYPE_OFFSET}:1] = 0x{TLS_HANDSHAKE_CLIENT_HELLO:02x}) and (tcp[{offset}:1] = 0x{TLS_RECORD_HANDSHAKE:02x})"
    )
}

/// TCP header length in bytes from the byte holding the data-offset nibble.
///
/// `(b & 0xf0) >> 2` is the nibble times four: the low two bits of the shifted
/// value are always zero.
pub fn tcp_header_len(data_offset_byte: u8) -> usize {
    usize::from((data_offset_byte & 0xf0) >> 2)
}

/// Checks a raw Ethernet frame for a TLS ClientHello at the offsets
/// [`client_hello_filter`] reads. Any read past the captured bytes rejects the
/// frame and so do IPv4 fragments other than the first.
///
/// IPv4 frames get the same answer from libpcap. IPv6 frames are accepted when
/// the TCP header directly follows the fixed 40-byte header (extension headers
/// are not followed), while the compiled filter rejects every IPv6 frame
/// because libpcap's `tcp[]` loads only resolve IPv4.
pub fn matches_client_hello(frame: &[u8]) -> bool {
    let Some(segment) = tcp_segment(frame) else {
        return false;
    };
    let Some(&offset_byte) = segment.get(DATA_OFFSET_BYTE) else {
        return false;
    };
    let offset = tcp_header_len(offset_byte);

    segment.get(offset) == Some(&TLS_RECORD_HANDSHAKE)
        && segment.get(offset + HANDSHAKE_TYPE_OFFSET) == Some(&TLS_HANDSHAKE_CLIENT_HELLO)
}

fn tcp_segment(frame: &[u8]) -> Option<&[u8]> {
    let ether_type = u16::from_be_bytes([*frame.get(12)?, *frame.get(13)?]);
    let ip = frame.get(ETHERNET_HEADER_LEN..)?;

    match ether_type {
        ETHERTYPE_IPV4 => {
            let first = *ip.first()?;
            if first >> 4 != 4 || *ip.get(9)? != IP_PROTO_TCP {
                return None;
            }
            let frag_offset = u16::from_be_bytes([*ip.get(6)? & 0x1f, *ip.get(7)?]);
            if frag_offset != 0 {
                return None;
            }
            ip.get(usize::from(first & 0x0f) * 4..)
        }
        ETHERTYPE_IPV6 => {
            if *ip.get(6)? != IP_PROTO_TCP {
                return None;
            }
            ip.get(IPV6_HEADER_LEN..)
        }
        _ => None,
    }
}
