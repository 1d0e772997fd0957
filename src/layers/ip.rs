use super::{DecodeError, LayerParser, LayerType, ParseResult};
use etherparse::err::{ipv4, ipv6};
use etherparse::{IpNumber, Ipv4Header, Ipv6Header};

#[derive(Default)]
pub struct IPv4Parser {
    pub header: Ipv4Header,
}

impl LayerParser for IPv4Parser {
    fn parse<'a>(&mut self, data: &'a [u8]) -> ParseResult<'a> {
        match Ipv4Header::from_slice(data) {
            Ok((header, rest)) => {
                let header_len = usize::from(header.ihl()) * 4;
                let payload_len = usize::from(header.total_len).saturating_sub(header_len);
                // Ethernet pads short frames; the datagram ends at total_len.
                let payload = &rest[..payload_len.min(rest.len())];
                let next_is_tcp = header.protocol == IpNumber::TCP && !header.is_fragmenting_payload();
                self.header = header;

                if next_is_tcp {
                    ParseResult::NextLayer {
                        next_layer: LayerType::TCP,
                        payload,
                    }
                } else {
                    ParseResult::Final
                }
            }
            Err(ipv4::HeaderSliceError::Len(_)) => ParseResult::Truncated,
            Err(ipv4::HeaderSliceError::Content(err)) => ParseResult::Error(DecodeError::Ipv4(err)),
        }
    }
}

#[derive(Default)]
pub struct IPv6Parser {
    pub header: Ipv6Header,
}

impl LayerParser for IPv6Parser {
    fn parse<'a>(&mut self, data: &'a [u8]) -> ParseResult<'a> {
        match Ipv6Header::from_slice(data) {
            Ok((header, rest)) => {
                let payload_len = usize::from(header.payload_length);
                let payload = &rest[..payload_len.min(rest.len())];
                // Extension headers are not walked; only a direct TCP header continues.
                let next_is_tcp = header.next_header == IpNumber::TCP;
                self.header = header;

                if next_is_tcp {
                    ParseResult::NextLayer {
                        next_layer: LayerType::TCP,
                        payload,
                    }
                } else {
                    ParseResult::Final
                }
            }
            Err(ipv6::HeaderSliceError::Len(_)) => ParseResult::Truncated,
            Err(ipv6::HeaderSliceError::Content(err)) => ParseResult::Error(DecodeError::Ipv6(err)),
        }
    }
}
