use super::{LayerParser, LayerType, ParseResult};
use etherparse::{EtherType, Ethernet2Header};

#[derive(Default)]
pub struct EthernetParser {
    pub header: Ethernet2Header,
}

impl LayerParser for EthernetParser {
    fn parse<'a>(&mut self, data: &'a [u8]) -> ParseResult<'a> {
        match Ethernet2Header::from_slice(data) {
            Ok((header, rest)) => {
                let ether_type = header.ether_type;
                self.header = header;
                match ether_type {
                    EtherType::IPV4 => ParseResult::NextLayer {
                        next_layer: LayerType::IPv4,
                        payload: rest,
                    },
                    EtherType::IPV6 => ParseResult::NextLayer {
                        next_layer: LayerType::IPv6,
                        payload: rest,
                    },
                    // VLAN tags, ARP and friends end the chain here
                    _ => ParseResult::Final,
                }
            }
            Err(_) => ParseResult::Truncated,
        }
    }
}
