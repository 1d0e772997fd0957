use etherparse::{Ethernet2Header, Ipv4Header, Ipv6Header, TcpHeader};
use thiserror::Error;
use tracing::trace;

pub mod ethernet;
pub mod ip;
pub mod payload;
pub mod tls;
pub mod transport;

#[cfg(test)]
mod tests;

use ethernet::EthernetParser;
use ip::{IPv4Parser, IPv6Parser};
use payload::PayloadParser;
use tls::{TlsParser, TlsRecord};
use transport::TcpParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Ethernet,
    IPv4,
    IPv6,
    TCP,
    TLS,
    Payload,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("IPv4 header malformed: {0}")]
    Ipv4(etherparse::err::ipv4::HeaderError),
    #[error("IPv6 header malformed: {0}")]
    Ipv6(etherparse::err::ipv6::HeaderError),
    #[error("TCP header malformed: {0}")]
    Tcp(etherparse::err::tcp::HeaderError),
    #[error("TCP option {kind} at offset {offset} has an invalid length")]
    TcpOptions { kind: u8, offset: usize },
}

#[derive(Debug)]
pub enum ParseResult<'a> {
    /// Layer decoded, `payload` continues as `next_layer`.
    NextLayer {
        next_layer: LayerType,
        payload: &'a [u8],
    },
    /// Layer decoded and nothing follows that we decode.
    Final,
    /// Not enough bytes for this layer; it is left out of the list.
    Truncated,
    Error(DecodeError),
}

/// A layer that decodes into its own reusable buffer.
pub trait LayerParser {
    fn parse<'a>(&mut self, data: &'a [u8]) -> ParseResult<'a>;
}

/// Per-session decode buffers.
///
/// One instance is threaded through every frame of a capture so that no layer
/// structure is allocated per packet. Every buffer is only meaningful when its
/// [`LayerType`] is in [`DecodeState::layers`], and only until the next call to
/// [`DecodeState::decode`]; a buffer whose layer was absent in the last frame
/// still holds whatever an earlier frame left there.
pub struct DecodeState {
    ethernet: EthernetParser,
    ipv4: IPv4Parser,
    ipv6: IPv6Parser,
    tcp: TcpParser,
    tls: TlsParser,
    payload: PayloadParser,
    decoded: Vec<LayerType>,
}

impl Default for DecodeState {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeState {
    pub fn new() -> Self {
        Self {
            ethernet: EthernetParser::default(),
            ipv4: IPv4Parser::default(),
            ipv6: IPv6Parser::default(),
            tcp: TcpParser::default(),
            tls: TlsParser::default(),
            payload: PayloadParser::default(),
            decoded: Vec::with_capacity(8),
        }
    }

    /// Decodes `frame` starting at Ethernet, overwriting the buffers of every
    /// layer found. The layer list is rebuilt from scratch. On error the layers
    /// decoded before the fault stay listed.
    pub fn decode(&mut self, frame: &[u8]) -> Result<(), DecodeError> {
        self.decoded.clear();

        let mut layer = LayerType::Ethernet;
        let mut data = frame;

        loop {
            match self.parser_mut(layer).parse(data) {
                ParseResult::NextLayer {
                    next_layer,
                    payload,
                } => {
                    self.decoded.push(layer);
                    layer = next_layer;
                    data = payload;
                }
                ParseResult::Final => {
                    self.decoded.push(layer);
                    return Ok(());
                }
                ParseResult::Truncated => {
                    trace!(?layer, remaining = data.len(), "Layer truncated; stopping decode");
                    return Ok(());
                }
                ParseResult::Error(err) => return Err(err),
            }
        }
    }

    /// Layers found by the last [`decode`](Self::decode), outermost first.
    pub fn layers(&self) -> &[LayerType] {
        &self.decoded
    }

    pub fn contains(&self, layer: LayerType) -> bool {
        self.decoded.contains(&layer)
    }

    pub fn ethernet(&self) -> &Ethernet2Header {
        &self.ethernet.header
    }

    pub fn ipv4(&self) -> &Ipv4Header {
        &self.ipv4.header
    }

    pub fn ipv6(&self) -> &Ipv6Header {
        &self.ipv6.header
    }

    pub fn tcp(&self) -> &TcpHeader {
        &self.tcp.header
    }

    /// Options in the last TCP header, counted the way they appear on the wire.
    pub fn tcp_option_count(&self) -> usize {
        self.tcp.option_count
    }

    pub fn tls(&self) -> &TlsRecord {
        &self.tls.record
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload.data
    }

    fn parser_mut(&mut self, layer: LayerType) -> &mut dyn LayerParser {
        match layer {
            LayerType::Ethernet => &mut self.ethernet,
            LayerType::IPv4 => &mut self.ipv4,
            LayerType::IPv6 => &mut self.ipv6,
            LayerType::TCP => &mut self.tcp,
            LayerType::TLS => &mut self.tls,
            LayerType::Payload => &mut self.payload,
        }
    }
}
