use crate::layers::{DecodeState, LayerType};
use std::net::IpAddr;

pub mod format;


pub use format::FlowParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IPAddress {
    V4([u8; 4]),
    V6([u8; 16]),
}

/// Summary of one captured segment. Fields whose layer was missing from the
/// frame keep their zero value; an address that was never seen is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlowRecord {
    pub src_ip: Option<IPAddress>,
    pub dst_ip: Option<IPAddress>,
    pub src_port: u16,
    pub dst_port: u16,
    pub tcp_option_count: usize,
}

impl FlowRecord {
    /// Copies what the last decode found out of the shared buffers.
    pub fn extract(state: &DecodeState) -> Self {
        Self::from_layers(state.layers(), state)
    }

    /// Walks `layers` in order and reads the matching buffers of `state`. When
    /// both an IPv4 and an IPv6 entry are listed, the later one supplies the
    /// addresses.
    pub fn from_layers(layers: &[LayerType], state: &DecodeState) -> Self {
        let mut record = Self::default();

        for layer in layers {
            match layer {
                LayerType::IPv4 => {
                    let ip = state.ipv4();
                    record.src_ip = Some(IPAddress::V4(ip.source));
                    record.dst_ip = Some(IPAddress::V4(ip.destination));
                }
                LayerType::IPv6 => {
                    let ip = state.ipv6();
                    record.src_ip = Some(IPAddress::V6(ip.source));
                    record.dst_ip = Some(IPAddress::V6(ip.destination));
                }
                LayerType::TCP => {
                    let tcp = state.tcp();
                    record.src_port = tcp.source_port;
                    record.dst_port = tcp.destination_port;
                    record.tcp_option_count = state.tcp_option_count();
                }
                LayerType::Ethernet | LayerType::TLS | LayerType::Payload => {}
            }
        }

        record
    }
}

impl From<IpAddr> for IPAddress {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => IPAddress::V4(v4.octets()),
            IpAddr::V6(v6) => IPAddress::V6(v6.octets()),
        }
    }
}

impl From<IPAddress> for IpAddr {
    fn from(addr: IPAddress) -> Self {
        match addr {
            IPAddress::V4(bytes) => IpAddr::from(bytes),
            IPAddress::V6(bytes) => IpAddr::from(bytes),
        }
    }
}
