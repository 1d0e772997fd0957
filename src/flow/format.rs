//! Text form of a [`FlowRecord`]: `src,sport,dst,dport,options`.

use super::{FlowRecord, IPAddress};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlowParseError {
    #[error("expected 5 comma-separated fields, found {0}")]
    FieldCount(usize),
    #[error("invalid address {0:?}")]
    Address(String),
    #[error("invalid port {0:?}")]
    Port(String),
    #[error("invalid option count {0:?}")]
    OptionCount(String),
}

impl fmt::Display for IPAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // dotted quad for v4, RFC 5952 compressed form for v6
        write!(f, "{}", IpAddr::from(*self))
    }
}

/// An unset address renders as an empty field.
fn write_address(f: &mut fmt::Formatter<'_>, address: Option<&IPAddress>) -> fmt::Result {
    match address {
        Some(ip) => write!(f, "{ip}"),
        None => Ok(()),
    }
}

impl fmt::Display for FlowRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_address(f, self.src_ip.as_ref())?;
        write!(f, ",{},", self.src_port)?;
        write_address(f, self.dst_ip.as_ref())?;
        write!(f, ",{},{}", self.dst_port, self.tcp_option_count)
    }
}

fn parse_address(field: &str) -> Result<Option<IPAddress>, FlowParseError> {
    if field.is_empty() {
        return Ok(None);
    }
    field
        .parse::<IpAddr>()
        .map(|ip| Some(IPAddress::from(ip)))
        .map_err(|_| FlowParseError::Address(field.to_string()))
}

fn parse_port(field: &str) -> Result<u16, FlowParseError> {
    field
        .parse()
        .map_err(|_| FlowParseError::Port(field.to_string()))
}

impl FromStr for FlowRecord {
    type Err = FlowParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(',').collect();
        let &[src_ip, src_port, dst_ip, dst_port, count] = fields.as_slice() else {
            return Err(FlowParseError::FieldCount(fields.len()));
        };

        Ok(FlowRecord {
            src_ip: parse_address(src_ip)?,
            src_port: parse_port(src_port)?,
            dst_ip: parse_address(dst_ip)?,
            dst_port: parse_port(dst_port)?,
            tcp_option_count: count
                .parse()
                .map_err(|_| FlowParseError::OptionCount(count.to_string()))?,
        })
    }
}
