use super::{LayerParser, LayerType, ParseResult};
use tls_parser::{TlsHandshakeType, TlsRecordType, TlsVersion, parse_tls_record_header};

/// Framing of the first TLS record in a segment. The record body is not parsed
/// beyond the handshake message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlsRecord {
    pub record_type: TlsRecordType,
    pub version: TlsVersion,
    pub length: u16,
    pub handshake_type: Option<TlsHandshakeType>,
}

impl Default for TlsRecord {
    fn default() -> Self {
        Self {
            record_type: TlsRecordType(0),
            version: TlsVersion(0),
            length: 0,
            handshake_type: None,
        }
    }
}

impl TlsRecord {
    pub fn is_client_hello(&self) -> bool {
        self.record_type == TlsRecordType::Handshake
            && self.handshake_type == Some(TlsHandshakeType::ClientHello)
    }

    pub fn version_name(&self) -> &'static str {
        match self.version.0.to_be_bytes() {
            [3, 0] => "SSL 3.0",
            [3, 1] => "TLS 1.0",
            [3, 2] => "TLS 1.1",
            [3, 3] => "TLS 1.2",
            [3, 4] => "TLS 1.3",
            _ => "TLS Unknown",
        }
    }
}

#[derive(Default)]
pub struct TlsParser {
    pub record: TlsRecord,
}

impl LayerParser for TlsParser {
    fn parse<'a>(&mut self, data: &'a [u8]) -> ParseResult<'a> {
        let Ok((rest, header)) = parse_tls_record_header(data) else {
            return ParseResult::Truncated;
        };

        let handshake_type = if header.record_type == TlsRecordType::Handshake {
            rest.first().map(|&ty| TlsHandshakeType(ty))
        } else {
            None
        };

        self.record = TlsRecord {
            record_type: header.record_type,
            version: header.version,
            length: header.len,
            handshake_type,
        };

        if rest.is_empty() {
            ParseResult::Final
        } else {
            ParseResult::NextLayer {
                next_layer: LayerType::Payload,
                payload: rest,
            }
        }
    }
}
