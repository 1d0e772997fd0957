use super::{DecodeError, LayerParser, LayerType, ParseResult};
use etherparse::TcpHeader;
use etherparse::err::tcp;
use etherparse::tcp_option::{KIND_END, KIND_NOOP};

#[derive(Default)]
pub struct TcpParser {
    pub header: TcpHeader,
    pub option_count: usize,
}

impl LayerParser for TcpParser {
    fn parse<'a>(&mut self, data: &'a [u8]) -> ParseResult<'a> {
        match TcpHeader::from_slice(data) {
            Ok((header, rest)) => {
                self.option_count = match count_options(header.options.as_slice()) {
                    Ok(count) => count,
                    Err(err) => return ParseResult::Error(err),
                };
                self.header = header;

                if rest.is_empty() {
                    ParseResult::Final
                } else if looks_like_tls(rest) {
                    ParseResult::NextLayer {
                        next_layer: LayerType::TLS,
                        payload: rest,
                    }
                } else {
                    ParseResult::NextLayer {
                        next_layer: LayerType::Payload,
                        payload: rest,
                    }
                }
            }
            Err(tcp::HeaderSliceError::Len(_)) => ParseResult::Truncated,
            Err(tcp::HeaderSliceError::Content(err)) => ParseResult::Error(DecodeError::Tcp(err)),
        }
    }
}

/// Counts TCP options as they appear on the wire: every NOP is an option and
/// an END option is counted and stops the walk. An option whose length byte
/// is missing, below 2 or past the end of the options area is malformed.
pub fn count_options(options: &[u8]) -> Result<usize, DecodeError> {
    let mut count = 0;
    let mut offset = 0;

    while let Some(&kind) = options.get(offset) {
        count += 1;
        match kind {
            KIND_END => break,
            KIND_NOOP => offset += 1,
            _ => {
                let rest = &options[offset..];
                let len = rest.get(1).map_or(0, |len| usize::from(*len));
                if len < 2 || len > rest.len() {
                    return Err(DecodeError::TcpOptions { kind, offset });
                }
                offset += len;
            }
        }
    }

    Ok(count)
}

pub fn looks_like_tls(payload: &[u8]) -> bool {
    if payload.len() < 5 {
        return false;
    }
    let content_type = payload[0];
    let version_major = payload[1];
    (20..=24).contains(&content_type) && version_major == 3
}
