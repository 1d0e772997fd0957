use super::{LayerParser, ParseResult};

/// Whatever trails the last recognised header. The buffer keeps its capacity
/// between frames.
#[derive(Default)]
pub struct PayloadParser {
    pub data: Vec<u8>,
}

impl LayerParser for PayloadParser {
    fn parse<'a>(&mut self, data: &'a [u8]) -> ParseResult<'a> {
        self.data.clear();
        self.data.extend_from_slice(data);
        ParseResult::Final
    }
}
