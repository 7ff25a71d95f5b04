use bytes::BytesMut;

use crate::http::fault::ProtocolFault;

/// Longest accepted chunk-size token, in hex digits. A longer token is a
/// fault, not a truncation.
const MAX_SIZE_DIGITS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkState {
    /// Accumulating hex chunk-size digits.
    Size,
    /// Skipping a chunk extension up to the CR.
    Extension,
    /// Expecting the LF that ends the chunk-size line.
    SizeEnd,
    /// Counting down the declared chunk size plus its trailing CRLF.
    Data { remaining: u64 },
}

/// Incremental decoder for `Transfer-Encoding: chunked` bodies.
///
/// The decoder consumes wire bytes and reports how many were eaten, so the
/// relay path can forward them verbatim; the de-framed payload is appended
/// to a caller-supplied sink. A chunk size of zero marks the final chunk:
/// after its trailing CRLF the decoder reports completion and stops
/// consuming, leaving any further input for the next message.
#[derive(Debug)]
pub struct ChunkDecoder {
    state: ChunkState,
    size: u64,
    digits: u32,
    last: bool,
}

/// Progress report from a single [`ChunkDecoder::feed`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feed {
    /// Wire bytes consumed from the input.
    pub consumed: usize,
    /// The final chunk and its trailing CRLF have been consumed.
    pub complete: bool,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self {
            state: ChunkState::Size,
            size: 0,
            digits: 0,
            last: false,
        }
    }

    /// Feeds wire bytes, in arbitrary splits, appending decoded payload
    /// bytes to `payload`.
    pub fn feed(&mut self, input: &[u8], payload: &mut BytesMut) -> Result<Feed, ProtocolFault> {
        let mut consumed = 0;
        while consumed < input.len() {
            match self.state {
                ChunkState::Size => {
                    let b = input[consumed];
                    match b {
                        b'0'..=b'9' | b'a'..=b'f' | b'A'..=b'F' => {
                            if self.digits == MAX_SIZE_DIGITS {
                                return Err(ProtocolFault::bad_request(
                                    "chunk size token too long",
                                ));
                            }
                            self.size = (self.size << 4) | u64::from(hex_value(b));
                            self.digits += 1;
                            consumed += 1;
                        }
                        b';' if self.digits > 0 => {
                            self.state = ChunkState::Extension;
                            consumed += 1;
                        }
                        b'\r' if self.digits > 0 => {
                            self.state = ChunkState::SizeEnd;
                            consumed += 1;
                        }
                        _ => return Err(ProtocolFault::bad_request("malformed chunk size")),
                    }
                }
                ChunkState::Extension => {
                    if input[consumed] == b'\r' {
                        self.state = ChunkState::SizeEnd;
                    }
                    consumed += 1;
                }
                ChunkState::SizeEnd => {
                    if input[consumed] != b'\n' {
                        return Err(ProtocolFault::bad_request("chunk size line missing LF"));
                    }
                    consumed += 1;
                    self.last = self.size == 0;
                    self.state = ChunkState::Data {
                        remaining: self.size + 2,
                    };
                    self.size = 0;
                    self.digits = 0;
                }
                ChunkState::Data { remaining } => {
                    let avail = (input.len() - consumed) as u64;
                    let take = remaining.min(avail);
                    // Everything short of the last two counted bytes is payload;
                    // the rest is the trailing CRLF.
                    let payload_take = take.min(remaining.saturating_sub(2)) as usize;
                    payload.extend_from_slice(&input[consumed..consumed + payload_take]);
                    consumed += take as usize;

                    let remaining = remaining - take;
                    self.state = if remaining == 0 {
                        ChunkState::Size
                    } else {
                        ChunkState::Data { remaining }
                    };

                    if remaining == 0 && self.last {
                        return Ok(Feed {
                            consumed,
                            complete: true,
                        });
                    }
                }
            }
        }

        Ok(Feed {
            consumed,
            complete: false,
        })
    }
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}
