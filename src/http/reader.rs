use bytes::{Bytes, BytesMut};

use crate::http::chunked::ChunkDecoder;
use crate::http::fault::{CannedResponse, ProtocolFault};
use crate::http::frame::{Frame, StartLine};

/// Largest accepted message head. Exceeding it is a fault, which keeps a
/// client that never sends the blank-line terminator from growing the
/// buffer forever.
const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Which side of the proxied pair this reader parses.
///
/// Faults are reader-specific: malformed bytes from the client surface as
/// their request-side canned response, while malformed bytes from the
/// origin surface to the client as 502 Bad Gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderRole {
    Request,
    Response,
}

#[derive(Debug)]
enum ReaderState {
    /// Accumulating bytes until the `\r\n\r\n` terminator.
    Head,
    /// Relaying exactly `remaining` more body bytes.
    FixedBody { remaining: u64 },
    /// Relaying a chunked body through the chunked sub-machine.
    Chunked(ChunkDecoder),
    /// Post-upgrade: relay every byte verbatim, forever.
    Raw,
}

/// What a `process` call produced, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// A complete head was parsed. `raw` is the verbatim head bytes,
    /// blank-line terminator included, ready to flush to the peer.
    Head { frame: Frame, raw: Bytes },
    /// Body (or raw-relay) bytes to forward to the peer unchanged.
    Relay(Bytes),
    /// The current message's body is complete; the reader is back in head
    /// state for the next pipelined message.
    MessageEnd,
}

/// The per-channel incremental protocol parser.
///
/// Bytes read off the wire are fed to [`process`](FrameReader::process) in
/// whatever splits the transport produced; the parsed result is invariant
/// under the split boundaries.
#[derive(Debug)]
pub struct FrameReader {
    role: ReaderRole,
    state: ReaderState,
    buf: BytesMut,
    scratch: BytesMut,
}

impl FrameReader {
    pub fn new(role: ReaderRole) -> Self {
        Self {
            role,
            state: ReaderState::Head,
            buf: BytesMut::with_capacity(1024),
            scratch: BytesMut::new(),
        }
    }

    pub fn role(&self) -> ReaderRole {
        self.role
    }

    /// True when the reader sits at a message boundary with nothing
    /// buffered: ready for the head of the next message.
    pub fn at_head(&self) -> bool {
        matches!(self.state, ReaderState::Head) && self.buf.is_empty()
    }

    pub fn is_raw(&self) -> bool {
        matches!(self.state, ReaderState::Raw)
    }

    /// Abandons HTTP framing for the rest of the connection.
    ///
    /// Called on the request reader when its paired response reader sees
    /// the upgrade handshake. Returns any bytes already buffered, which
    /// the caller must forward verbatim.
    pub fn hijack(&mut self) -> Bytes {
        self.state = ReaderState::Raw;
        self.buf.split().freeze()
    }

    /// Feeds freshly read bytes and returns the parse events in order.
    ///
    /// A fault leaves the reader unusable; the caller is expected to tear
    /// the pair down.
    pub fn process(&mut self, input: &[u8]) -> Result<Vec<ReaderEvent>, ProtocolFault> {
        self.buf.extend_from_slice(input);
        let mut events = Vec::new();

        while !self.buf.is_empty() {
            match &mut self.state {
                ReaderState::Raw => {
                    events.push(ReaderEvent::Relay(self.buf.split().freeze()));
                }
                ReaderState::Head => {
                    let Some(end) = find_head_end(&self.buf) else {
                        if self.buf.len() > MAX_HEAD_BYTES {
                            return Err(fault_for_role(
                                self.role,
                                ProtocolFault::bad_request("message head too large"),
                            ));
                        }
                        break;
                    };

                    let raw = self.buf.split_to(end).freeze();
                    let frame = match self.role {
                        ReaderRole::Request => Frame::parse_request(&raw),
                        ReaderRole::Response => Frame::parse_response(&raw),
                    }
                    .map_err(|f| fault_for_role(self.role, f))?;
                    let framing =
                        select_framing(&frame).map_err(|f| fault_for_role(self.role, f))?;

                    events.push(ReaderEvent::Head { frame, raw });
                    match framing {
                        Framing::None => events.push(ReaderEvent::MessageEnd),
                        Framing::Fixed(n) => self.state = ReaderState::FixedBody { remaining: n },
                        Framing::Chunked => self.state = ReaderState::Chunked(ChunkDecoder::new()),
                        Framing::Upgrade => self.state = ReaderState::Raw,
                    }
                }
                ReaderState::FixedBody { remaining } => {
                    let take = (*remaining).min(self.buf.len() as u64) as usize;
                    events.push(ReaderEvent::Relay(self.buf.split_to(take).freeze()));
                    *remaining -= take as u64;
                    if *remaining == 0 {
                        self.state = ReaderState::Head;
                        events.push(ReaderEvent::MessageEnd);
                    }
                }
                ReaderState::Chunked(decoder) => {
                    self.scratch.clear();
                    let fed = decoder
                        .feed(&self.buf, &mut self.scratch)
                        .map_err(|f| fault_for_role(self.role, f))?;
                    events.push(ReaderEvent::Relay(self.buf.split_to(fed.consumed).freeze()));
                    if fed.complete {
                        self.state = ReaderState::Head;
                        events.push(ReaderEvent::MessageEnd);
                    }
                }
            }
        }

        Ok(events)
    }
}

/// Body framing selected from a just-parsed head.
enum Framing {
    None,
    Fixed(u64),
    Chunked,
    Upgrade,
}

fn select_framing(frame: &Frame) -> Result<Framing, ProtocolFault> {
    if frame.is_websocket_upgrade() {
        return Ok(Framing::Upgrade);
    }

    if let Some(te) = frame.headers.get("Transfer-Encoding") {
        if te.to_ascii_lowercase().contains("chunked") {
            return Ok(Framing::Chunked);
        }
    }

    if let Some(cl) = frame.headers.get("Content-Length") {
        let n: u64 = cl
            .trim()
            .parse()
            .map_err(|_| ProtocolFault::length_required("unparseable Content-Length"))?;
        return Ok(if n == 0 { Framing::None } else { Framing::Fixed(n) });
    }

    match &frame.start {
        StartLine::Request { method, .. }
            if matches!(method.as_str(), "POST" | "PUT" | "PATCH") =>
        {
            Err(ProtocolFault::length_required("missing Content-Length"))
        }
        _ => Ok(Framing::None),
    }
}

fn fault_for_role(role: ReaderRole, fault: ProtocolFault) -> ProtocolFault {
    match role {
        ReaderRole::Request => fault,
        ReaderRole::Response => {
            ProtocolFault::new(CannedResponse::BadGateway, fault.detail())
        }
    }
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|pos| pos + 4)
}
