use crate::http::fault::ProtocolFault;
use crate::http::headers::Headers;

/// The first line of an HTTP/1.x message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartLine {
    Request {
        method: String,
        path: String,
        version: String,
    },
    Response {
        version: String,
        status: u16,
        reason: String,
    },
}

/// A parsed start line plus header block for one message.
///
/// A frame never retains body bytes; bodies are relayed, not stored.
/// Frames are created fresh per parsed message and discarded once routing
/// has consumed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub start: StartLine,
    pub headers: Headers,
}

impl Frame {
    /// Parses a complete request head (start line through the blank-line
    /// terminator, which may be included or already stripped).
    pub fn parse_request(head: &[u8]) -> Result<Frame, ProtocolFault> {
        Self::parse(head, true)
    }

    /// Parses a complete response head.
    pub fn parse_response(head: &[u8]) -> Result<Frame, ProtocolFault> {
        Self::parse(head, false)
    }

    fn parse(head: &[u8], request: bool) -> Result<Frame, ProtocolFault> {
        let text = std::str::from_utf8(head)
            .map_err(|_| ProtocolFault::bad_request("message head is not valid UTF-8"))?;

        let mut lines = text.split("\r\n");
        let start_line = lines
            .next()
            .ok_or_else(|| ProtocolFault::bad_request("empty message head"))?;

        let start = if request {
            parse_request_line(start_line)?
        } else {
            parse_status_line(start_line)?
        };

        let mut headers = Headers::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ProtocolFault::bad_request("header line without a colon"))?;
            if name.trim().is_empty() {
                return Err(ProtocolFault::bad_request("header line without a name"));
            }
            headers.append(name.trim(), value.trim());
        }

        Ok(Frame { start, headers })
    }

    pub fn is_request(&self) -> bool {
        matches!(self.start, StartLine::Request { .. })
    }

    pub fn method(&self) -> Option<&str> {
        match &self.start {
            StartLine::Request { method, .. } => Some(method),
            StartLine::Response { .. } => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match &self.start {
            StartLine::Request { .. } => None,
            StartLine::Response { status, .. } => Some(*status),
        }
    }

    /// True for a 101 response carrying `Upgrade: websocket`.
    ///
    /// Seeing this head switches both channels of the pair to raw relay.
    pub fn is_websocket_upgrade(&self) -> bool {
        self.status() == Some(101)
            && self
                .headers
                .get("Upgrade")
                .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
    }
}

/// Grammar: `METHOD SP path SP "HTTP/" version`, exactly three tokens.
fn parse_request_line(line: &str) -> Result<StartLine, ProtocolFault> {
    let mut parts = line.split(' ');
    let (Some(method), Some(path), Some(version), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ProtocolFault::bad_request("malformed request line"));
    };

    if method.is_empty() || path.is_empty() || !version.starts_with("HTTP/") {
        return Err(ProtocolFault::bad_request("malformed request line"));
    }

    Ok(StartLine::Request {
        method: method.to_string(),
        path: path.to_string(),
        version: version.to_string(),
    })
}

/// Grammar: `"HTTP/" version SP status SP reason`; the reason may be empty
/// and may contain spaces.
fn parse_status_line(line: &str) -> Result<StartLine, ProtocolFault> {
    let mut parts = line.splitn(3, ' ');
    let (Some(version), Some(status)) = (parts.next(), parts.next()) else {
        return Err(ProtocolFault::bad_request("malformed status line"));
    };

    if !version.starts_with("HTTP/") {
        return Err(ProtocolFault::bad_request("malformed status line"));
    }

    let status: u16 = status
        .parse()
        .map_err(|_| ProtocolFault::bad_request("malformed status code"))?;

    Ok(StartLine::Response {
        version: version.to_string(),
        status,
        reason: parts.next().unwrap_or("").to_string(),
    })
}
