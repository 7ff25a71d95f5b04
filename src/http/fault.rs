use thiserror::Error;

/// Pre-rendered error responses.
///
/// These are the only bytes the proxy ever generates itself; everything
/// else on the wire comes from the client or the origin. Each variant is
/// rendered once, at compile time, to its exact byte representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedResponse {
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 411 Length Required
    LengthRequired,
    /// 502 Bad Gateway
    BadGateway,
    /// 504 Gateway Timeout
    GatewayTimeout,
}

impl CannedResponse {
    pub fn status(&self) -> u16 {
        match self {
            CannedResponse::BadRequest => 400,
            CannedResponse::NotFound => 404,
            CannedResponse::LengthRequired => 411,
            CannedResponse::BadGateway => 502,
            CannedResponse::GatewayTimeout => 504,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            CannedResponse::BadRequest => "Bad Request",
            CannedResponse::NotFound => "Not Found",
            CannedResponse::LengthRequired => "Length Required",
            CannedResponse::BadGateway => "Bad Gateway",
            CannedResponse::GatewayTimeout => "Gateway Timeout",
        }
    }

    /// The exact wire bytes written to the client for this response.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            CannedResponse::BadRequest => {
                b"HTTP/1.1 400 Bad Request\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            }
            CannedResponse::NotFound => {
                b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            }
            CannedResponse::LengthRequired => {
                b"HTTP/1.1 411 Length Required\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            }
            CannedResponse::BadGateway => {
                b"HTTP/1.1 502 Bad Gateway\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            }
            CannedResponse::GatewayTimeout => {
                b"HTTP/1.1 504 Gateway Timeout\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            }
        }
    }
}

/// A protocol violation or transport failure that ends a proxied pair.
///
/// This is the only error type the parsers surface. It always carries
/// exactly one [`CannedResponse`]; whether those bytes are actually
/// written depends on which endpoint failed (a canned response is never
/// written to a channel already known to be broken).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{detail}")]
pub struct ProtocolFault {
    canned: CannedResponse,
    detail: &'static str,
}

impl ProtocolFault {
    pub fn new(canned: CannedResponse, detail: &'static str) -> Self {
        Self { canned, detail }
    }

    pub fn bad_request(detail: &'static str) -> Self {
        Self::new(CannedResponse::BadRequest, detail)
    }

    pub fn not_found(detail: &'static str) -> Self {
        Self::new(CannedResponse::NotFound, detail)
    }

    pub fn length_required(detail: &'static str) -> Self {
        Self::new(CannedResponse::LengthRequired, detail)
    }

    pub fn bad_gateway(detail: &'static str) -> Self {
        Self::new(CannedResponse::BadGateway, detail)
    }

    pub fn gateway_timeout(detail: &'static str) -> Self {
        Self::new(CannedResponse::GatewayTimeout, detail)
    }

    pub fn canned(&self) -> CannedResponse {
        self.canned
    }

    pub fn detail(&self) -> &'static str {
        self.detail
    }
}
