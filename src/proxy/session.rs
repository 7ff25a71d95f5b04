use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;
use tracing::{debug, trace, warn};

use crate::http::fault::CannedResponse;
use crate::http::frame::Frame;
use crate::http::reader::{FrameReader, ReaderEvent, ReaderRole};
use crate::proxy::connect::ConnectGate;
use crate::proxy::router::{Resolve, Target};

const READ_BUF: usize = 8192;

/// Drives one proxied client connection from accept to close.
///
/// The session is the per-connection event loop: it parses the request
/// stream, establishes the origin pair, and relays both directions with a
/// single `select!` so a channel's events are always handled sequentially.
/// Whatever ends the session, both channels of the pair close together.
pub struct Session {
    client: TcpStream,
    peer: SocketAddr,
    resolver: Arc<dyn Resolve>,
    gate: ConnectGate,
}

impl Session {
    pub fn new(
        client: TcpStream,
        peer: SocketAddr,
        resolver: Arc<dyn Resolve>,
        gate: ConnectGate,
    ) -> Self {
        Self {
            client,
            peer,
            resolver,
            gate,
        }
    }

    pub async fn run(self) -> Result<()> {
        let Session {
            mut client,
            peer,
            resolver,
            gate,
        } = self;

        let mut requests = FrameReader::new(ReaderRole::Request);
        let Some((frame, head, pending)) =
            read_first_head(&mut client, peer, &mut requests).await
        else {
            return Ok(());
        };

        // Destination lookup happens before any origin socket exists, so a
        // miss can never leak a half-open pair.
        let Some(target) = resolver.resolve(&frame) else {
            warn!(peer = %peer, "no destination for request");
            return refuse(&mut client, CannedResponse::NotFound, peer).await;
        };

        debug!(peer = %peer, target = %target, "establishing origin");
        let origin = match gate.connect(&target).await {
            Ok(origin) => origin,
            Err(fault) => {
                warn!(peer = %peer, target = %target, error = %fault, "origin unavailable");
                return refuse(&mut client, fault.canned(), peer).await;
            }
        };

        relay(client, origin, peer, resolver, requests, target, (head, pending)).await
    }
}

/// Reads from the client until the first complete request head.
///
/// Returns the parsed frame, its verbatim head bytes, and any events the
/// same read produced past the head (early body bytes, or a pipelined
/// second request). `None` means the connection is already finished:
/// clean EOF, a dead socket, or a parse fault that was answered with its
/// canned response.
async fn read_first_head(
    client: &mut TcpStream,
    peer: SocketAddr,
    requests: &mut FrameReader,
) -> Option<(Frame, Bytes, Vec<ReaderEvent>)> {
    let mut buf = BytesMut::with_capacity(READ_BUF);
    loop {
        buf.clear();
        match client.read_buf(&mut buf).await {
            Ok(0) => {
                trace!(peer = %peer, "client closed before completing a request");
                return None;
            }
            Ok(_) => {}
            Err(e) => {
                debug!(peer = %peer, error = %e, "client read failed before request");
                return None;
            }
        }

        let events = match requests.process(&buf) {
            Ok(events) => events,
            Err(fault) => {
                warn!(peer = %peer, error = %fault, "rejecting malformed request");
                let _ = client.write_all(fault.canned().as_bytes()).await;
                let _ = client.shutdown().await;
                return None;
            }
        };

        let mut events = events.into_iter();
        while let Some(event) = events.next() {
            if let ReaderEvent::Head { frame, raw } = event {
                return Some((frame, raw, events.collect()));
            }
        }
    }
}

/// Answers the client with a canned response and closes the connection.
async fn refuse(client: &mut TcpStream, canned: CannedResponse, peer: SocketAddr) -> Result<()> {
    debug!(peer = %peer, status = canned.status(), "refusing connection");
    let _ = client.write_all(canned.as_bytes()).await;
    let _ = client.shutdown().await;
    Ok(())
}

enum Forwarded {
    Sent,
    NoRoute,
}

/// Applies one request-reader event to the origin channel.
///
/// Every request head is re-resolved so a lookup miss still faults
/// mid-connection; the pair itself is fixed for the connection's
/// lifetime, so a head resolving elsewhere is forwarded to the
/// established origin with a warning.
async fn forward_request_event(
    event: ReaderEvent,
    origin_write: &mut OwnedWriteHalf,
    resolver: &dyn Resolve,
    target: &Target,
    peer: SocketAddr,
) -> io::Result<Forwarded> {
    match event {
        ReaderEvent::Head { frame, raw } => {
            let Some(next) = resolver.resolve(&frame) else {
                return Ok(Forwarded::NoRoute);
            };
            if next != *target {
                warn!(
                    peer = %peer,
                    established = %target,
                    requested = %next,
                    "destination changed mid-connection, keeping established origin"
                );
            }
            origin_write.write_all(&raw).await?;
        }
        ReaderEvent::Relay(bytes) => origin_write.write_all(&bytes).await?,
        ReaderEvent::MessageEnd => trace!(peer = %peer, "request complete"),
    }
    Ok(Forwarded::Sent)
}

/// The paired relay loop.
///
/// One `select!` over both read halves keeps each channel's events
/// strictly sequential while the two directions stream concurrently. A
/// blocked write to either peer suspends the whole pair: flow control
/// instead of unbounded buffering.
async fn relay(
    client: TcpStream,
    origin: TcpStream,
    peer: SocketAddr,
    resolver: Arc<dyn Resolve>,
    mut requests: FrameReader,
    target: Target,
    opening: (Bytes, Vec<ReaderEvent>),
) -> Result<()> {
    let (mut client_read, mut client_write) = client.into_split();
    let (mut origin_read, mut origin_write) = origin.into_split();
    let mut responses = FrameReader::new(ReaderRole::Response);

    let (head, pending) = opening;
    if let Err(e) = origin_write.write_all(&head).await {
        warn!(peer = %peer, target = %target, error = %e, "origin write failed");
        let _ = client_write
            .write_all(CannedResponse::BadGateway.as_bytes())
            .await;
        return Ok(());
    }
    for event in pending {
        match forward_request_event(event, &mut origin_write, resolver.as_ref(), &target, peer)
            .await
        {
            Ok(Forwarded::Sent) => {}
            Ok(Forwarded::NoRoute) => {
                warn!(peer = %peer, "no destination for pipelined request");
                let _ = client_write
                    .write_all(CannedResponse::NotFound.as_bytes())
                    .await;
                return Ok(());
            }
            Err(e) => {
                warn!(peer = %peer, target = %target, error = %e, "origin write failed");
                let _ = client_write
                    .write_all(CannedResponse::BadGateway.as_bytes())
                    .await;
                return Ok(());
            }
        }
    }

    let mut client_buf = BytesMut::with_capacity(READ_BUF);
    let mut origin_buf = BytesMut::with_capacity(READ_BUF);
    let mut hijacked = false;

    'pair: loop {
        tokio::select! {
            read = client_read.read_buf(&mut client_buf) => {
                match read {
                    Ok(0) => {
                        debug!(peer = %peer, "client closed, closing pair");
                        break;
                    }
                    Ok(_) => {
                        let events = match requests.process(&client_buf) {
                            Ok(events) => events,
                            Err(fault) => {
                                warn!(peer = %peer, error = %fault, "request stream fault");
                                let _ = client_write.write_all(fault.canned().as_bytes()).await;
                                break;
                            }
                        };
                        client_buf.clear();
                        for event in events {
                            match forward_request_event(
                                event,
                                &mut origin_write,
                                resolver.as_ref(),
                                &target,
                                peer,
                            )
                            .await
                            {
                                Ok(Forwarded::Sent) => {}
                                Ok(Forwarded::NoRoute) => {
                                    warn!(peer = %peer, "no destination for pipelined request");
                                    let _ = client_write
                                        .write_all(CannedResponse::NotFound.as_bytes())
                                        .await;
                                    break 'pair;
                                }
                                Err(e) => {
                                    warn!(peer = %peer, target = %target, error = %e, "origin write failed");
                                    if !hijacked {
                                        let _ = client_write
                                            .write_all(CannedResponse::BadGateway.as_bytes())
                                            .await;
                                    }
                                    break 'pair;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        debug!(peer = %peer, error = %e, "client read failed, closing pair");
                        break;
                    }
                }
            }
            read = origin_read.read_buf(&mut origin_buf) => {
                match read {
                    Ok(0) => {
                        debug!(peer = %peer, target = %target, "origin closed, closing pair");
                        break;
                    }
                    Ok(_) => {
                        let events = match responses.process(&origin_buf) {
                            Ok(events) => events,
                            Err(fault) => {
                                warn!(peer = %peer, target = %target, error = %fault, "response stream fault");
                                let _ = client_write.write_all(fault.canned().as_bytes()).await;
                                break;
                            }
                        };
                        origin_buf.clear();
                        for event in events {
                            match event {
                                ReaderEvent::Head { frame, raw } => {
                                    if client_write.write_all(&raw).await.is_err() {
                                        debug!(peer = %peer, "client write failed, closing pair");
                                        break 'pair;
                                    }
                                    if frame.is_websocket_upgrade() {
                                        debug!(peer = %peer, target = %target, "upgrade handshake, switching to raw relay");
                                        hijacked = true;
                                        let stale = requests.hijack();
                                        if !stale.is_empty()
                                            && origin_write.write_all(&stale).await.is_err()
                                        {
                                            break 'pair;
                                        }
                                    }
                                }
                                ReaderEvent::Relay(bytes) => {
                                    if client_write.write_all(&bytes).await.is_err() {
                                        debug!(peer = %peer, "client write failed, closing pair");
                                        break 'pair;
                                    }
                                }
                                ReaderEvent::MessageEnd => {
                                    trace!(peer = %peer, "response complete");
                                }
                            }
                        }
                    }
                    Err(e) => {
                        warn!(peer = %peer, target = %target, error = %e, "origin read failed");
                        if !hijacked {
                            let _ = client_write
                                .write_all(CannedResponse::BadGateway.as_bytes())
                                .await;
                        }
                        break;
                    }
                }
            }
        }
    }

    // Dropping the halves closes both channels of the pair together.
    Ok(())
}
