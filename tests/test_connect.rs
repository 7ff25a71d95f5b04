use std::net::SocketAddr;
use std::time::Duration;

use gangway::http::fault::CannedResponse;
use gangway::proxy::connect::ConnectGate;
use gangway::proxy::router::Target;
use tokio::net::TcpListener;

#[tokio::test]
async fn test_connect_reaches_a_listening_target() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let gate = ConnectGate::new(4, Duration::from_secs(1));
    let target = Target::new(addr.ip().to_string(), addr.port());

    let stream = gate.connect(&target).await.unwrap();
    assert!(stream.peer_addr().is_ok());
}

#[tokio::test]
async fn test_refused_connect_is_bad_gateway() {
    // Bind then drop to find a port with nothing listening on it.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gate = ConnectGate::new(4, Duration::from_secs(1));
    let target = Target::new(addr.ip().to_string(), addr.port());

    let fault = gate.connect(&target).await.unwrap_err();
    assert_eq!(fault.canned(), CannedResponse::BadGateway);
}

#[tokio::test]
async fn test_stalled_connect_is_gateway_timeout() {
    let (addr, _backlog) = saturated_listener();

    let gate = ConnectGate::new(4, Duration::from_millis(300));
    let target = Target::new(addr.ip().to_string(), addr.port());

    let fault = gate.connect(&target).await.unwrap_err();
    assert_eq!(fault.canned(), CannedResponse::GatewayTimeout);
}

#[tokio::test]
async fn test_stalled_connect_does_not_block_the_gate() {
    let (stalled_addr, _backlog) = saturated_listener();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let live_addr = listener.local_addr().unwrap();

    let gate = ConnectGate::new(4, Duration::from_secs(2));
    let slow = {
        let gate = gate.clone();
        let target = Target::new(stalled_addr.ip().to_string(), stalled_addr.port());
        tokio::spawn(async move { gate.connect(&target).await })
    };

    // The live connect completes while the other attempt is still stuck.
    let target = Target::new(live_addr.ip().to_string(), live_addr.port());
    let live = tokio::time::timeout(Duration::from_millis(500), gate.connect(&target)).await;
    assert!(live.unwrap().is_ok());

    assert!(slow.await.unwrap().is_err());
}

/// A listener whose accept queue is already full, so further connects
/// hang until they time out. The pending sockets are returned so they
/// stay alive for the duration of the test.
fn saturated_listener() -> (SocketAddr, Vec<socket2::Socket>) {
    use socket2::{Domain, Socket, Type};

    let listener = Socket::new(Domain::IPV4, Type::STREAM, None).unwrap();
    let bind_addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    listener.bind(&bind_addr.into()).unwrap();
    listener.listen(0).unwrap();
    let addr = listener.local_addr().unwrap().as_socket().unwrap();

    let mut held = vec![listener];
    for _ in 0..4 {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, None).unwrap();
        socket.set_nonblocking(true).unwrap();
        // EINPROGRESS is expected; the socket just has to stay open.
        let _ = socket.connect(&addr.into());
        held.push(socket);
    }

    (addr, held)
}
