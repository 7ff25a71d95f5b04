use std::collections::HashMap;

use gangway::http::frame::Frame;
use gangway::proxy::router::{Resolve, RouteTable, Target};

fn request_for(host: &str) -> Frame {
    let head = format!("GET / HTTP/1.1\r\nHost: {host}\r\n\r\n");
    Frame::parse_request(head.as_bytes()).unwrap()
}

#[test]
fn test_resolve_by_exact_host() {
    let mut table = RouteTable::new();
    table.insert("example.com", Target::new("127.0.0.1", 9000));

    let target = table.resolve(&request_for("example.com")).unwrap();
    assert_eq!(target, Target::new("127.0.0.1", 9000));
}

#[test]
fn test_resolve_strips_port_suffix() {
    let mut table = RouteTable::new();
    table.insert("example.com", Target::new("127.0.0.1", 9000));

    let target = table.resolve(&request_for("example.com:8080")).unwrap();
    assert_eq!(target.port, 9000);
}

#[test]
fn test_exact_match_with_port_wins() {
    let mut table = RouteTable::new();
    table.insert("example.com", Target::new("127.0.0.1", 9000));
    table.insert("example.com:8080", Target::new("127.0.0.1", 9001));

    let target = table.resolve(&request_for("example.com:8080")).unwrap();
    assert_eq!(target.port, 9001);
}

#[test]
fn test_unknown_host_is_a_miss() {
    let mut table = RouteTable::new();
    table.insert("example.com", Target::new("127.0.0.1", 9000));

    assert!(table.resolve(&request_for("other.com")).is_none());
}

#[test]
fn test_request_without_host_is_a_miss() {
    let table = RouteTable::new();
    let frame = Frame::parse_request(b"GET / HTTP/1.1\r\n\r\n").unwrap();
    assert!(table.resolve(&frame).is_none());
}

#[test]
fn test_response_frames_never_resolve() {
    let mut table = RouteTable::new();
    table.insert("example.com", Target::new("127.0.0.1", 9000));

    let frame = Frame::parse_response(b"HTTP/1.1 200 OK\r\nHost: example.com\r\n\r\n").unwrap();
    assert!(table.resolve(&frame).is_none());
}

#[test]
fn test_from_config_parses_route_urls() {
    let mut routes = HashMap::new();
    routes.insert("a.test".to_string(), "http://127.0.0.1:9000".to_string());
    routes.insert("b.test".to_string(), "http://backend.internal".to_string());
    routes.insert("c.test".to_string(), "https://secure.internal".to_string());

    let table = RouteTable::from_config(&routes).unwrap();
    assert_eq!(table.len(), 3);

    assert_eq!(
        table.resolve(&request_for("a.test")).unwrap(),
        Target::new("127.0.0.1", 9000)
    );
    assert_eq!(
        table.resolve(&request_for("b.test")).unwrap(),
        Target::new("backend.internal", 80)
    );
    assert_eq!(
        table.resolve(&request_for("c.test")).unwrap(),
        Target::new("secure.internal", 443)
    );
}

#[test]
fn test_from_config_rejects_invalid_urls() {
    let mut routes = HashMap::new();
    routes.insert("a.test".to_string(), "not a url at all".to_string());

    assert!(RouteTable::from_config(&routes).is_err());
}

#[test]
fn test_target_addr_formatting() {
    let target = Target::new("backend.internal", 8080);
    assert_eq!(target.addr(), "backend.internal:8080");
    assert_eq!(target.to_string(), "backend.internal:8080");
}
