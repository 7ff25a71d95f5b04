use gangway::http::headers::{Headers, normalize_name};

#[test]
fn test_normalize_title_cases_each_segment() {
    assert_eq!(normalize_name("content-type"), "Content-Type");
    assert_eq!(normalize_name("x-forwarded-for"), "X-Forwarded-For");
    assert_eq!(normalize_name("HOST"), "Host");
    assert_eq!(normalize_name("upgrade"), "Upgrade");
}

#[test]
fn test_normalize_is_idempotent() {
    for name in ["content-type", "TRANSFER-encoding", "x-a-b-c", "Host"] {
        let once = normalize_name(name);
        assert_eq!(normalize_name(&once), once);
    }
}

#[test]
fn test_normalize_handles_edge_shapes() {
    assert_eq!(normalize_name(""), "");
    assert_eq!(normalize_name("-"), "-");
    assert_eq!(normalize_name("a"), "A");
    assert_eq!(normalize_name("--x"), "--X");
}

#[test]
fn test_repeated_headers_append_to_one_entry() {
    let mut headers = Headers::new();
    headers.append("X-Tag", "a");
    headers.append("x-tag", "b");

    assert_eq!(headers.len(), 1);
    assert_eq!(headers.get("X-Tag"), Some("a"));
    assert_eq!(headers.get_all("X-Tag"), &["a", "b"]);
}

#[test]
fn test_lookup_is_by_normalized_name() {
    let mut headers = Headers::new();
    headers.append("content-length", "10");

    assert_eq!(headers.get("Content-Length"), Some("10"));
    assert_eq!(headers.get("CONTENT-LENGTH"), Some("10"));
    assert!(headers.contains("content-LENGTH"));
    assert!(!headers.contains("Content-Type"));
}

#[test]
fn test_entries_keep_arrival_order() {
    let mut headers = Headers::new();
    headers.append("Host", "example.com");
    headers.append("Accept", "*/*");
    headers.append("X-Tag", "1");

    let names: Vec<&str> = headers.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, ["Host", "Accept", "X-Tag"]);
}

#[test]
fn test_get_all_missing_name_is_empty() {
    let headers = Headers::new();
    assert!(headers.get_all("Anything").is_empty());
    assert_eq!(headers.get("Anything"), None);
    assert!(headers.is_empty());
}
