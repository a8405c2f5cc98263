use jobcast::transport::parse_url;

#[test]
fn test_accepts_tcp_scheme() {
    assert_eq!(parse_url("tcp://head:55000").unwrap(), "head:55000");
}

#[test]
fn test_accepts_ws_scheme() {
    assert_eq!(parse_url("ws://head:55000").unwrap(), "head:55000");
}

#[test]
fn test_accepts_bare_host_port() {
    assert_eq!(parse_url("10.0.0.7:55000").unwrap(), "10.0.0.7:55000");
}

#[test]
fn test_trailing_slash_and_whitespace() {
    assert_eq!(parse_url(" tcp://head:55000/ ").unwrap(), "head:55000");
}

#[test]
fn test_rejects_garbage() {
    assert!(parse_url("").is_err());
    assert!(parse_url("head").is_err());
    assert!(parse_url("tcp://head").is_err());
    assert!(parse_url("tcp://:55000").is_err());
    assert!(parse_url("tcp://head:notaport").is_err());
}
