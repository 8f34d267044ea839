//! End-to-end handshakes against a loopback HTTP server.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use authgate_core::{AuthOutcome, AuthResult, Authenticator};
use authgate_http::auth_header;
use authgate_http::{HttpAuthType, HttpAuthenticator, HttpConfig, HttpPhase, Method, TransportKind};
use flate2::write::GzEncoder;
use flate2::Compression;

/// Serve one canned response per connection and return the raw requests.
fn serve(responses: Vec<Vec<u8>>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let uri = format!("http://{}/auth", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let mut requests = Vec::new();
        for response in responses {
            let (mut socket, _) = listener.accept().unwrap();
            requests.push(read_request(&mut socket));
            socket.write_all(&response).unwrap();
        }
        requests
    });

    (uri, handle)
}

fn read_request(socket: &mut TcpStream) -> String {
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    let mut raw = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = socket.read(&mut buf).unwrap();
        raw.extend_from_slice(&buf[..n]);
        if n == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&raw);
        if let Some(end) = text.find("\r\n\r\n") {
            let content_length = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&raw).into_owned()
}

fn stream_config(uri: &str) -> HttpConfig {
    HttpConfig::new(uri)
        .with_transport(TransportKind::Stream)
        .with_timeout(Duration::from_secs(5))
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn digest_challenge_then_ok_is_valid() {
    let (uri, server) = serve(vec![
        b"HTTP/1.1 401 Unauthorized\r\nWWW-Authenticate: Digest realm=\"x\", nonce=\"y\"\r\nContent-Length: 0\r\n\r\n".to_vec(),
        b"HTTP/1.1 200 OK\r\nContent-Length: 7\r\n\r\nwelcome".to_vec(),
    ]);

    let mut auth = HttpAuthenticator::from_config(stream_config(&uri)).unwrap();
    let result = auth.authenticate("admin", Some("12admin34")).unwrap();

    assert_eq!(result, AuthResult::Valid);
    assert_eq!(auth.auth_type(), Some(HttpAuthType::Digest));
    assert_eq!(auth.phase(), HttpPhase::Resolved);
    assert_eq!(auth.response().unwrap().body_text(), "welcome");

    let requests = server.join().unwrap();
    assert!(!requests[0].contains("Authorization:"));

    let expected =
        auth_header::digest("admin", "12admin34", Some("x"), Some("y"), Method::Post, "/auth")
            .unwrap();
    assert!(requests[1].starts_with("POST /auth HTTP/1.1\r\n"));
    assert!(requests[1].contains(&format!("Authorization: {}\r\n", expected)));
}

#[test]
fn final_non_200_is_not_valid() {
    let (uri, server) = serve(vec![
        b"HTTP/1.1 401 Unauthorized\r\nWWW-Authenticate: Basic realm=\"myRealm\"\r\nContent-Length: 0\r\n\r\n".to_vec(),
        b"HTTP/1.1 401 Unauthorized\r\nWWW-Authenticate: Basic realm=\"myRealm\"\r\nContent-Length: 0\r\n\r\n".to_vec(),
    ]);

    let mut auth = HttpAuthenticator::from_config(stream_config(&uri)).unwrap();
    let result = auth.authenticate("admin", Some("wrong")).unwrap();

    assert_eq!(result, AuthResult::NotValid);
    assert_eq!(auth.outcome(), &AuthOutcome::Rejected);
    assert_eq!(auth.scheme().unwrap().realm(), Some("myRealm"));

    let requests = server.join().unwrap();
    assert!(requests[1].contains("Authorization: Basic YWRtaW46d3Jvbmc=\r\n"));
}

#[test]
fn chunked_gzip_body_is_decoded() {
    let body = gzip(b"Test body");
    let mut response =
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nContent-Encoding: gzip\r\n\r\n".to_vec();
    response.extend_from_slice(format!("{:x}\r\n", body.len()).as_bytes());
    response.extend_from_slice(&body);
    response.extend_from_slice(b"\r\n0\r\n\r\n");

    let (uri, server) = serve(vec![response]);

    let config = stream_config(&uri)
        .with_auth_type(HttpAuthType::Bearer)
        .with_bearer_token("token-1");
    let mut auth = HttpAuthenticator::from_config(config).unwrap();

    assert!(auth.authenticate("svc", None).unwrap().is_valid());
    assert_eq!(auth.response().unwrap().body_text(), "Test body");

    let requests = server.join().unwrap();
    assert!(requests[0].contains("Authorization: Bearer token-1\r\n"));
}

#[test]
fn reqwest_transport_decodes_gzip() {
    let body = gzip(b"Test body");
    let mut response = format!(
        "HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(&body);

    let (uri, server) = serve(vec![response]);

    let config = HttpConfig::new(&uri)
        .with_auth_type(HttpAuthType::UrlData)
        .with_timeout(Duration::from_secs(5));
    let mut auth = HttpAuthenticator::from_config(config).unwrap();

    assert!(auth.authenticate("admin", Some("12admin34")).unwrap().is_valid());
    assert_eq!(auth.response().unwrap().code, 200);
    assert_eq!(auth.response().unwrap().body_text(), "Test body");

    let requests = server.join().unwrap();
    assert!(requests[0].ends_with("username=admin&password=12admin34"));
}

#[test]
fn unreachable_server_is_not_valid() {
    // Bind and drop to get a port nobody listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let uri = format!("http://127.0.0.1:{}/auth", port);

    let mut auth = HttpAuthenticator::from_config(stream_config(&uri)).unwrap();
    assert_eq!(auth.authenticate("admin", Some("pw")).unwrap(), AuthResult::NotValid);
    assert!(auth.outcome().is_unreachable());
}

#[test]
fn malformed_uri_is_config_error() {
    let err = HttpAuthenticator::new("localhost:8080/auth").err().unwrap();
    assert!(err.is_config());
}

#[test]
fn bearer_token_with_line_break_is_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let uri = format!("http://{}/auth", listener.local_addr().unwrap());

    let config = stream_config(&uri)
        .with_auth_type(HttpAuthType::Bearer)
        .with_bearer_token("tok\r\nX-Injected: yes");
    let mut auth = HttpAuthenticator::from_config(config).unwrap();

    let err = auth.authenticate("admin", Some("pw")).unwrap_err();
    assert!(err.is_config());
    assert!(listener.accept().is_err());
}
