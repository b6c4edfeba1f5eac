//! End-to-end tests over a real listener: raw HTTP/1.1 requests against
//! a server spawned on an ephemeral port with a tempdir document root.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use filesrv::config::{
    CompressionConfig, Config, LoggingConfig, PerformanceConfig, ServerConfig, ServerContext,
    SiteConfig, TlsConfig,
};
use filesrv::server::{self, shutdown::SignalHandler};

fn test_config(root: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            http_port: 0,
            https_port: None,
            idle_timeout_ms: 5_000,
            workers: None,
        },
        tls: TlsConfig::default(),
        site: SiteConfig {
            root: root.to_string(),
            welcome_file: "index.html".to_string(),
            cache_max_age: 86_400,
        },
        compression: CompressionConfig {
            enabled: true,
            min_length: 32,
            mime_types: vec!["text/html".to_string(), "text/plain".to_string()],
        },
        logging: LoggingConfig {
            access_log: false,
            access_log_format: "combined".to_string(),
            access_log_file: None,
            error_log_file: None,
        },
        performance: PerformanceConfig {
            max_connections: None,
            shutdown_grace_period: 2,
        },
    }
}

struct TestServer {
    addr: SocketAddr,
    signal: Arc<SignalHandler>,
    handle: tokio::task::JoinHandle<()>,
}

fn start_server(root: &str) -> TestServer {
    start_server_with(test_config(root))
}

fn start_server_with(config: Config) -> TestServer {
    let listener = server::create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(ServerContext::new(config));
    let signal = Arc::new(SignalHandler::new());
    let run_signal = Arc::clone(&signal);
    let handle = tokio::spawn(async move {
        server::run(state, listener, None, run_signal).await;
    });
    TestServer {
        addr,
        signal,
        handle,
    }
}

struct RawResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

async fn send_request(stream: &mut TcpStream, request: &str) -> RawResponse {
    stream.write_all(request.as_bytes()).await.unwrap();

    // Read until end of headers
    let mut buf = Vec::new();
    let header_end = loop {
        let mut byte = [0u8; 1];
        assert!(stream.read_exact(&mut byte).await.is_ok(), "connection closed mid-headers");
        buf.push(byte[0]);
        if buf.ends_with(b"\r\n\r\n") {
            break buf.len();
        }
        assert!(buf.len() < 16 * 1024, "unreasonably large header section");
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let status_line = lines.next().unwrap();
    let status: u16 = status_line.split_whitespace().nth(1).unwrap().parse().unwrap();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(": "))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let content_length: usize = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .map_or(0, |(_, v)| v.parse().unwrap());

    let mut body = vec![0u8; content_length];
    if content_length > 0 {
        stream.read_exact(&mut body).await.unwrap();
    }

    RawResponse {
        status,
        headers,
        body,
    }
}

#[tokio::test]
async fn test_welcome_file_served_for_root() {
    let dir = tempfile::tempdir().unwrap();
    let content = "<html><body>home page body</body></html>";
    std::fs::write(dir.path().join("index.html"), content).unwrap();
    let srv = start_server(dir.path().to_str().unwrap());

    let mut stream = TcpStream::connect(srv.addr).await.unwrap();
    let resp = send_request(
        &mut stream,
        &format!("GET / HTTP/1.1\r\nHost: {}\r\n\r\n", srv.addr),
    )
    .await;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, content.as_bytes());
    assert_eq!(resp.header("content-type"), Some("text/html; charset=utf-8"));
    assert!(resp.header("etag").is_some());
    assert_eq!(resp.header("cache-control"), Some("public, max-age=86400"));

    srv.signal.request_shutdown();
}

#[tokio::test]
async fn test_404_keeps_connection_reusable() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>ok</html>").unwrap();
    let srv = start_server(dir.path().to_str().unwrap());

    let mut stream = TcpStream::connect(srv.addr).await.unwrap();
    let host = srv.addr.to_string();

    let first = send_request(
        &mut stream,
        &format!("GET /missing.txt HTTP/1.1\r\nHost: {host}\r\n\r\n"),
    )
    .await;
    assert_eq!(first.status, 404);

    // Same connection must still serve the next request
    let second = send_request(
        &mut stream,
        &format!("GET /index.html HTTP/1.1\r\nHost: {host}\r\n\r\n"),
    )
    .await;
    assert_eq!(second.status, 200);
    assert_eq!(second.body, b"<html>ok</html>");

    srv.signal.request_shutdown();
}

#[tokio::test]
async fn test_conditional_get_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("page.html"), "<p>conditional</p>").unwrap();
    let srv = start_server(dir.path().to_str().unwrap());

    let mut stream = TcpStream::connect(srv.addr).await.unwrap();
    let host = srv.addr.to_string();

    let first = send_request(
        &mut stream,
        &format!("GET /page.html HTTP/1.1\r\nHost: {host}\r\n\r\n"),
    )
    .await;
    assert_eq!(first.status, 200);
    let etag = first.header("etag").unwrap().to_string();

    let second = send_request(
        &mut stream,
        &format!("GET /page.html HTTP/1.1\r\nHost: {host}\r\nIf-None-Match: {etag}\r\n\r\n"),
    )
    .await;
    assert_eq!(second.status, 304);
    assert!(second.body.is_empty());
    assert_eq!(second.header("etag"), Some(etag.as_str()));

    srv.signal.request_shutdown();
}

#[tokio::test]
async fn test_gzip_round_trip_over_socket() {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let dir = tempfile::tempdir().unwrap();
    let content = "lorem ipsum dolor sit amet ".repeat(50);
    std::fs::write(dir.path().join("text.txt"), &content).unwrap();
    let srv = start_server(dir.path().to_str().unwrap());

    let mut stream = TcpStream::connect(srv.addr).await.unwrap();
    let resp = send_request(
        &mut stream,
        &format!(
            "GET /text.txt HTTP/1.1\r\nHost: {}\r\nAccept-Encoding: gzip\r\n\r\n",
            srv.addr
        ),
    )
    .await;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-encoding"), Some("gzip"));
    assert_eq!(
        resp.header("content-length").unwrap(),
        resp.body.len().to_string()
    );

    let mut decoder = GzDecoder::new(resp.body.as_slice());
    let mut decompressed = String::new();
    decoder.read_to_string(&mut decompressed).unwrap();
    assert_eq!(decompressed, content);

    srv.signal.request_shutdown();
}

#[tokio::test]
async fn test_traversal_blocked_over_socket() {
    let dir = tempfile::tempdir().unwrap();
    let srv = start_server(dir.path().to_str().unwrap());

    let mut stream = TcpStream::connect(srv.addr).await.unwrap();
    let resp = send_request(
        &mut stream,
        &format!(
            "GET /../../etc/passwd HTTP/1.1\r\nHost: {}\r\n\r\n",
            srv.addr
        ),
    )
    .await;
    assert_eq!(resp.status, 403);

    srv.signal.request_shutdown();
}

#[tokio::test]
async fn test_idle_timeout_counts_inactivity_not_connection_age() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html>ok</html>").unwrap();
    let mut config = test_config(dir.path().to_str().unwrap());
    config.server.idle_timeout_ms = 500;
    let srv = start_server_with(config);

    let mut stream = TcpStream::connect(srv.addr).await.unwrap();
    let host = srv.addr.to_string();

    // The connection outlives the timeout, but every gap between
    // requests stays inside it, so it must survive
    for _ in 0..3 {
        let resp = send_request(
            &mut stream,
            &format!("GET /index.html HTTP/1.1\r\nHost: {host}\r\n\r\n"),
        )
        .await;
        assert_eq!(resp.status, 200);
        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
    }

    // A fully quiet stretch longer than the window closes it
    tokio::time::sleep(std::time::Duration::from_millis(1_100)).await;
    let mut byte = [0u8; 1];
    let n = stream.read(&mut byte).await.unwrap_or(0);
    assert_eq!(n, 0, "server should close an idle connection");

    srv.signal.request_shutdown();
}

#[tokio::test]
async fn test_graceful_shutdown_completes() {
    let dir = tempfile::tempdir().unwrap();
    let srv = start_server(dir.path().to_str().unwrap());

    // Let the accept loop start, then ask it to stop
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    srv.signal.request_shutdown();

    tokio::time::timeout(std::time::Duration::from_secs(5), srv.handle)
        .await
        .expect("server should stop within the grace period")
        .unwrap();
}
