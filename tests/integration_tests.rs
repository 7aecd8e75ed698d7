//! Integration tests for healthrelay.
//!
//! These tests run the relay listener on a real socket against mock upstreams.

use healthrelay::config::{apply_env_overrides, load_config, Config, RelayPreset};
use healthrelay::metrics::MetricsCollector;
use healthrelay::relay::{ConnectionReuse, Relay, RelaySettings, Scheme, Target};
use healthrelay::server::RelayListener;
use healthrelay::util::ShutdownSignal;
use hyper::StatusCode;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Helper to create an HTTP upstream returning a fixed status and body.
fn start_upstream(status_line: &'static str, body: &'static str) -> (SocketAddr, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
    let addr = listener.local_addr().unwrap();
    let request_count = Arc::new(AtomicU32::new(0));
    let count = Arc::clone(&request_count);

    thread::spawn(move || {
        for mut stream in listener.incoming().flatten() {
            count.fetch_add(1, Ordering::SeqCst);

            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    (addr, request_count)
}

/// Helper to create an upstream that accepts connections and never answers.
fn start_hanging_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });

    addr
}

/// Helper to create a keep-alive HTTP upstream that counts accepted connections.
///
/// Each connection is served on its own thread and answers every request on it.
fn start_keepalive_upstream() -> (SocketAddr, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
    let addr = listener.local_addr().unwrap();
    let connection_count = Arc::new(AtomicU32::new(0));
    let count = Arc::clone(&connection_count);

    thread::spawn(move || {
        for mut stream in listener.incoming().flatten() {
            count.fetch_add(1, Ordering::SeqCst);

            thread::spawn(move || {
                let mut buf = [0u8; 4096];
                loop {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {
                            let response = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n";
                            if stream.write_all(response.as_bytes()).is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        }
    });

    (addr, connection_count)
}

/// An address with nothing listening on it.
fn closed_port() -> SocketAddr {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
}

fn settings(
    target: SocketAddr,
    timeout: Duration,
    reuse: ConnectionReuse,
    parse_payload: bool,
    failure_status: StatusCode,
) -> RelaySettings {
    RelaySettings {
        target: Target::parse(&target.to_string(), Scheme::Http).unwrap(),
        timeout,
        connection_reuse: reuse,
        parse_payload,
        failure_status,
    }
}

/// Start the relay listener and return its address plus the shutdown handle.
async fn start_relay(settings: RelaySettings) -> (SocketAddr, ShutdownSignal) {
    let relay = Arc::new(Relay::new(settings).unwrap());
    let listener = RelayListener::bind(
        "127.0.0.1:0".parse().unwrap(),
        relay,
        MetricsCollector::new(),
    )
    .await
    .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = ShutdownSignal::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        listener.run(shutdown_rx).await;
    });

    (addr, shutdown)
}

async fn get(addr: SocketAddr) -> (StatusCode, String) {
    let resp = reqwest::get(format!("http://{}/", addr))
        .await
        .expect("relay did not respond");
    let status = resp.status();
    let body = resp.text().await.unwrap();
    (status, body)
}

#[tokio::test]
async fn test_json_payload_success() {
    let (upstream, count) = start_upstream(
        "200 OK",
        r#"{"userId":1,"id":1,"title":"t","completed":false}"#,
    );
    let (relay, shutdown) = start_relay(settings(
        upstream,
        Duration::from_secs(5),
        ConnectionReuse::Shared,
        true,
        StatusCode::SERVICE_UNAVAILABLE,
    ))
    .await;

    let (status, body) = get(relay).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&upstream.to_string()));
    assert!(body.contains(r#""userId":1"#));
    assert_eq!(count.load(Ordering::SeqCst), 1);

    shutdown.shutdown();
}

#[tokio::test]
async fn test_plain_success_names_target() {
    let (upstream, _) = start_upstream("200 OK", "");
    let (relay, shutdown) = start_relay(settings(
        upstream,
        Duration::from_secs(5),
        ConnectionReuse::PerRequest,
        false,
        StatusCode::INTERNAL_SERVER_ERROR,
    ))
    .await;

    let (status, body) = get(relay).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("Successfully connected"));
    assert!(body.contains(&upstream.to_string()));

    shutdown.shutdown();
}

#[tokio::test]
async fn test_bad_status_reported() {
    let (upstream, _) = start_upstream("404 Not Found", "");
    let (relay, shutdown) = start_relay(settings(
        upstream,
        Duration::from_secs(5),
        ConnectionReuse::Shared,
        true,
        StatusCode::SERVICE_UNAVAILABLE,
    ))
    .await;

    let (status, body) = get(relay).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("404"));

    shutdown.shutdown();
}

#[tokio::test]
async fn test_malformed_payload_is_503() {
    let (upstream, _) = start_upstream("200 OK", "<html>not json</html>");
    let (relay, shutdown) = start_relay(settings(
        upstream,
        Duration::from_secs(5),
        ConnectionReuse::Shared,
        true,
        StatusCode::INTERNAL_SERVER_ERROR,
    ))
    .await;

    let (status, body) = get(relay).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.starts_with("Error"));

    shutdown.shutdown();
}

#[tokio::test]
async fn test_unreachable_target() {
    let upstream = closed_port();
    let (relay, shutdown) = start_relay(settings(
        upstream,
        Duration::from_secs(2),
        ConnectionReuse::Shared,
        false,
        StatusCode::INTERNAL_SERVER_ERROR,
    ))
    .await;

    let (status, body) = get(relay).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Error"));
    assert!(body.contains(&upstream.to_string()));

    shutdown.shutdown();
}

#[tokio::test]
async fn test_hanging_target_times_out() {
    let upstream = start_hanging_upstream();
    let timeout = Duration::from_millis(300);
    let (relay, shutdown) = start_relay(settings(
        upstream,
        timeout,
        ConnectionReuse::Shared,
        false,
        StatusCode::SERVICE_UNAVAILABLE,
    ))
    .await;

    let started = Instant::now();
    let (status, body) = get(relay).await;

    assert!(started.elapsed() < timeout + Duration::from_secs(2));
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("timed out"));

    shutdown.shutdown();
}

#[tokio::test]
async fn test_repeated_requests_same_outcome() {
    let (upstream, count) = start_upstream("200 OK", "");

    for reuse in [ConnectionReuse::Shared, ConnectionReuse::PerRequest] {
        let (relay, shutdown) = start_relay(settings(
            upstream,
            Duration::from_secs(5),
            reuse,
            false,
            StatusCode::SERVICE_UNAVAILABLE,
        ))
        .await;

        for _ in 0..3 {
            let (status, _) = get(relay).await;
            assert_eq!(status, StatusCode::OK);
        }

        shutdown.shutdown();
    }

    // One outbound call per inbound request
    assert_eq!(count.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_connection_reuse_policies() {
    for (reuse, expected_connections) in [
        (ConnectionReuse::Shared, 1),
        (ConnectionReuse::PerRequest, 3),
    ] {
        let (upstream, connections) = start_keepalive_upstream();
        let relay = Relay::new(settings(
            upstream,
            Duration::from_secs(5),
            reuse,
            false,
            StatusCode::SERVICE_UNAVAILABLE,
        ))
        .unwrap();

        for _ in 0..3 {
            assert!(relay.check().await.is_success());
        }

        assert_eq!(
            connections.load(Ordering::SeqCst),
            expected_connections,
            "{:?}",
            reuse
        );
    }
}

#[tokio::test]
async fn test_env_target_drives_relay() {
    let (upstream, _) = start_upstream("200 OK", "");
    let upstream_str = upstream.to_string();

    let config = apply_env_overrides(Config::default(), |key| {
        (key == "EXTERNAL_API").then(|| upstream_str.clone())
    })
    .unwrap();
    let (relay, shutdown) = start_relay(config.relay.resolve().unwrap()).await;

    let (status, body) = get(relay).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&upstream_str));

    shutdown.shutdown();
}

#[test]
fn test_default_target_when_env_unset() {
    let config = apply_env_overrides(Config::default(), |_| None).unwrap();
    let settings = config.relay.resolve().unwrap();
    assert_eq!(settings.target.as_str(), "http://8.8.8.8");
    assert_eq!(settings.timeout, Duration::from_secs(5));
}

#[test]
fn test_config_parsing() {
    use std::io::Write as IoWrite;
    use tempfile::NamedTempFile;

    let config_content = r#"
global:
  log_level: info

server:
  listen: "127.0.0.1:0"

relay:
  preset: json
  timeout: 3s
"#;

    let mut temp_file = NamedTempFile::new().expect("failed to create temp file");
    temp_file
        .write_all(config_content.as_bytes())
        .expect("failed to write config");

    let config = load_config(temp_file.path()).expect("failed to load config");
    assert_eq!(config.relay.preset, RelayPreset::Json);

    let settings = config.relay.resolve().unwrap();
    assert!(settings.parse_payload);
    assert_eq!(settings.timeout, Duration::from_secs(3));
    assert_eq!(settings.target.url().scheme(), "https");
    assert_eq!(settings.failure_status, StatusCode::SERVICE_UNAVAILABLE);
}
