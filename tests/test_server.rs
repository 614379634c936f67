//! End-to-end tests against a real listening socket

mod common;

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use common::{NOT_FOUND_PAGE, TempRoot, split_response};
use docroot::config::Config;
use docroot::error::ServerError;
use docroot::server::Server;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

fn test_config(root: &TempRoot) -> Config {
    let mut cfg = Config::default();
    cfg.server.host = "127.0.0.1".to_string();
    cfg.server.port = 0;
    cfg.static_files.document_root = root.path().to_path_buf();
    cfg
}

async fn start(cfg: Config) -> SocketAddr {
    let server = Server::bind(&cfg).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.serve());
    addr
}

async fn send(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();

    let mut out = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut out))
        .await
        .expect("server did not close the connection")
        .unwrap();
    out
}

#[tokio::test]
async fn test_server_serves_file() {
    let root = TempRoot::new();
    root.write("index.html", b"<h1>Hi</h1>\n");
    let addr = start(test_config(&root)).await;

    let out = send(addr, b"GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    let (head, body) = split_response(&out);

    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(head.contains("Content-Length: 12\r\n"));
    assert_eq!(body, b"<h1>Hi</h1>\n".to_vec());
}

#[tokio::test]
async fn test_server_missing_file() {
    let root = TempRoot::new();
    let addr = start(test_config(&root)).await;

    let out = send(addr, b"GET /missing.txt HTTP/1.1\r\n\r\n").await;
    let (head, body) = split_response(&out);

    assert!(head.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert_eq!(body, NOT_FOUND_PAGE.as_bytes().to_vec());
}

#[tokio::test]
async fn test_server_post_is_501() {
    let root = TempRoot::new();
    root.write("index.html", b"<h1>Hi</h1>");
    let addr = start(test_config(&root)).await;

    let out = send(addr, b"POST /index.html HTTP/1.1\r\n\r\n").await;
    assert!(out.starts_with(b"HTTP/1.1 501 Not Implemented\r\n"));
}

#[tokio::test]
async fn test_server_empty_line_gets_nothing() {
    let root = TempRoot::new();
    let addr = start(test_config(&root)).await;

    let out = send(addr, b"\r\n").await;
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_server_survives_bad_clients() {
    let root = TempRoot::new();
    root.write("a.txt", b"still here");
    let addr = start(test_config(&root)).await;

    assert!(send(addr, b"GARBAGE\r\n").await.is_empty());

    // Client that disconnects without sending anything
    drop(TcpStream::connect(addr).await.unwrap());

    let out = send(addr, b"GET /a.txt HTTP/1.1\r\n\r\n").await;
    let (_, body) = split_response(&out);
    assert_eq!(body, b"still here".to_vec());
}

#[tokio::test]
async fn test_server_idempotent_responses() {
    let root = TempRoot::new();
    root.write("file.txt", b"same bytes every time");
    let addr = start(test_config(&root)).await;

    let first = send(addr, b"GET /file.txt HTTP/1.1\r\n\r\n").await;
    for _ in 0..5 {
        let again = send(addr, b"GET /file.txt HTTP/1.1\r\n\r\n").await;
        assert_eq!(again, first);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_server_concurrent_clients() {
    const CLIENTS: usize = 16;

    let root = TempRoot::new();
    let mut expected = Vec::new();
    for i in 0..CLIENTS {
        let contents: Vec<u8> = (0..50_000usize).map(|j| ((i * 31 + j) % 256) as u8).collect();
        root.write(&format!("file{}.bin", i), &contents);
        expected.push(contents);
    }
    let addr = start(test_config(&root)).await;

    let mut handles = Vec::new();
    for i in 0..CLIENTS {
        handles.push(tokio::spawn(async move {
            let request = format!("GET /file{}.bin HTTP/1.1\r\n\r\n", i);
            send(addr, request.as_bytes()).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let out = handle.await.unwrap();
        let (head, body) = split_response(&out);
        assert!(head.contains("Content-Length: 50000\r\n"));
        assert_eq!(body, expected[i], "client {} got corrupted content", i);
    }
}

#[tokio::test]
async fn test_server_stalled_client_does_not_block_others() {
    let root = TempRoot::new();
    root.write("a.txt", b"ok");
    let addr = start(test_config(&root)).await;

    // Connects and never sends a request line
    let _stalled = TcpStream::connect(addr).await.unwrap();

    let out = send(addr, b"GET /a.txt HTTP/1.1\r\n\r\n").await;
    assert!(out.starts_with(b"HTTP/1.1 200 OK\r\n"));
}

/// Time for a second client to be served while a silent client is connected
async fn served_after_stalled_client(cfg: Config) -> Duration {
    let addr = start(cfg).await;

    // Sends nothing; its handler lives until the read deadline expires
    let stalled = TcpStream::connect(addr).await.unwrap();

    let started = Instant::now();
    let out = send(addr, b"GET /a.txt HTTP/1.1\r\n\r\n").await;
    let elapsed = started.elapsed();
    assert!(out.starts_with(b"HTTP/1.1 200 OK\r\n"));

    drop(stalled);
    elapsed
}

#[tokio::test]
async fn test_server_connection_limit_waits_for_free_slot() {
    let root = TempRoot::new();
    root.write("a.txt", b"ok");
    let mut cfg = test_config(&root);
    cfg.server.max_connections = Some(1);
    cfg.server.read_timeout_secs = Some(1);

    let elapsed = served_after_stalled_client(cfg).await;
    assert!(
        elapsed >= Duration::from_millis(800),
        "second client served after {:?} while the only slot was taken",
        elapsed
    );
}

#[tokio::test]
async fn test_server_without_limit_serves_immediately() {
    let root = TempRoot::new();
    root.write("a.txt", b"ok");
    let mut cfg = test_config(&root);
    cfg.server.read_timeout_secs = Some(1);

    let elapsed = served_after_stalled_client(cfg).await;
    assert!(
        elapsed < Duration::from_millis(800),
        "unbounded server waited {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_server_zero_connection_limit_rejected() {
    let root = TempRoot::new();
    let mut cfg = test_config(&root);
    cfg.server.max_connections = Some(0);

    let result = Server::bind(&cfg).await;
    assert!(matches!(result, Err(ServerError::Config(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_server_survives_client_dropping_mid_transfer() {
    let root = TempRoot::new();
    root.write("big.bin", &vec![b'z'; 8 * 1024 * 1024]);
    root.write("a.txt", b"still serving");
    let addr = start(test_config(&root)).await;

    let mut quitter = TcpStream::connect(addr).await.unwrap();
    quitter
        .write_all(b"GET /big.bin HTTP/1.1\r\n\r\n")
        .await
        .unwrap();
    let mut first = [0u8; 64];
    quitter.read_exact(&mut first).await.unwrap();
    assert!(first.starts_with(b"HTTP/1.1 200 OK\r\n"));
    drop(quitter);

    let out = send(addr, b"GET /a.txt HTTP/1.1\r\n\r\n").await;
    let (head, body) = split_response(&out);
    assert!(head.starts_with("HTTP/1.1 200 OK\r\n"));
    assert_eq!(body, b"still serving".to_vec());
}

#[tokio::test]
async fn test_bind_failure() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let root = TempRoot::new();
    let mut cfg = test_config(&root);
    cfg.server.port = port;

    let result = Server::bind(&cfg).await;
    assert!(matches!(result, Err(ServerError::Bind { .. })));
}

#[tokio::test]
async fn test_run_returns_bind_failure_to_caller() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();

    let root = TempRoot::new();
    let mut cfg = test_config(&root);
    cfg.server.port = port;

    let err = docroot::server::run(&cfg).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ServerError>(),
        Some(ServerError::Bind { .. })
    ));
}
