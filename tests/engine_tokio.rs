//! Smoke tests for the tokio engine over real sockets.

mod common;

use std::io::Read;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::io::AsyncWriteExt;

use slipway::{
    AcceptedConnection, AddressFeed, ConnectionHandler, ConnectionStream, Server, StartupError,
};

/// Writes a greeting and closes the connection.
struct GreetingHandler;

impl ConnectionHandler for GreetingHandler {
    fn handle(&self, connection: AcceptedConnection) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            match connection.into_stream() {
                ConnectionStream::Tcp(mut stream) => {
                    let _ = stream.write_all(b"hello").await;
                    let _ = stream.shutdown().await;
                }
                #[cfg(unix)]
                ConnectionStream::Unix(mut stream) => {
                    let _ = stream.write_all(b"hello").await;
                    let _ = stream.shutdown().await;
                }
            }
        })
    }
}

fn bound_port(address: &str) -> u16 {
    address
        .rsplit(':')
        .next()
        .and_then(|port| port.parse().ok())
        .unwrap_or_else(|| panic!("no port in {address}"))
}

#[test]
fn binds_an_ephemeral_port_and_serves_connections() {
    let feed = AddressFeed::new();
    let mut server = Server::new(
        common::config_with_listen(&["http://127.0.0.1:0"]),
        feed.clone(),
    );
    server.start(Arc::new(GreetingHandler)).unwrap();

    let addresses = feed.addresses();
    assert_eq!(addresses.len(), 1);
    let port = bound_port(&addresses[0]);
    assert_ne!(port, 0);

    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut greeting = String::new();
    stream.read_to_string(&mut greeting).unwrap();
    assert_eq!(greeting, "hello");

    server.shutdown();
    assert!(!server.is_running());
}

#[test]
fn a_second_bind_of_the_same_port_reports_address_in_use() {
    let feed = AddressFeed::new();
    let mut first = Server::new(
        common::config_with_listen(&["http://127.0.0.1:0"]),
        feed.clone(),
    );
    first.start(Arc::new(GreetingHandler)).unwrap();
    let port = bound_port(&feed.addresses()[0]);

    let address = format!("http://127.0.0.1:{port}");
    let mut second = Server::new(
        common::config_with_listen(&[address.as_str()]),
        AddressFeed::new(),
    );
    let error = second.start(Arc::new(GreetingHandler)).unwrap_err();

    match error {
        StartupError::AddressInUse { endpoint, .. } => {
            assert!(endpoint.contains(&port.to_string()), "endpoint: {endpoint}");
        }
        other => panic!("expected AddressInUse, got {other:?}"),
    }
    assert!(!second.is_running());
    assert!(first.is_running());

    first.shutdown();
}

#[cfg(unix)]
#[test]
fn binds_a_unix_socket_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slipway.sock");
    let address = format!("unix:{}", path.display());

    let feed = AddressFeed::from_addresses([address.clone()]);
    let mut server = Server::new(common::default_config(), feed.clone());
    server.start(Arc::new(GreetingHandler)).unwrap();

    assert_eq!(feed.addresses(), vec![address]);
    assert!(path.exists());

    let mut stream = std::os::unix::net::UnixStream::connect(&path).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut greeting = String::new();
    stream.read_to_string(&mut greeting).unwrap();
    assert_eq!(greeting, "hello");

    server.shutdown();
    assert!(!path.exists(), "socket file should be removed on release");
}
