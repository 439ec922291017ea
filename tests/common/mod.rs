//! Shared test doubles for startup orchestration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;

use slipway::{
    AcceptedConnection, AddressFeed, BindError, BoundAddress, BoundListener, ConnectionHandler,
    Disposable, Engine, EngineError, EngineFactory, EndpointDescriptor, ErrorCodes, ListenTarget,
    ReleaseError, Server, ServerConfig,
};

/// Handler that ignores every connection.
pub struct NullHandler;

impl ConnectionHandler for NullHandler {
    fn handle(&self, _connection: AcceptedConnection) -> BoxFuture<'static, ()> {
        Box::pin(async {})
    }
}

pub fn null_handler() -> Arc<dyn ConnectionHandler> {
    Arc::new(NullHandler)
}

/// Scripted engine recording worker startups, bind attempts, and releases.
#[derive(Default)]
pub struct MockEngine {
    workers: Mutex<Vec<usize>>,
    attempts: Mutex<Vec<String>>,
    conflicts: Mutex<HashSet<SocketAddr>>,
    failures: Mutex<HashSet<SocketAddr>>,
    events: Arc<Mutex<Vec<String>>>,
    next_port: AtomicU16,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_port: AtomicU16::new(49152),
            ..Self::default()
        })
    }

    /// Script an address-in-use failure for `addr`.
    pub fn conflict_on(&self, addr: &str) {
        self.conflicts.lock().unwrap().insert(addr.parse().unwrap());
    }

    /// Script a generic bind failure for `addr`.
    pub fn fail_on(&self, addr: &str) {
        self.failures.lock().unwrap().insert(addr.parse().unwrap());
    }

    pub fn workers_started(&self) -> Vec<usize> {
        self.workers.lock().unwrap().clone()
    }

    pub fn bind_attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    /// Release events, in the order they happened.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

struct MockGuard {
    label: String,
    events: Arc<Mutex<Vec<String>>>,
}

impl Disposable for MockGuard {
    fn name(&self) -> &'static str {
        "listener"
    }

    fn release(&mut self) -> Result<(), ReleaseError> {
        self.events
            .lock()
            .unwrap()
            .push(format!("released {}", self.label));
        Ok(())
    }
}

impl Engine for MockEngine {
    fn start_workers(&self, count: usize) -> Result<(), EngineError> {
        self.workers.lock().unwrap().push(count);
        Ok(())
    }

    fn create_listener(
        &self,
        target: &ListenTarget,
        _handler: Arc<dyn ConnectionHandler>,
    ) -> Result<BoundListener, BindError> {
        match target {
            ListenTarget::Socket { endpoint, addr } => {
                self.attempts.lock().unwrap().push(addr.to_string());
                if self.conflicts.lock().unwrap().contains(addr) {
                    return Err(BindError::AddressInUse(io::Error::from(
                        io::ErrorKind::AddrInUse,
                    )));
                }
                if self.failures.lock().unwrap().contains(addr) {
                    return Err(BindError::Other(io::Error::from(
                        io::ErrorKind::PermissionDenied,
                    )));
                }
                let mut bound = *addr;
                if bound.port() == 0 {
                    bound.set_port(self.next_port.fetch_add(1, Ordering::SeqCst));
                }
                Ok(BoundListener::new(
                    endpoint.clone(),
                    BoundAddress::Tcp(bound),
                    Box::new(MockGuard {
                        label: bound.to_string(),
                        events: Arc::clone(&self.events),
                    }),
                ))
            }
            ListenTarget::Pipe { endpoint, path } => {
                let label = format!("unix:{}", path.display());
                self.attempts.lock().unwrap().push(label.clone());
                Ok(BoundListener::new(
                    endpoint.clone(),
                    BoundAddress::Pipe(path.clone()),
                    Box::new(MockGuard {
                        label,
                        events: Arc::clone(&self.events),
                    }),
                ))
            }
        }
    }

    fn shutdown(&self) {
        self.events.lock().unwrap().push("released engine".into());
    }
}

/// Factory handing out one shared mock engine, counting creations.
pub struct MockEngineFactory {
    engine: Arc<MockEngine>,
    created: Arc<AtomicUsize>,
}

impl MockEngineFactory {
    pub fn new(engine: Arc<MockEngine>) -> Self {
        Self {
            engine,
            created: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn creation_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.created)
    }
}

impl EngineFactory for MockEngineFactory {
    fn create(
        &self,
        _config: &ServerConfig,
        _codes: ErrorCodes,
    ) -> Result<Arc<dyn Engine>, EngineError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.engine) as Arc<dyn Engine>)
    }
}

/// Config with the given explicit listen addresses and a small worker pool.
pub fn config_with_listen(addresses: &[&str]) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.workers = 2;
    config.listen = addresses
        .iter()
        .map(|address| {
            address
                .parse::<EndpointDescriptor>()
                .expect("valid test address")
        })
        .collect();
    config
}

pub fn default_config() -> ServerConfig {
    config_with_listen(&[])
}

/// Server wired to the given mock engine.
pub fn server_with(engine: &Arc<MockEngine>, config: ServerConfig, feed: &AddressFeed) -> Server {
    Server::with_engine(
        config,
        feed.clone(),
        Box::new(MockEngineFactory::new(Arc::clone(engine))),
    )
}
