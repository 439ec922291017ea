//! Worker engine abstraction.
//!
//! # Data Flow
//! ```text
//! Server::start
//!     → EngineFactory::create (once per attempt)
//!     → Engine::start_workers (worker event loops, before any bind)
//!     → Engine::create_listener (one endpoint at a time)
//!         → BoundListener (owned handle, pushed into the resource stack)
//!             → ConnectionHandler::handle (per accepted connection)
//! ```
//!
//! # Design Decisions
//! - The engine is a trait object so tests can substitute a scripted engine
//! - Address-in-use is reported distinctly only when the platform preflight
//!   pinned down the error code
//! - The handler seam carries no HTTP semantics, only accepted connections

pub mod tokio_engine;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::addr::endpoint::{BoundAddress, EndpointDescriptor, ListenTarget};
use crate::config::schema::ServerConfig;
use crate::error::{EngineError, ReleaseError};
use crate::lifecycle::preflight::ErrorCodes;
use crate::lifecycle::resources::Disposable;

/// Failure binding one endpoint.
#[derive(Debug, Error)]
pub enum BindError {
    /// The endpoint conflicts with an existing listener on this host.
    #[error("address in use")]
    AddressInUse(#[source] io::Error),

    /// Any other bind-time failure.
    #[error(transparent)]
    Other(io::Error),
}

impl BindError {
    /// Classify an I/O error using the preflighted platform codes.
    pub fn classify(err: io::Error, codes: &ErrorCodes) -> Self {
        if codes.is_addr_in_use(&err) {
            BindError::AddressInUse(err)
        } else {
            BindError::Other(err)
        }
    }
}

/// A connection accepted by a listener, handed to the application seam.
pub struct AcceptedConnection {
    stream: ConnectionStream,
    peer: Option<SocketAddr>,
}

impl AcceptedConnection {
    pub fn from_tcp(stream: tokio::net::TcpStream, peer: SocketAddr) -> Self {
        Self {
            stream: ConnectionStream::Tcp(stream),
            peer: Some(peer),
        }
    }

    #[cfg(unix)]
    pub fn from_unix(stream: tokio::net::UnixStream) -> Self {
        Self {
            stream: ConnectionStream::Unix(stream),
            peer: None,
        }
    }

    /// Remote address, when the transport has one.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn into_stream(self) -> ConnectionStream {
        self.stream
    }
}

/// The transport an accepted connection arrived over.
pub enum ConnectionStream {
    Tcp(tokio::net::TcpStream),
    #[cfg(unix)]
    Unix(tokio::net::UnixStream),
}

/// Application-side processing of accepted connections.
///
/// The startup core is agnostic to what the handler does with a connection;
/// it only requires that one exists and can produce per-connection work.
pub trait ConnectionHandler: Send + Sync + 'static {
    fn handle(&self, connection: AcceptedConnection) -> BoxFuture<'static, ()>;
}

/// An owned, live listening socket and the endpoint it was bound from.
///
/// Releasing the handle closes the underlying OS resource exactly once.
pub struct BoundListener {
    endpoint: EndpointDescriptor,
    address: BoundAddress,
    guard: Option<Box<dyn Disposable>>,
}

impl BoundListener {
    pub fn new(
        endpoint: EndpointDescriptor,
        address: BoundAddress,
        guard: Box<dyn Disposable>,
    ) -> Self {
        Self {
            endpoint,
            address,
            guard: Some(guard),
        }
    }

    pub fn endpoint(&self) -> &EndpointDescriptor {
        &self.endpoint
    }

    pub fn address(&self) -> &BoundAddress {
        &self.address
    }

    /// Address in the form published to the hosting caller, with an
    /// ephemeral port resolved to the assigned one.
    pub fn published_address(&self) -> String {
        match &self.address {
            BoundAddress::Tcp(addr) => self.endpoint.display_with_port(addr.port()),
            BoundAddress::Pipe(path) => format!("unix:{}", path.display()),
        }
    }
}

impl Disposable for BoundListener {
    fn name(&self) -> &'static str {
        "listener"
    }

    fn release(&mut self) -> Result<(), ReleaseError> {
        match self.guard.take() {
            Some(mut guard) => guard.release(),
            None => Ok(()),
        }
    }
}

/// The multi-threaded execution engine listeners are created against.
///
/// Workers share incoming-connection handling for every listener created
/// against the same engine.
pub trait Engine: Send + Sync {
    /// Spin up `count` worker event loops. Called exactly once per startup
    /// attempt, before any listener is created.
    fn start_workers(&self, count: usize) -> Result<(), EngineError>;

    /// Bind one concrete endpoint and return the owned handle.
    fn create_listener(
        &self,
        target: &ListenTarget,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<BoundListener, BindError>;

    /// Tear down workers and engine-wide state. Idempotent.
    fn shutdown(&self);
}

/// Constructs the engine for one startup attempt.
pub trait EngineFactory: Send {
    fn create(
        &self,
        config: &ServerConfig,
        codes: ErrorCodes,
    ) -> Result<Arc<dyn Engine>, EngineError>;
}

/// Ledger entry owning the engine handle; released last during unwind.
pub(crate) struct EngineResource(pub(crate) Arc<dyn Engine>);

impl Disposable for EngineResource {
    fn name(&self) -> &'static str {
        "engine"
    }

    fn release(&mut self) -> Result<(), ReleaseError> {
        self.0.shutdown();
        Ok(())
    }
}
