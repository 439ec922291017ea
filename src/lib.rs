//! Slipway: startup and listener binding for a multi-threaded HTTP server
//! engine.
//!
//! # Architecture Overview
//!
//! ```text
//!   ServerConfig ──┐
//!                  ├─► reconcile ─► bind loop ─► BoundListener(s) ─┐
//!   AddressFeed ───┘       │                                       │
//!        ▲                 └─► localhost? ─► dual-stack loopback ──┤
//!        │                                                         ▼
//!   bound addresses ◄──────────────────────────────────── ResourceStack
//!                                                           (LIFO unwind)
//!
//!   Engine (worker event loops)   ◄── start_workers, create_listener
//!   ConnectionHandler (app seam)  ◄── accepted connections
//! ```
//!
//! The crate turns address configuration into live, owned listening sockets
//! and guarantees that a failed startup releases everything it acquired, in
//! reverse acquisition order, before the error surfaces. What happens on an
//! accepted connection is entirely the [`ConnectionHandler`]'s business.

// Core subsystems
pub mod addr;
pub mod config;
pub mod engine;
pub mod server;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

mod binding;

pub use addr::endpoint::{BoundAddress, EndpointDescriptor, ListenTarget, Scheme};
pub use addr::feed::{AddressFeed, DEFAULT_SERVER_ADDRESS};
pub use config::schema::ServerConfig;
pub use engine::tokio_engine::{TokioEngine, TokioEngineFactory};
pub use engine::{
    AcceptedConnection, BindError, BoundListener, ConnectionHandler, ConnectionStream, Engine,
    EngineFactory,
};
pub use error::{EngineError, ReleaseError, StartupError};
pub use lifecycle::preflight::ErrorCodes;
pub use lifecycle::resources::{Disposable, ResourceStack};
pub use server::Server;
