//! Error types for server startup and teardown.

use std::io;
use thiserror::Error;

use crate::addr::parser::AddressParseError;

/// Terminal error for a failed startup attempt.
///
/// Every variant produced after resource acquisition has begun is surfaced
/// only after the resource stack has been fully unwound, so a failed startup
/// never leaks a handle.
#[derive(Debug, Error)]
pub enum StartupError {
    /// A configuration invariant was violated before any resource was touched.
    #[error("invalid server options: {0}")]
    InvalidOptions(String),

    /// The platform cannot run this server at all.
    #[error("platform unsupported: {0}")]
    PlatformUnsupported(&'static str),

    /// A startup was attempted while a previous one still holds resources.
    #[error("server has already been started")]
    AlreadyStarted,

    /// An endpoint conflicts with an existing listener on this host.
    #[error("address already in use: {endpoint}")]
    AddressInUse {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Any other bind-time failure.
    #[error("failed to bind {endpoint}")]
    Bind {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Both loopback families failed to bind for a localhost endpoint.
    #[error(
        "failed to bind {endpoint} on both loopback interfaces \
         (IPv4: {ipv4_error}; IPv6: {ipv6_error})"
    )]
    LoopbackBindFailed {
        endpoint: String,
        ipv4_error: io::Error,
        ipv6_error: io::Error,
    },

    /// Dynamic port selection cannot be combined with a localhost endpoint:
    /// the two address families would be assigned different ports.
    #[error("dynamic port binding (port 0) is not supported for {endpoint}")]
    DynamicPortOnLocalhost { endpoint: String },

    /// The bind loop completed without producing a single listener.
    #[error("no listening endpoints were configured")]
    NoListeners,

    /// A malformed address string was supplied through the address feed.
    #[error("invalid listen address '{address}'")]
    Parse {
        address: String,
        #[source]
        source: AddressParseError,
    },

    /// The worker engine failed to come up.
    #[error("engine failed to start")]
    Engine(#[from] EngineError),
}

/// Failure raised by the worker engine outside of individual binds.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start worker threads: {0}")]
    Workers(#[source] io::Error),

    #[error("failed to start background services: {0}")]
    Background(#[source] io::Error),

    #[error("workers have not been started")]
    WorkersNotStarted,
}

/// Failure releasing a single resource during unwind.
///
/// Unwinding logs these and keeps going; a failed release never blocks the
/// releases behind it.
#[derive(Debug, Error)]
#[error("failed to release {resource}: {message}")]
pub struct ReleaseError {
    pub resource: &'static str,
    pub message: String,
}
