//! Address model subsystem.
//!
//! # Data Flow
//! ```text
//! address string ("http://host:port/base", "unix:/path")
//!     → parser.rs (shape recognition, no I/O)
//!     → endpoint.rs (EndpointDescriptor → ListenTarget resolution)
//!
//! feed.rs holds the externally supplied address strings the server
//! consumes when nothing is configured explicitly, and receives the
//! final bound addresses back.
//! ```
//!
//! # Design Decisions
//! - Parsing is pure and deterministic; resolution never hits DNS
//! - `localhost` is a logical case, not an IP literal
//! - Unrecognized shapes are errors, never silently skipped

pub mod endpoint;
pub mod feed;
pub mod parser;

pub use endpoint::{BoundAddress, EndpointDescriptor, ListenTarget, Scheme};
pub use feed::{AddressFeed, DEFAULT_SERVER_ADDRESS};
