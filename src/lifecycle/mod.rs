//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     preflight (platform checks) → resource stack opens
//!     → engine + heartbeat acquired → listeners bound
//!
//! Shutdown:
//!     stack unwinds, most recently acquired first
//!     → listeners close before the heartbeat, heartbeat before the engine
//! ```
//!
//! # Design Decisions
//! - The resource stack is the only record of "started"; no parallel flag
//! - Release order is strict reverse of acquisition order
//! - A failed release never blocks the releases behind it

pub mod heartbeat;
pub mod preflight;
pub mod resources;
