//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout, remote)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging with named fields for machine parsing
//! - Metric updates are cheap no-ops until a recorder is installed
//! - The exposition endpoint is optional and bound only when enabled

pub mod logging;
pub mod metrics;
