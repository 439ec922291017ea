//! Address reconciliation and listener binding.
//!
//! # Data Flow
//! ```text
//! explicit endpoints ─┐
//!                     ├─► reconcile (plan.rs) ─► bind loop (plan.rs)
//! address feed ───────┘                              │
//!                                                    └─► localhost entries
//!                                                        ─► loopback.rs
//! ```
//!
//! # Design Decisions
//! - Explicit endpoints always win; the feed is drained either way
//! - Binds are sequential on the startup thread; no retries
//! - Every listener is registered with the resource stack the moment it
//!   exists, so a later failure unwinds everything bound so far

pub mod loopback;
pub mod plan;
