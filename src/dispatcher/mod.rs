//! Dispatch engine: the per-request state machine.
//!
//! A request moves through `Matching → GuardChain → Action → Responding`,
//! with `Failed` routing the captured failure into the request context's
//! classifier exactly once. Guards steer the chain with an explicit
//! [`GuardOutcome`] value — skip-the-rest and exit-now are ordinary control
//! flow here, never errors, never unwinding.
//!
//! The engine reads the routing table through an atomic pointer so a hot
//! reload can swap the whole table without a lock on the request path, and
//! runs each guard chain and action under panic recovery: a crashing action
//! costs its own request a 500, nothing more.

mod core;

pub use self::core::{DispatchEngine, GuardOutcome};
