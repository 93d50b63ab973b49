//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Envelope from the dispatch queue:
//!     → supervise.rs (catch panics in handler, toolchain and proxy code)
//!     → On panic: Fault { message, trace } → error report to the client
//!     → Worker continues with the next envelope
//! ```
//!
//! # Design Decisions
//! - Every handler runs inside a failure boundary; one bad request never
//!   stops the worker
//! - Requires `panic = "unwind"` (the default); aborting panics bypass it

pub mod supervise;

pub use supervise::{Fault, Supervised};
