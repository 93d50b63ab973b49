//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! connection read loops (many)
//!     → envelope.rs (decode {type, value}, tag with origin)
//!     → queue.rs (unbounded FIFO, depth tracking)
//!     → worker.rs (single consumer, failure boundary)
//!     → handlers (format / translate / execute)
//!     → response.rs (typed result or error report)
//!     → writer.rs (back to the originating connection)
//! ```
//!
//! # Design Decisions
//! - Global FIFO: one worker, one envelope at a time
//! - One response per recognized envelope, none for unrecognized kinds
//! - Only the worker writes responses, so per-connection writes need no lock

pub mod envelope;
pub mod queue;
pub mod response;
pub mod worker;
pub mod writer;

pub use envelope::{ClientMessage, Envelope, Payload, RequestKind};
pub use queue::{DispatchQueue, DispatchReceiver, QueueClosed};
pub use response::{ErrorReport, Response, ResponseValue};
pub use worker::Worker;
pub use writer::ConnectionHandle;
