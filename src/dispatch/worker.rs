//! The single dispatch worker.
//!
//! # Responsibilities
//! - Take envelopes in arrival order, one at a time
//! - Route each to exactly one handler and wait for it to finish
//! - Turn faults into error reports and keep going
//! - Write the response back to the originating connection
//!
//! # Design Decisions
//! - Exactly one worker: handlers never run concurrently, and a slow
//!   execute delays everything queued behind it
//! - Envelopes from connections that already closed are still processed;
//!   the response is discarded by the writer
//! - Handlers are read from an `ArcSwap` per envelope so reloads apply to
//!   the next dispatch, never to one in progress

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use tokio::sync::broadcast;
use tracing::Instrument;

use crate::dispatch::envelope::{Envelope, Payload, RequestKind};
use crate::dispatch::queue::DispatchReceiver;
use crate::dispatch::response::{ErrorReport, Response};
use crate::handlers::{Handlers, Outcome};
use crate::observability::metrics;
use crate::resilience::supervise::Supervised;

/// Consumer of the dispatch queue.
pub struct Worker {
    queue: DispatchReceiver,
    handlers: Arc<ArcSwap<Handlers>>,
}

impl Worker {
    pub fn new(queue: DispatchReceiver, handlers: Arc<ArcSwap<Handlers>>) -> Self {
        Self { queue, handlers }
    }

    /// Process envelopes until the queue closes or shutdown is signalled.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!("Dispatch worker started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Dispatch worker received shutdown signal");
                    break;
                }
                next = self.queue.next() => match next {
                    Some(envelope) => self.dispatch(envelope).await,
                    None => {
                        tracing::info!("Dispatch queue closed");
                        break;
                    }
                },
            }
        }

        tracing::info!("Dispatch worker stopped");
    }

    /// Process one envelope and deliver its response, if any.
    pub async fn dispatch(&self, envelope: Envelope) {
        let span = tracing::info_span!(
            "dispatch",
            request_id = %envelope.id,
            connection_id = %envelope.origin.id(),
            kind = envelope.kind.as_str(),
        );

        async {
            let origin = envelope.origin.clone();
            if let Some(response) = self.process(envelope).await {
                origin.send(response);
            }
        }
        .instrument(span)
        .await
    }

    /// Compute the response for one envelope without sending it.
    ///
    /// Returns `None` for unrecognized request kinds.
    pub async fn process(&self, envelope: Envelope) -> Option<Response> {
        let Envelope { kind, payload, .. } = envelope;

        if let RequestKind::Unrecognized(name) = &kind {
            tracing::debug!(kind = %name, "Ignoring unrecognized request kind");
            return None;
        }

        let source = match payload {
            Payload::Source(source) => source,
            Payload::Malformed(reason) => {
                tracing::debug!(reason = %reason, "Malformed request");
                metrics::record_request(kind.label(), "malformed", Instant::now());
                return Some(Response::error(kind.as_str(), ErrorReport::Single(reason)));
            }
        };

        let start = Instant::now();
        let handlers = self.handlers.load_full();
        let outcome = match Supervised::new(route(&handlers, &kind, source)).await {
            Ok(outcome) => outcome,
            Err(fault) => Outcome::Faulted(fault),
        };
        metrics::record_request(kind.label(), outcome.label(), start);

        let response = match outcome {
            Outcome::Ok(value) => Response::new(kind.as_str(), value),
            Outcome::Rejected(report) => Response::error(kind.as_str(), report),
            Outcome::Faulted(fault) => {
                tracing::error!(error = %fault.message, "Handler panicked");
                metrics::record_fault(kind.label());
                Response::error(kind.as_str(), ErrorReport::from(fault))
            }
        };

        tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, "Request handled");
        Some(response)
    }
}

async fn route(handlers: &Handlers, kind: &RequestKind, source: String) -> Outcome {
    match kind {
        RequestKind::Format => handlers.format(source).await,
        RequestKind::Translate => handlers.translate(source).await,
        RequestKind::Execute => handlers.execute(source).await,
        RequestKind::Unrecognized(name) => {
            Outcome::Rejected(ErrorReport::Single(format!("unrecognized request kind '{}'", name)))
        }
    }
}
