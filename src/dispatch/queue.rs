//! The dispatch queue: many connection read loops in, one worker out.
//!
//! Unbounded, so a push never waits. Depth is tracked for the status
//! endpoint and metrics, and a warning is logged each time it rises to the
//! configured threshold.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::dispatch::envelope::Envelope;
use crate::observability::metrics;

/// The worker has stopped; the envelope could not be queued.
#[derive(Debug, Error)]
#[error("dispatch queue closed")]
pub struct QueueClosed(pub Envelope);

#[derive(Debug)]
struct QueueState {
    depth: AtomicUsize,
    warn_depth: AtomicUsize,
}

/// Producer side, cloned into every connection.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    tx: mpsc::UnboundedSender<Envelope>,
    state: Arc<QueueState>,
}

/// Consumer side, owned by the worker.
#[derive(Debug)]
pub struct DispatchReceiver {
    rx: mpsc::UnboundedReceiver<Envelope>,
    state: Arc<QueueState>,
}

/// Create a connected queue pair.
pub fn channel(warn_depth: usize) -> (DispatchQueue, DispatchReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let state = Arc::new(QueueState {
        depth: AtomicUsize::new(0),
        warn_depth: AtomicUsize::new(warn_depth),
    });

    (
        DispatchQueue {
            tx,
            state: Arc::clone(&state),
        },
        DispatchReceiver { rx, state },
    )
}

impl DispatchQueue {
    /// Append an envelope. Never blocks.
    pub fn push(&self, envelope: Envelope) -> Result<(), QueueClosed> {
        // Counted before sending so the receiver can never observe a negative depth.
        let depth = self.state.depth.fetch_add(1, Ordering::SeqCst) + 1;

        if let Err(mpsc::error::SendError(envelope)) = self.tx.send(envelope) {
            self.state.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueClosed(envelope));
        }

        // Gauge moves by deltas so concurrent push and pop commute.
        metrics::queue_entered();
        if depth == self.state.warn_depth.load(Ordering::Relaxed) {
            tracing::warn!(depth, "Dispatch queue backlog reached warning threshold");
        }
        Ok(())
    }

    /// Envelopes queued and not yet taken by the worker.
    pub fn depth(&self) -> usize {
        self.state.depth.load(Ordering::SeqCst)
    }

    pub fn set_warn_depth(&self, warn_depth: usize) {
        self.state.warn_depth.store(warn_depth, Ordering::Relaxed);
    }
}

impl DispatchReceiver {
    /// Wait for the next envelope in arrival order.
    ///
    /// Returns `None` once every producer is gone and the queue is drained.
    pub async fn next(&mut self) -> Option<Envelope> {
        let envelope = self.rx.recv().await?;
        self.state.depth.fetch_sub(1, Ordering::SeqCst);
        metrics::queue_left();
        Some(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::envelope::{Payload, RequestKind};
    use crate::dispatch::writer::ConnectionHandle;
    use crate::net::ConnectionId;

    fn envelope(source: &str) -> Envelope {
        let (origin, _rx) = ConnectionHandle::new(ConnectionId::new());
        Envelope::new(RequestKind::Format, Payload::Source(source.to_string()), origin)
    }

    #[tokio::test]
    async fn test_fifo_and_depth() {
        let (queue, mut receiver) = channel(100);

        queue.push(envelope("a")).unwrap();
        queue.clone().push(envelope("b")).unwrap();
        assert_eq!(queue.depth(), 2);

        assert_eq!(receiver.next().await.unwrap().payload, Payload::Source("a".to_string()));
        assert_eq!(queue.depth(), 1);
        assert_eq!(receiver.next().await.unwrap().payload, Payload::Source("b".to_string()));
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn test_closed_when_producers_gone() {
        let (queue, mut receiver) = channel(100);
        queue.push(envelope("last")).unwrap();
        drop(queue);

        assert!(receiver.next().await.is_some());
        assert!(receiver.next().await.is_none());
    }

    #[derive(Default)]
    struct GaugeRecorder {
        depth: Arc<std::sync::atomic::AtomicU64>,
    }

    impl ::metrics::Recorder for GaugeRecorder {
        fn describe_counter(&self, _: ::metrics::KeyName, _: Option<::metrics::Unit>, _: ::metrics::SharedString) {}
        fn describe_gauge(&self, _: ::metrics::KeyName, _: Option<::metrics::Unit>, _: ::metrics::SharedString) {}
        fn describe_histogram(&self, _: ::metrics::KeyName, _: Option<::metrics::Unit>, _: ::metrics::SharedString) {}

        fn register_counter(&self, _: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Counter {
            ::metrics::Counter::noop()
        }

        fn register_gauge(&self, key: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Gauge {
            assert_eq!(key.name(), "playground_queue_depth");
            ::metrics::Gauge::from_arc(Arc::clone(&self.depth))
        }

        fn register_histogram(&self, _: &::metrics::Key, _: &::metrics::Metadata<'_>) -> ::metrics::Histogram {
            ::metrics::Histogram::noop()
        }
    }

    #[test]
    fn test_depth_gauge_follows_queue() {
        let recorder = GaugeRecorder::default();
        let gauge = || f64::from_bits(recorder.depth.load(Ordering::SeqCst));
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();

        ::metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let (queue, mut receiver) = channel(100);
                for source in ["a", "b", "c"] {
                    queue.push(envelope(source)).unwrap();
                }
                assert_eq!(gauge(), 3.0);

                receiver.next().await.unwrap();
                queue.push(envelope("d")).unwrap();
                receiver.next().await.unwrap();
                assert_eq!(gauge(), 2.0);
                assert_eq!(gauge(), queue.depth() as f64);

                drop(receiver);
                assert!(queue.push(envelope("e")).is_err());
                assert_eq!(gauge(), 2.0);
            })
        });
    }

    #[test]
    fn test_push_after_worker_stopped() {
        let (queue, receiver) = channel(100);
        drop(receiver);

        let err = queue.push(envelope("x")).unwrap_err();
        assert_eq!(err.0.payload, Payload::Source("x".to_string()));
        assert_eq!(queue.depth(), 0);
    }
}
