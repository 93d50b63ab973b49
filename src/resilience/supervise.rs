//! Failure boundary around untrusted toolchain and handler code.
//!
//! Panics raised while polling a [`Supervised`] future are caught and
//! returned as a [`Fault`] carrying the panic message and a captured trace.
//! A process-wide panic hook records the location and backtrace of panics that
//! happen inside a supervised scope; panics elsewhere go to the previous hook.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Once;
use std::task::{Context, Poll};

static INSTALL_HOOK: Once = Once::new();

thread_local! {
    static SUPERVISED_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// A panic intercepted by the failure boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// The panic payload rendered as text.
    pub message: String,
    /// Panic location followed by the captured backtrace.
    pub trace: String,
}

impl Fault {
    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };

        let trace = LAST_TRACE
            .with(|slot| slot.borrow_mut().take())
            .unwrap_or_else(|| "<no trace captured>".to_string());

        Self { message, trace }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.message)?;
        write!(f, "{}", self.trace)
    }
}

/// Install the trace-recording panic hook. Idempotent.
pub fn install_panic_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if SUPERVISED_DEPTH.with(Cell::get) == 0 {
                previous(info);
                return;
            }

            let location = info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_default();
            let trace = format!("panicked at {}\n{}", location, Backtrace::force_capture());
            LAST_TRACE.with(|slot| *slot.borrow_mut() = Some(trace));
        }));
    });
}

/// Marks the current thread as supervised for the guard's lifetime.
struct ScopeGuard;

impl ScopeGuard {
    fn enter() -> Self {
        SUPERVISED_DEPTH.with(|depth| depth.set(depth.get() + 1));
        Self
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SUPERVISED_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Future adapter that converts a panic during any poll into a [`Fault`].
///
/// The inner future is not polled again after it panicked.
pub struct Supervised<F> {
    inner: Option<Pin<Box<F>>>,
}

impl<F: Future> Supervised<F> {
    pub fn new(future: F) -> Self {
        install_panic_hook();
        Self {
            inner: Some(Box::pin(future)),
        }
    }
}

impl<F: Future> Future for Supervised<F> {
    type Output = Result<F::Output, Fault>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(inner) = self.inner.as_mut() else {
            return Poll::Ready(Err(Fault {
                message: "supervised future polled after completion".to_string(),
                trace: String::new(),
            }));
        };

        let polled = {
            let _scope = ScopeGuard::enter();
            panic::catch_unwind(AssertUnwindSafe(|| inner.as_mut().poll(cx)))
        };

        match polled {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(value)) => {
                self.inner = None;
                Poll::Ready(Ok(value))
            }
            Err(payload) => {
                self.inner = None;
                Poll::Ready(Err(Fault::from_panic(payload)))
            }
        }
    }
}
