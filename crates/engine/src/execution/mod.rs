//! Execution handles and the protocol adapter that awaits them.
//!
//! Backends trigger query execution in one of three ways: they hand back a
//! value that is already resolved, a future to be polled once, or a stream
//! that reports through next/error/complete callbacks. [`ExecutionHandle`]
//! captures all three and [`await_handle`] turns any of them into a single
//! `Option<Value>`.

mod adapter;

use std::{
    fmt,
    future::Future,
    sync::{Arc, Mutex, PoisonError},
};

use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::BackendError;

pub use adapter::await_handle;

/// Handle returned by a query's execution entry point.
pub enum ExecutionHandle {
    /// The response is already available.
    Eager(Result<Value, BackendError>),
    /// The response arrives later.
    Deferred(Deferred),
}

/// The two deferred completion protocols.
pub enum Deferred {
    /// A single continuation, modelled as a boxed future.
    Thenable(BoxFuture<'static, Result<Value, BackendError>>),
    /// A subscription source delivering values through an [`Observer`].
    Subscription(Box<dyn Subscribe>),
}

impl ExecutionHandle {
    pub fn ready(value: Value) -> Self {
        Self::Eager(Ok(value))
    }

    pub fn failed(error: BackendError) -> Self {
        Self::Eager(Err(error))
    }

    pub fn thenable<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, BackendError>> + Send + 'static,
    {
        Self::Deferred(Deferred::Thenable(Box::pin(future)))
    }

    pub fn subscription(source: impl Subscribe + 'static) -> Self {
        Self::Deferred(Deferred::Subscription(Box::new(source)))
    }

    /// Short protocol name used in logs.
    pub fn protocol(&self) -> &'static str {
        match self {
            Self::Eager(_) => "eager",
            Self::Deferred(Deferred::Thenable(_)) => "thenable",
            Self::Deferred(Deferred::Subscription(_)) => "subscription",
        }
    }
}

impl fmt::Debug for ExecutionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExecutionHandle").field(&self.protocol()).finish()
    }
}

/// A stream-style source that starts delivering once subscribed.
///
/// Implementations may call the observer synchronously from inside
/// `subscribe`, or later from another task or thread.
pub trait Subscribe: Send {
    fn subscribe(self: Box<Self>, observer: Observer) -> Box<dyn Subscription>;
}

impl<F> Subscribe for F
where
    F: FnOnce(Observer) -> Box<dyn Subscription> + Send,
{
    fn subscribe(self: Box<Self>, observer: Observer) -> Box<dyn Subscription> {
        (*self)(observer)
    }
}

/// Registration returned by [`Subscribe::subscribe`].
pub trait Subscription: Send {
    /// Releases the underlying stream registration.
    fn unsubscribe(&mut self);
}

/// Subscription with nothing to release.
pub struct NoopSubscription;

impl Subscription for NoopSubscription {
    fn unsubscribe(&mut self) {}
}

/// Callback sink handed to a [`Subscribe`] source.
///
/// The first event wins: a `next` value, an `error`, or `complete` settles
/// the observer, and every later event is ignored.
#[derive(Clone)]
pub struct Observer {
    latch: Arc<Latch>,
}

impl Observer {
    pub(crate) fn new(sender: oneshot::Sender<Option<Value>>) -> Self {
        Self {
            latch: Arc::new(Latch {
                sender: Mutex::new(Some(sender)),
            }),
        }
    }

    /// Delivers a value. Returns whether this event settled the observer.
    pub fn next(&self, value: Value) -> bool {
        self.latch.release(Some(value))
    }

    /// Reports a failure. Settles with no value if nothing arrived yet.
    pub fn error(&self, error: BackendError) -> bool {
        let settled = self.latch.release(None);
        if settled {
            debug!(%error, "subscription errored before delivering a value");
        }
        settled
    }

    /// Reports the end of the stream. Settles with no value if nothing arrived yet.
    pub fn complete(&self) -> bool {
        self.latch.release(None)
    }

    /// True once any terminal event has been honoured.
    pub fn is_settled(&self) -> bool {
        self.latch.sender.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").field("settled", &self.is_settled()).finish()
    }
}

struct Latch {
    sender: Mutex<Option<oneshot::Sender<Option<Value>>>>,
}

impl Latch {
    fn release(&self, outcome: Option<Value>) -> bool {
        let sender = self.sender.lock().unwrap_or_else(PoisonError::into_inner).take();
        match sender {
            Some(sender) => {
                // The receiver is gone after a timeout; nothing left to settle.
                let _ = sender.send(outcome);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn observer_honours_only_the_first_event() {
        let (sender, mut receiver) = oneshot::channel();
        let observer = Observer::new(sender);

        assert!(observer.next(json!(1)));
        assert!(!observer.next(json!(2)));
        assert!(!observer.complete());
        assert!(observer.is_settled());
        assert_eq!(receiver.try_recv().expect("settled"), Some(json!(1)));
    }

    #[test]
    fn complete_before_next_settles_without_value() {
        let (sender, mut receiver) = oneshot::channel();
        let observer = Observer::new(sender);

        assert!(observer.complete());
        assert!(!observer.next(json!("late")));
        assert_eq!(receiver.try_recv().expect("settled"), None);
    }

    #[test]
    fn handles_report_their_protocol() {
        assert_eq!(ExecutionHandle::ready(json!([])).protocol(), "eager");
        assert_eq!(ExecutionHandle::thenable(async { Ok(json!([])) }).protocol(), "thenable");
        let source = |_observer: Observer| -> Box<dyn Subscription> { Box::new(NoopSubscription) };
        assert_eq!(ExecutionHandle::subscription(source).protocol(), "subscription");
    }
}
