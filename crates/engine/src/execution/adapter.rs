use std::time::Duration;

use serde_json::Value;
use tokio::{sync::oneshot, time};
use tracing::{debug, warn};

use super::{Deferred, ExecutionHandle, Observer, Subscribe, Subscription};
use crate::error::BackendError;

/// Awaits any execution handle and yields its first value.
///
/// - An absent handle yields `None` immediately.
/// - Errors, streams that complete or fail before delivering, and handles that
///   do not settle within `timeout` all yield `None`.
/// - A subscription is released exactly once after it settles or times out.
///
/// Never panics and never returns an error; failures are logged.
pub async fn await_handle(handle: Option<ExecutionHandle>, timeout: Duration) -> Option<Value> {
    let Some(handle) = handle else {
        debug!("execution produced no handle");
        return None;
    };
    debug!(protocol = handle.protocol(), "awaiting execution handle");

    match handle {
        ExecutionHandle::Eager(result) => settle(result),
        ExecutionHandle::Deferred(Deferred::Thenable(future)) => match time::timeout(timeout, future).await {
            Ok(result) => settle(result),
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "thenable execution timed out");
                None
            }
        },
        ExecutionHandle::Deferred(Deferred::Subscription(source)) => await_subscription(source, timeout).await,
    }
}

fn settle(result: Result<Value, BackendError>) -> Option<Value> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            debug!(%error, "execution failed");
            None
        }
    }
}

async fn await_subscription(source: Box<dyn Subscribe>, timeout: Duration) -> Option<Value> {
    let (sender, receiver) = oneshot::channel();
    let mut subscription = SubscriptionGuard(Some(source.subscribe(Observer::new(sender))));

    let outcome = match time::timeout(timeout, receiver).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(_)) => {
            debug!("subscription dropped its observer without a terminal event");
            None
        }
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "subscription timed out");
            None
        }
    };

    subscription.release();
    outcome
}

/// Unsubscribes once, either after the outcome is known or when the awaiting
/// future is dropped before it settles.
struct SubscriptionGuard(Option<Box<dyn Subscription>>);

impl SubscriptionGuard {
    fn release(&mut self) {
        if let Some(mut subscription) = self.0.take() {
            subscription.unsubscribe();
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use serde_json::json;

    use super::*;
    use crate::execution::Subscription;

    const TIMEOUT: Duration = Duration::from_secs(5);

    struct CountingSubscription(Arc<AtomicUsize>);

    impl Subscription for CountingSubscription {
        fn unsubscribe(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn absent_handle_resolves_to_none() {
        assert_eq!(await_handle(None, TIMEOUT).await, None);
    }

    #[tokio::test]
    async fn eager_error_resolves_to_none() {
        let handle = ExecutionHandle::failed(BackendError::call("boom"));
        assert_eq!(await_handle(Some(handle), TIMEOUT).await, None);
    }

    #[tokio::test]
    async fn thenable_failure_resolves_to_none() {
        let handle = ExecutionHandle::thenable(async { Err(BackendError::call("rejected")) });
        assert_eq!(await_handle(Some(handle), TIMEOUT).await, None);
    }

    #[tokio::test]
    async fn error_before_next_resolves_to_none_and_unsubscribes() {
        let unsubscribed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&unsubscribed);
        let source = move |observer: Observer| -> Box<dyn Subscription> {
            observer.error(BackendError::call("stream failed"));
            observer.next(json!({"resp": []}));
            Box::new(CountingSubscription(counter))
        };

        let value = await_handle(Some(ExecutionHandle::subscription(source)), TIMEOUT).await;
        assert_eq!(value, None);
        assert_eq!(unsubscribed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dropped_observer_resolves_to_none() {
        let source = |observer: Observer| -> Box<dyn Subscription> {
            drop(observer);
            Box::new(crate::execution::NoopSubscription)
        };
        assert_eq!(await_handle(Some(ExecutionHandle::subscription(source)), TIMEOUT).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_subscription_times_out_and_is_released() {
        let unsubscribed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&unsubscribed);
        let kept = Arc::new(std::sync::Mutex::new(None));
        let keeper = Arc::clone(&kept);
        let source = move |observer: Observer| -> Box<dyn Subscription> {
            // Hold the observer without ever emitting.
            *keeper.lock().expect("keeper lock") = Some(observer);
            Box::new(CountingSubscription(counter))
        };

        let value = await_handle(Some(ExecutionHandle::subscription(source)), Duration::from_millis(50)).await;
        assert_eq!(value, None);
        assert_eq!(unsubscribed.load(Ordering::SeqCst), 1);

        let observer = kept.lock().expect("keeper lock").take().expect("observer retained");
        assert!(observer.next(json!("late")), "late event is accepted by the latch but has no receiver");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_await_still_unsubscribes_once() {
        let unsubscribed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&unsubscribed);
        let kept = Arc::new(std::sync::Mutex::new(None));
        let keeper = Arc::clone(&kept);
        let source = move |observer: Observer| -> Box<dyn Subscription> {
            *keeper.lock().expect("keeper lock") = Some(observer);
            Box::new(CountingSubscription(counter))
        };

        let pending = await_handle(Some(ExecutionHandle::subscription(source)), Duration::from_secs(30));
        assert!(time::timeout(Duration::from_millis(10), pending).await.is_err());
        assert_eq!(unsubscribed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_thenable_times_out() {
        let handle = ExecutionHandle::thenable(async {
            futures_util::future::pending::<()>().await;
            Ok(json!(null))
        });
        assert_eq!(await_handle(Some(handle), Duration::from_millis(10)).await, None);
    }
}
