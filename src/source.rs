//! Stream boundary: anything that can push values at the engine.
//!
//! The engine never implements a stream of its own. It consumes the
//! [`Source`] trait and holds on to the returned [`Subscription`] for the
//! lifetime of the consuming node. `spark_signals::Signal` gets a blanket
//! adapter here so signals plug in directly as production sources.

use std::rc::Rc;

use spark_signals::{effect, flush_sync, Signal};

// =============================================================================
// Subscription
// =============================================================================

/// Handle to an active source subscription.
///
/// Cancellation is idempotent: either call [`Subscription::cancel`] or let
/// the handle drop. After cancellation the callback is never invoked again.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    /// Stop delivery now.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

// =============================================================================
// Source
// =============================================================================

/// A push-based value stream.
///
/// `subscribe` installs `callback` and returns the handle that removes it.
/// Emission order is delivery order; all delivery is synchronous and
/// single-threaded.
pub trait Source<T> {
    fn subscribe(&self, callback: Box<dyn FnMut(T)>) -> Subscription;
}

/// Signals act as sources that emit their current value on subscribe and
/// every committed change afterwards.
impl<T: Clone + PartialEq + 'static> Source<T> for Signal<T> {
    fn subscribe(&self, mut callback: Box<dyn FnMut(T)>) -> Subscription {
        let signal = self.clone();
        let stop = effect(move || {
            callback(signal.get());
        });
        // Deliver the current value before subscribe returns.
        flush_sync();
        Subscription::new(stop)
    }
}

impl<T, S: Source<T> + ?Sized> Source<T> for Rc<S> {
    fn subscribe(&self, callback: Box<dyn FnMut(T)>) -> Subscription {
        (**self).subscribe(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use spark_signals::signal;

    #[test]
    fn test_subscription_cancel_runs_once() {
        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();
        let sub = Subscription::new(move || {
            *count_clone.borrow_mut() += 1;
        });
        sub.cancel();
        assert_eq!(*count.borrow(), 1, "cancel should run the teardown");
    }

    #[test]
    fn test_subscription_drop_cancels() {
        let count = Rc::new(RefCell::new(0));
        let count_clone = count.clone();
        {
            let _sub = Subscription::new(move || {
                *count_clone.borrow_mut() += 1;
            });
        }
        assert_eq!(*count.borrow(), 1, "drop should run the teardown");
    }

    #[test]
    fn test_signal_source_emits_current_then_updates() {
        let sig = signal(10i32);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();

        let sub = sig.subscribe(Box::new(move |value| {
            seen_clone.borrow_mut().push(value);
        }));
        assert_eq!(*seen.borrow(), vec![10], "current value delivered on subscribe");

        sig.set(20);
        flush_sync();
        assert_eq!(*seen.borrow(), vec![10, 20]);

        sub.cancel();
        sig.set(30);
        flush_sync();
        assert_eq!(*seen.borrow(), vec![10, 20], "no delivery after cancel");
    }
}
