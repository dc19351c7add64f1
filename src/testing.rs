//! Deterministic push source for tests.
//!
//! [`Emitter`] is the test-side [`Source`]: `emit` delivers a value
//! synchronously to every active subscriber. It is not a production
//! stream; production code plugs signals (or any other `Source`
//! implementation) into the engine instead.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::source::{Source, Subscription};

type Callback<T> = Rc<RefCell<Box<dyn FnMut(T)>>>;

/// Subscribers are keyed by ascending subscription id so delivery order
/// is subscription order.
struct EmitterInner<T> {
    next_id: RefCell<usize>,
    subscribers: RefCell<BTreeMap<usize, Callback<T>>>,
}

/// Hand-driven source. Clones share the subscriber set.
pub struct Emitter<T> {
    inner: Rc<EmitterInner<T>>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<T: Clone + 'static> Emitter<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(EmitterInner {
                next_id: RefCell::new(0),
                subscribers: RefCell::new(BTreeMap::new()),
            }),
        }
    }

    /// Deliver `value` to every subscriber active at the start of the
    /// call. Safe against subscribers cancelling during delivery.
    pub fn emit(&self, value: T) {
        let active: Vec<(usize, Callback<T>)> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(id, callback)| (*id, callback.clone()))
            .collect();
        for (id, callback) in active {
            if !self.inner.subscribers.borrow().contains_key(&id) {
                continue;
            }
            (callback.borrow_mut())(value.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }
}

impl<T: Clone + 'static> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> Source<T> for Emitter<T> {
    fn subscribe(&self, callback: Box<dyn FnMut(T)>) -> Subscription {
        let id = {
            let mut next_id = self.inner.next_id.borrow_mut();
            let id = *next_id;
            *next_id += 1;
            id
        };
        self.inner
            .subscribers
            .borrow_mut()
            .insert(id, Rc::new(RefCell::new(callback)));

        let inner = self.inner.clone();
        Subscription::new(move || {
            inner.subscribers.borrow_mut().remove(&id);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_all_subscribers() {
        let emitter: Emitter<u32> = Emitter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_a = seen.clone();
        let sub_a = emitter.subscribe(Box::new(move |value| {
            seen_a.borrow_mut().push(("a", value));
        }));
        let seen_b = seen.clone();
        let _sub_b = emitter.subscribe(Box::new(move |value| {
            seen_b.borrow_mut().push(("b", value));
        }));

        emitter.emit(1);
        assert_eq!(seen.borrow().len(), 2);

        sub_a.cancel();
        emitter.emit(2);
        assert_eq!(*seen.borrow(), vec![("a", 1), ("b", 1), ("b", 2)]);
    }

    #[test]
    fn test_delivery_follows_subscription_order() {
        let emitter: Emitter<u32> = Emitter::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut subs = Vec::new();
        for label in ["first", "second", "third"] {
            let order_clone = order.clone();
            subs.push(emitter.subscribe(Box::new(move |_| {
                order_clone.borrow_mut().push(label);
            })));
        }

        emitter.emit(0);
        assert_eq!(
            *order.borrow(),
            vec!["first", "second", "third"],
            "subscribers are called in the order they subscribed"
        );
    }

    #[test]
    fn test_cancel_during_emit_is_safe() {
        let emitter: Emitter<u32> = Emitter::new();
        let sub_holder: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let late_calls = Rc::new(RefCell::new(0));

        let holder_clone = sub_holder.clone();
        let _canceller = emitter.subscribe(Box::new(move |_| {
            if let Some(sub) = holder_clone.borrow_mut().take() {
                sub.cancel();
            }
        }));
        let late_clone = late_calls.clone();
        let victim = emitter.subscribe(Box::new(move |_| {
            *late_clone.borrow_mut() += 1;
        }));
        *sub_holder.borrow_mut() = Some(victim);

        emitter.emit(1);
        assert_eq!(
            *late_calls.borrow(),
            0,
            "subscriber cancelled mid-emit must not be called"
        );
    }
}
