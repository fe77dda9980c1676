//! Subscribable state cells
//!
//! A [`Store`] owns one value and notifies every subscriber synchronously,
//! in subscription order, each time the value is written. Stores are
//! single-threaded handles: cloning a store clones the handle, not the value.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Inner<T> {
    value: T,
    listeners: Vec<(u64, Listener<T>)>,
    next_id: u64,
}

/// Independently mutable state cell with change subscriptions
pub struct Store<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Store<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value,
                listeners: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Current value
    pub fn read(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Replace the value and notify subscribers
    pub fn write(&self, value: T) {
        self.inner.borrow_mut().value = value;
        self.notify();
    }

    /// Replace the value with one derived from the current value
    pub fn update(&self, updater: impl FnOnce(&T) -> T) {
        let next = {
            let inner = self.inner.borrow();
            updater(&inner.value)
        };
        self.write(next);
    }

    /// Register a listener called with the new value after every write.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// unsubscribed or dropped.
    pub fn subscribe(&self, listener: impl FnMut(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            let listener: Listener<T> = Rc::new(RefCell::new(listener));
            inner.listeners.push((id, listener));
            id
        };

        let weak: Weak<RefCell<Inner<T>>> = Rc::downgrade(&self.inner);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().listeners.retain(|(other, _)| *other != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    fn is_subscribed(&self, id: u64) -> bool {
        self.inner.borrow().listeners.iter().any(|(other, _)| *other == id)
    }

    fn notify(&self) {
        // Snapshot the listeners so they may unsubscribe while running
        let listeners = self.inner.borrow().listeners.clone();

        for (id, listener) in listeners {
            if !self.is_subscribed(id) {
                continue;
            }
            // Read per listener: an earlier listener may have written again,
            // and the last value each listener sees must be the stored one
            let value = self.read();
            match listener.try_borrow_mut() {
                Ok(mut listener) => (&mut *listener)(&value),
                Err(_) => log::debug!("Store listener {} wrote its own store; not re-entered", id),
            }
        }
    }
}

impl<T: Clone + Default + 'static> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Registration handle returned by [`Store::subscribe`]
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Remove the listener from its store
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
