use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::thread::{self, ThreadId};

use znp_frame::Frame;

use crate::error::Result;

/// Callback invoked once for every frame received from the device.
pub type FrameCallback = Box<dyn Fn(&Frame) + Send + Sync>;

/// A frame-level link to a ZNP device.
///
/// The engine only needs two things from a transport: a way to send a frame,
/// and a way to be told about every frame that arrives. Implementations
/// deliver frames one at a time, in arrival order, from a single context.
pub trait RawInterface: Send + Sync {
    /// Send one frame to the device.
    fn send(&self, frame: &Frame) -> Result<()>;

    /// Register a callback for incoming frames.
    ///
    /// The callback stays registered until the returned subscription is
    /// dropped.
    fn subscribe(&self, callback: FrameCallback) -> FrameSubscription;
}

/// Handle for a registered frame callback. Dropping it unregisters.
#[must_use = "dropping a subscription unregisters its callback"]
pub struct FrameSubscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl FrameSubscription {
    /// Wrap the closure that unregisters the callback.
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to cancel.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    /// Unregister now rather than at drop.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for FrameSubscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for FrameSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameSubscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

type SharedCallback = Arc<dyn Fn(&Frame) + Send + Sync>;

#[derive(Default)]
struct ListenerState {
    next_id: u64,
    listeners: Vec<(u64, SharedCallback)>,
}

/// Fan-out registry shared by transports.
///
/// Unsubscribing from any thread other than the one delivering waits for an
/// in-flight delivery to finish, so a cancelled callback is never running
/// once its subscription has been dropped. Unsubscribing from inside a
/// callback returns immediately.
#[derive(Default)]
pub struct FrameListeners {
    state: Mutex<ListenerState>,
    delivery: Mutex<()>,
    delivering_thread: Mutex<Option<ThreadId>>,
}

impl FrameListeners {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a callback and return the subscription that removes it.
    pub fn subscribe(self: &Arc<Self>, callback: FrameCallback) -> FrameSubscription {
        let id = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            let id = state.next_id;
            state.next_id += 1;
            state.listeners.push((id, Arc::from(callback)));
            id
        };

        let weak: Weak<Self> = Arc::downgrade(self);
        FrameSubscription::new(move || {
            if let Some(listeners) = weak.upgrade() {
                listeners.remove(id);
            }
        })
    }

    /// Invoke every registered callback with `frame`.
    pub fn deliver(&self, frame: &Frame) {
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        *self
            .delivering_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());

        let snapshot: Vec<SharedCallback> = {
            let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state
                .listeners
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect()
        };
        for callback in snapshot {
            if self.contains_callback(&callback) {
                callback(frame);
            }
        }

        *self
            .delivering_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_callback(&self, callback: &SharedCallback) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .listeners
            .iter()
            .any(|(_, registered)| Arc::ptr_eq(registered, callback))
    }

    fn remove(&self, id: u64) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .retain(|(registered, _)| *registered != id);

        let delivering = *self
            .delivering_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if delivering != Some(thread::current().id()) {
            drop(self.delivery.lock().unwrap_or_else(PoisonError::into_inner));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use znp_frame::{sys, CommandType};

    use super::*;

    fn ping() -> Frame {
        Frame::new(CommandType::Srsp, sys::PING, vec![0x59, 0x06])
    }

    fn counter(hits: &Arc<AtomicUsize>) -> FrameCallback {
        let hits = Arc::clone(hits);
        Box::new(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn deliver_reaches_every_listener() {
        let listeners = FrameListeners::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let _a = listeners.subscribe(counter(&hits));
        let _b = listeners.subscribe(counter(&hits));

        listeners.deliver(&ping());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let listeners = FrameListeners::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = listeners.subscribe(counter(&hits));
        listeners.deliver(&ping());

        drop(sub);
        listeners.deliver(&ping());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(listeners.is_empty());
    }

    #[test]
    fn unsubscribe_from_inside_callback() {
        let listeners = FrameListeners::new();
        let slot: Arc<Mutex<Option<FrameSubscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicUsize::new(0));

        let inner_slot = Arc::clone(&slot);
        let inner_hits = Arc::clone(&hits);
        let sub = listeners.subscribe(Box::new(move |_| {
            inner_hits.fetch_add(1, Ordering::SeqCst);
            inner_slot.lock().unwrap().take();
        }));
        *slot.lock().unwrap() = Some(sub);

        listeners.deliver(&ping());
        listeners.deliver(&ping());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_removed_mid_delivery_is_skipped() {
        let listeners = FrameListeners::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<FrameSubscription>>> = Arc::new(Mutex::new(None));

        let inner_slot = Arc::clone(&slot);
        let _first = listeners.subscribe(Box::new(move |_| {
            inner_slot.lock().unwrap().take();
        }));
        *slot.lock().unwrap() = Some(listeners.subscribe(counter(&hits)));

        listeners.deliver(&ping());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn detached_subscription_is_inert() {
        let sub = FrameSubscription::detached();
        sub.unsubscribe();
    }
}
