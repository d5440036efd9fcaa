//! Multicast event buses for unsolicited device indications.

use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tracing::{trace, warn};
use znp_encoding::{decode, decode_partial, Wire};
use znp_frame::{af, sys, zdo, Command, CommandType};

use crate::error::{Result, ZnpError};
use crate::handler::{HandlerAction, HandlerChain};
use crate::types::{DeviceState, IncomingMsg, ResetInfo};

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

struct Subscriber<T> {
    id: u64,
    active: AtomicBool,
    callback: Callback<T>,
}

struct BusState<T> {
    next_id: u64,
    subscribers: Vec<Arc<Subscriber<T>>>,
}

struct BusInner<T> {
    name: &'static str,
    state: Mutex<BusState<T>>,
}

impl<T> BusInner<T> {
    fn lock(&self) -> MutexGuard<'_, BusState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One multicast point for a category of events.
///
/// `publish` calls every current subscriber synchronously, in subscription
/// order. A panicking subscriber is logged and skipped; the rest still run.
/// Subscribers may subscribe or unsubscribe from inside a callback.
pub struct EventBus<T> {
    inner: Arc<BusInner<T>>,
}

impl<T> Clone for EventBus<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> EventBus<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: Arc::new(BusInner {
                name,
                state: Mutex::new(BusState {
                    next_id: 0,
                    subscribers: Vec::new(),
                }),
            }),
        }
    }

    /// Category name used in log fields.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Register a callback. It stays registered until the returned
    /// [`Subscription`] is dropped.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let subscriber = {
            let mut state = self.inner.lock();
            let subscriber = Arc::new(Subscriber {
                id: state.next_id,
                active: AtomicBool::new(true),
                callback: Box::new(callback),
            });
            state.next_id += 1;
            state.subscribers.push(Arc::clone(&subscriber));
            subscriber
        };
        trace!(event = self.inner.name, id = subscriber.id, "subscribed");

        let bus: Weak<BusInner<T>> = Arc::downgrade(&self.inner);
        let entry: Weak<Subscriber<T>> = Arc::downgrade(&subscriber);
        Subscription::new(move || {
            let Some(subscriber) = entry.upgrade() else {
                return;
            };
            subscriber.active.store(false, Ordering::SeqCst);
            if let Some(bus) = bus.upgrade() {
                bus.lock()
                    .subscribers
                    .retain(|entry| !Arc::ptr_eq(entry, &subscriber));
            }
        })
    }

    /// Deliver `value` to every subscriber. Returns how many were called.
    pub fn publish(&self, value: &T) -> usize {
        let snapshot: Vec<Arc<Subscriber<T>>> = self.inner.lock().subscribers.clone();

        let mut delivered = 0;
        for subscriber in snapshot {
            if !subscriber.active.load(Ordering::SeqCst) {
                continue;
            }
            let call = catch_unwind(AssertUnwindSafe(|| (subscriber.callback)(value)));
            match call {
                Ok(()) => delivered += 1,
                Err(_) => warn!(
                    event = self.inner.name,
                    id = subscriber.id,
                    "event subscriber panicked"
                ),
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// A future resolving with the next published event.
    ///
    /// The subscription is taken when `next` is called, not on first poll.
    pub fn next(&self) -> NextEvent<T>
    where
        T: Clone + Send,
    {
        let (tx, rx) = oneshot::channel();
        let slot = Mutex::new(Some(tx));
        let subscription = self.subscribe(move |value: &T| {
            let sender = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            if let Some(sender) = sender {
                let _ = sender.send(value.clone());
            }
        });
        NextEvent {
            rx,
            _subscription: subscription,
        }
    }
}

/// Handle for an event subscription. Dropping it unsubscribes.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unsubscribe now rather than at drop.
    pub fn unsubscribe(mut self) {
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

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Future returned by [`EventBus::next`].
pub struct NextEvent<T> {
    rx: oneshot::Receiver<T>,
    _subscription: Subscription,
}

impl<T> Future for NextEvent<T> {
    type Output = Result<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| ZnpError::Closed))
    }
}

/// The four event categories a ZNP device reports.
#[derive(Clone)]
pub struct ZnpEvents {
    /// `SYS_RESET_IND`: the device finished a reset.
    pub reset: EventBus<ResetInfo>,
    /// `AF_INCOMING_MSG`: an application message arrived over the air.
    pub incoming_msg: EventBus<IncomingMsg>,
    /// `ZDO_STATE_CHANGE_IND`: the device's network state changed.
    pub state_change: EventBus<DeviceState>,
    /// `ZDO_PERMIT_JOIN_IND`: the join window changed, in seconds.
    pub permit_join: EventBus<u8>,
}

impl ZnpEvents {
    pub fn new() -> Self {
        Self {
            reset: EventBus::new("reset"),
            incoming_msg: EventBus::new("incoming_msg"),
            state_change: EventBus::new("state_change"),
            permit_join: EventBus::new("permit_join"),
        }
    }

    /// Register one permanent handler per category that decodes the
    /// indication and publishes it.
    pub(crate) fn attach(&self, chain: &HandlerChain) {
        attach_bus(chain, sys::RESET_IND, self.reset.clone(), false);
        // Newer firmware appends fields after the payload.
        attach_bus(chain, af::INCOMING_MSG, self.incoming_msg.clone(), true);
        attach_bus(chain, zdo::STATE_CHANGE_IND, self.state_change.clone(), false);
        attach_bus(chain, zdo::PERMIT_JOIN_IND, self.permit_join.clone(), false);
    }
}

impl Default for ZnpEvents {
    fn default() -> Self {
        Self::new()
    }
}

fn attach_bus<T>(chain: &HandlerChain, command: Command, bus: EventBus<T>, partial: bool)
where
    T: Wire + Send + 'static,
{
    chain.register(
        true,
        Box::new(move |frame| {
            if !frame.is(CommandType::Areq, command) {
                return Ok(HandlerAction::PASS);
            }
            let decoded = if partial {
                decode_partial::<T>(&frame.payload)
            } else {
                decode::<T>(&frame.payload)
            };
            let value = decoded.map_err(|source| ZnpError::HandlerDecode { command, source })?;
            let delivered = bus.publish(&value);
            trace!(event = bus.name(), delivered, "published event");
            Ok(HandlerAction::CONSUME)
        }),
    );
}
