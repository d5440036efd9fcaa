//! Ordered frame-handler chain.
//!
//! Every incoming frame is offered to the registered handlers in
//! registration order. A handler answers with a [`HandlerAction`]: `stop`
//! ends the pass for this frame, `remove` drops the handler once it has run.
//!
//! Two locks guard the chain. The dispatch lock serialises whole passes, so
//! one frame is fully handled before the next one starts. The state lock
//! only protects the entry list and is never held while a handler runs, so
//! handlers may register or unregister entries (including themselves)
//! mid-pass. Entries added during a pass first see the next frame; entries
//! removed during a pass are skipped for the rest of it.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace, warn};
use znp_frame::{CommandType, Frame};

use crate::error::Result;

/// Outcome of running one handler against one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandlerAction {
    /// Do not offer this frame to handlers further down the chain.
    pub stop: bool,
    /// Unregister this handler after this frame. Ignored for permanent
    /// handlers.
    pub remove: bool,
}

impl HandlerAction {
    /// Not interested; keep going.
    pub const PASS: Self = Self {
        stop: false,
        remove: false,
    };
    /// Frame handled by a long-lived handler.
    pub const CONSUME: Self = Self {
        stop: true,
        remove: false,
    };
    /// Frame handled by a one-shot handler.
    pub const CLAIM: Self = Self {
        stop: true,
        remove: true,
    };
    /// Handler is done, but the frame stays available to later entries.
    pub const RETIRE: Self = Self {
        stop: false,
        remove: true,
    };
}

/// A frame handler. Errors and panics are logged and treated as
/// [`HandlerAction::PASS`].
pub type Handler = Box<dyn FnMut(&Frame) -> Result<HandlerAction> + Send>;

/// Identifies a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

struct Entry {
    id: HandlerId,
    permanent: bool,
    handler: Handler,
}

#[derive(Default)]
struct ChainState {
    next_id: u64,
    entries: Vec<Entry>,
    /// Entries taken out by the running pass.
    in_pass: Vec<HandlerId>,
    /// Ids unregistered while their entry was taken out by the running pass.
    removed: Vec<HandlerId>,
}

/// The engine's ordered handler list. Shared behind an `Arc`.
#[derive(Default)]
pub struct HandlerChain {
    dispatch_lock: Mutex<()>,
    state: Mutex<ChainState>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to the end of the chain.
    ///
    /// Permanent handlers stay registered whatever they return.
    pub fn register(&self, permanent: bool, handler: Handler) -> HandlerId {
        let mut state = self.lock_state();
        let id = HandlerId(state.next_id);
        state.next_id += 1;
        state.entries.push(Entry {
            id,
            permanent,
            handler,
        });
        trace!(?id, permanent, "registered frame handler");
        id
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn unregister(&self, id: HandlerId) -> bool {
        let mut state = self.lock_state();
        if let Some(pos) = state.entries.iter().position(|entry| entry.id == id) {
            let entry = state.entries.remove(pos);
            drop(state);
            // Dropped outside the lock; a handler may own values that
            // unregister other handlers when dropped.
            drop(entry);
            trace!(?id, "unregistered frame handler");
            return true;
        }
        if state.in_pass.contains(&id) && !state.removed.contains(&id) {
            // Taken out by the running pass; it is dropped when the pass ends.
            state.removed.push(id);
            return true;
        }
        false
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        let state = self.lock_state();
        state.entries.len() + state.in_pass.len() - state.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run one frame through the chain. Returns `true` if a handler
    /// stopped propagation.
    pub fn dispatch(&self, frame: &Frame) -> bool {
        let _pass = self
            .dispatch_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut entries = {
            let mut state = self.lock_state();
            let entries = std::mem::take(&mut state.entries);
            state.in_pass = entries.iter().map(|entry| entry.id).collect();
            entries
        };

        let mut finished = Vec::new();
        let mut stopped = false;
        for entry in entries.iter_mut() {
            if self.lock_state().removed.contains(&entry.id) {
                continue;
            }

            let action = match catch_unwind(AssertUnwindSafe(|| (entry.handler)(frame))) {
                Ok(Ok(action)) => action,
                Ok(Err(err)) => {
                    warn!(command = %frame.command, error = %err, "frame handler failed");
                    HandlerAction::PASS
                }
                Err(_) => {
                    warn!(command = %frame.command, "frame handler panicked");
                    HandlerAction::PASS
                }
            };

            if action.remove && !entry.permanent {
                finished.push(entry.id);
            }
            if action.stop {
                stopped = true;
                break;
            }
        }

        let mut state = self.lock_state();
        let removed = std::mem::take(&mut state.removed);
        let (kept, done): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|entry| !finished.contains(&entry.id) && !removed.contains(&entry.id));
        let added = std::mem::replace(&mut state.entries, kept);
        state.entries.extend(added);
        state.in_pass.clear();
        drop(state);
        drop(done);

        if !stopped {
            // Indications pass through the event decoders unclaimed; a
            // response nobody claimed means its request was abandoned.
            if frame.command_type == CommandType::Srsp {
                warn!(command = %frame.command, "response arrived with no pending request");
            } else {
                debug!(
                    command_type = %frame.command_type,
                    command = %frame.command,
                    "no handler claimed frame"
                );
            }
        }
        stopped
    }

    fn lock_state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use znp_encoding::DecodeError;
    use znp_frame::{sys, zdo, CommandType};

    use super::*;
    use crate::error::ZnpError;

    fn frame(command: znp_frame::Command) -> Frame {
        Frame::new(CommandType::Areq, command, vec![0x09])
    }

    fn recorder(
        log: &Arc<Mutex<Vec<&'static str>>>,
        name: &'static str,
        action: HandlerAction,
    ) -> Handler {
        let log = Arc::clone(log);
        Box::new(move |_| {
            log.lock().unwrap().push(name);
            Ok(action)
        })
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let chain = HandlerChain::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        chain.register(true, recorder(&log, "a", HandlerAction::PASS));
        chain.register(true, recorder(&log, "b", HandlerAction::PASS));
        chain.register(true, recorder(&log, "c", HandlerAction::PASS));

        assert!(!chain.dispatch(&frame(zdo::STATE_CHANGE_IND)));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn stop_halts_the_pass() {
        let chain = HandlerChain::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        chain.register(true, recorder(&log, "a", HandlerAction::CONSUME));
        chain.register(true, recorder(&log, "b", HandlerAction::PASS));

        assert!(chain.dispatch(&frame(zdo::STATE_CHANGE_IND)));
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }

    #[test]
    fn remove_applies_regardless_of_stop() {
        let chain = HandlerChain::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        chain.register(false, recorder(&log, "retire", HandlerAction::RETIRE));
        chain.register(false, recorder(&log, "claim", HandlerAction::CLAIM));
        chain.register(false, recorder(&log, "tail", HandlerAction::PASS));

        chain.dispatch(&frame(sys::RESET_IND));
        chain.dispatch(&frame(sys::RESET_IND));
        assert_eq!(*log.lock().unwrap(), vec!["retire", "claim", "tail"]);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn permanent_handlers_ignore_remove() {
        let chain = HandlerChain::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        chain.register(true, recorder(&log, "p", HandlerAction::CLAIM));

        chain.dispatch(&frame(sys::RESET_IND));
        chain.dispatch(&frame(sys::RESET_IND));
        assert_eq!(*log.lock().unwrap(), vec!["p", "p"]);
    }

    #[test]
    fn failing_handler_is_isolated() {
        let chain = HandlerChain::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        chain.register(
            true,
            Box::new(|frame| {
                Err(ZnpError::HandlerDecode {
                    command: frame.command,
                    source: DecodeError::TrailingBytes(1),
                })
            }),
        );
        chain.register(true, Box::new(|_| panic!("handler bug")));
        chain.register(false, recorder(&log, "waiter", HandlerAction::CLAIM));

        assert!(chain.dispatch(&frame(zdo::STATE_CHANGE_IND)));
        assert_eq!(*log.lock().unwrap(), vec!["waiter"]);
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn handler_can_unregister_itself_and_others() {
        let chain = Arc::new(HandlerChain::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let later: Arc<Mutex<Option<HandlerId>>> = Arc::new(Mutex::new(None));

        let inner_chain = Arc::clone(&chain);
        let inner_later = Arc::clone(&later);
        let first = chain.register(
            false,
            Box::new(move |_| {
                if let Some(id) = inner_later.lock().unwrap().take() {
                    assert!(inner_chain.unregister(id));
                }
                Ok(HandlerAction::PASS)
            }),
        );
        let counter = Arc::clone(&hits);
        let second = chain.register(
            false,
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(HandlerAction::PASS)
            }),
        );
        *later.lock().unwrap() = Some(second);

        chain.dispatch(&frame(zdo::STATE_CHANGE_IND));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(chain.len(), 1);
        assert!(chain.unregister(first));
        assert!(chain.is_empty());
    }

    #[test]
    fn handler_registered_mid_pass_sees_next_frame() {
        let chain = Arc::new(HandlerChain::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_chain = Arc::clone(&chain);
        let inner_log = Arc::clone(&log);
        chain.register(
            false,
            Box::new(move |_| {
                inner_chain.register(false, recorder(&inner_log, "late", HandlerAction::CLAIM));
                Ok(HandlerAction::RETIRE)
            }),
        );

        assert!(!chain.dispatch(&frame(zdo::STATE_CHANGE_IND)));
        assert!(log.lock().unwrap().is_empty());
        assert!(chain.dispatch(&frame(zdo::STATE_CHANGE_IND)));
        assert_eq!(*log.lock().unwrap(), vec!["late"]);
        assert!(chain.is_empty());
    }

    #[test]
    fn unregister_unknown_id_is_false() {
        let chain = HandlerChain::new();
        let id = chain.register(false, Box::new(|_| Ok(HandlerAction::PASS)));
        assert!(chain.unregister(id));
        assert!(!chain.unregister(id));
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn unclaimed_response_is_a_warning() {
        let logs = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .finish();

        let chain = HandlerChain::new();
        tracing::subscriber::with_default(subscriber, || {
            assert!(!chain.dispatch(&Frame::new(CommandType::Srsp, sys::PING, vec![0x59, 0x06])));
            assert!(!chain.dispatch(&frame(zdo::STATE_CHANGE_IND)));
        });

        let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(text
            .lines()
            .any(|line| line.contains("WARN") && line.contains("no pending request")));
        assert!(text
            .lines()
            .any(|line| line.contains("DEBUG") && line.contains("no handler claimed frame")));
    }
}
