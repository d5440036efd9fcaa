#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use znp_api::ZnpApi;
use znp_frame::{Command, CommandType, Frame};
use znp_transport::{FrameCallback, FrameListeners, FrameSubscription, RawInterface, TransportError};

type Responder = Box<dyn FnMut(&Frame) -> Vec<Frame> + Send>;

/// In-memory transport: records sent frames and delivers injected ones
/// synchronously on the calling thread.
#[derive(Default)]
pub struct MockInterface {
    listeners: Arc<FrameListeners>,
    sent: Mutex<Vec<Frame>>,
    fail_sends: AtomicBool,
    responder: Mutex<Option<Responder>>,
}

impl MockInterface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inject(&self, frame: Frame) {
        self.listeners.deliver(&frame);
    }

    pub fn sent(&self) -> Vec<Frame> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_sent(&self) -> Frame {
        self.sent().pop().expect("no frame was sent")
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Answer every sent frame with the frames `responder` returns, before
    /// `send` returns.
    pub fn respond_with(&self, responder: impl FnMut(&Frame) -> Vec<Frame> + Send + 'static) {
        *self.responder.lock().unwrap() = Some(Box::new(responder));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl RawInterface for MockInterface {
    fn send(&self, frame: &Frame) -> Result<(), TransportError> {
        let replies = match self.responder.lock().unwrap().as_mut() {
            Some(responder) => responder(frame),
            None => Vec::new(),
        };
        // Replies go out even when the send then fails, like bytes already
        // on the line when the port errors.
        for reply in replies {
            self.listeners.deliver(&reply);
        }
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.sent.lock().unwrap().push(frame.clone());
        Ok(())
    }

    fn subscribe(&self, callback: FrameCallback) -> FrameSubscription {
        self.listeners.subscribe(callback)
    }
}

/// Number of permanent event handlers every engine starts with.
pub const EVENT_HANDLERS: usize = 4;

pub fn setup() -> (Arc<MockInterface>, ZnpApi) {
    let mock = MockInterface::new();
    let api = ZnpApi::new(mock.clone());
    (mock, api)
}

pub fn srsp(command: Command, payload: impl Into<Vec<u8>>) -> Frame {
    Frame::new(CommandType::Srsp, command, payload.into())
}

pub fn areq(command: Command, payload: impl Into<Vec<u8>>) -> Frame {
    Frame::new(CommandType::Areq, command, payload.into())
}
