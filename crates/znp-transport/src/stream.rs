use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use tracing::{debug, error, info, warn};
use znp_frame::{Frame, FrameConfig, FrameError, FrameReader, FrameWriter};

use crate::error::{Result, TransportError};
use crate::interface::{FrameCallback, FrameListeners, FrameSubscription, RawInterface};

type BoxedWriter = Box<dyn Write + Send>;

/// A [`RawInterface`] over any pair of byte streams.
///
/// A dedicated `znp-reader` thread decodes incoming bytes and delivers each
/// frame to the subscribers in arrival order. Sends are serialised so frames
/// from concurrent callers never interleave on the wire.
pub struct StreamInterface {
    writer: Mutex<FrameWriter<BoxedWriter>>,
    listeners: Arc<FrameListeners>,
    closed: Arc<AtomicBool>,
}

impl StreamInterface {
    /// Start a reader thread over `reader` and send through `writer`.
    pub fn new<R, W>(reader: R, writer: W, config: FrameConfig) -> Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let listeners = FrameListeners::new();
        let closed = Arc::new(AtomicBool::new(false));

        let reader = FrameReader::with_config(reader, config.clone());
        let thread_listeners = Arc::clone(&listeners);
        let thread_closed = Arc::clone(&closed);
        thread::Builder::new()
            .name("znp-reader".into())
            .spawn(move || read_loop(reader, &thread_listeners, &thread_closed))?;

        let writer: BoxedWriter = Box::new(writer);
        Ok(Self {
            writer: Mutex::new(FrameWriter::with_config(writer, config)),
            listeners,
            closed,
        })
    }

    /// Open a serial device and run the interface over it.
    pub fn open(
        path: impl AsRef<std::path::Path>,
        config: &crate::serial::SerialConfig,
    ) -> Result<Self> {
        let port = crate::serial::SerialPort::open(path, config)?;
        let reader = port.try_clone()?;
        Self::new(reader, port, config.frame.clone())
    }

    /// Whether the stream has reached EOF, failed, or been shut down.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stop the reader at its next wake-up and refuse further sends.
    pub fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("znp stream interface shut down");
        }
    }
}

impl RawInterface for StreamInterface {
    fn send(&self, frame: &Frame) -> Result<()> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        match writer.write_frame(frame) {
            Ok(()) => Ok(()),
            Err(FrameError::ConnectionClosed) => {
                self.closed.store(true, Ordering::SeqCst);
                Err(TransportError::Closed)
            }
            Err(err) => Err(TransportError::Frame(err)),
        }
    }

    fn subscribe(&self, callback: FrameCallback) -> FrameSubscription {
        self.listeners.subscribe(callback)
    }
}

impl Drop for StreamInterface {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn read_loop<R: Read>(mut reader: FrameReader<R>, listeners: &FrameListeners, closed: &AtomicBool) {
    while !closed.load(Ordering::SeqCst) {
        match reader.read_frame() {
            Ok(frame) => {
                debug!(
                    command_type = %frame.command_type,
                    command = %frame.command,
                    len = frame.payload.len(),
                    "frame received"
                );
                listeners.deliver(&frame);
            }
            Err(err) if err.is_recoverable() => {
                warn!(error = %err, "discarding malformed frame");
            }
            Err(FrameError::Io(err))
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(FrameError::ConnectionClosed) => {
                info!("znp stream reached end of input");
                break;
            }
            Err(err) => {
                error!(error = %err, "znp reader stopped");
                break;
            }
        }
    }
    closed.store(true, Ordering::SeqCst);
}
