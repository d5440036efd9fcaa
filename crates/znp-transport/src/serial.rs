use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort as _, StopBits};
use tracing::{debug, info};
use znp_frame::FrameConfig;

use crate::error::{Result, TransportError};

/// Serial line settings for a ZNP adapter.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Line speed. Default: 115200.
    pub baud_rate: u32,
    /// How long a read waits for the first byte before the reader
    /// re-checks for shutdown. Default: 100ms.
    pub read_timeout: Duration,
    /// Frame limits applied on top of the serial line.
    pub frame: FrameConfig,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            read_timeout: Duration::from_millis(100),
            frame: FrameConfig::default(),
        }
    }
}

/// A serial device opened for raw 8N1 operation without flow control.
///
/// Reads that see no byte within [`SerialConfig::read_timeout`] fail with
/// `ErrorKind::TimedOut`.
pub struct SerialPort {
    port: Box<dyn serialport::SerialPort>,
    path: PathBuf,
}

impl SerialPort {
    /// Open and configure the device at `path`.
    pub fn open(path: impl AsRef<Path>, config: &SerialConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let open_error = |err: serialport::Error| TransportError::Open {
            path: path.clone(),
            source: io::Error::from(err),
        };

        let port = serialport::new(path.to_string_lossy(), config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(open_error)?;

        if let Err(err) = port.clear(ClearBuffer::All) {
            debug!(error = %err, "discarding stale serial input failed");
        }

        info!(path = %path.display(), baud = config.baud_rate, "opened serial port");
        Ok(Self { port, path })
    }

    /// Second handle on the same device so reads and writes can live on
    /// different threads.
    pub fn try_clone(&self) -> Result<Self> {
        let port = self.port.try_clone().map_err(io::Error::from)?;
        Ok(Self {
            port,
            path: self.path.clone(),
        })
    }

    /// Device path this port was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .field("baud_rate", &self.port.baud_rate().ok())
            .finish()
    }
}

impl Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}
