//! Frame-level transports for ZNP devices.
//!
//! [`RawInterface`] is the seam between the dispatch engine and the wire:
//! send a frame, and be told about every frame that arrives. The
//! [`StreamInterface`] implementation runs over any `Read`/`Write` pair,
//! including a [`SerialPort`] configured for a ZNP adapter.

pub mod error;
pub mod interface;
pub mod serial;
pub mod stream;

pub use error::{Result, TransportError};
pub use interface::{FrameCallback, FrameListeners, FrameSubscription, RawInterface};
pub use serial::{SerialConfig, SerialPort};
pub use stream::StreamInterface;
