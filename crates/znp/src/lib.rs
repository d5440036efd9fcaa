//! Async driver for Z-Stack ZNP Zigbee coordinators.
//!
//! Typed requests, responses and events over the Monitor and Test (MT)
//! serial protocol spoken by Texas Instruments ZNP firmware.
//!
//! # Crate Structure
//!
//! - [`encoding`] - `Wire` trait mapping typed values to command payloads
//! - [`frame`] - MT frame format, command tables and frame I/O
//! - [`transport`] - Raw frame interfaces (serial port, any byte stream)
//! - [`api`] - Dispatch engine, events and the typed command facade

/// Re-export payload encoding.
pub mod encoding {
    pub use znp_encoding::*;
}

/// Re-export frame types.
pub mod frame {
    pub use znp_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use znp_transport::*;
}

/// Re-export the dispatch engine and typed facade.
pub mod api {
    pub use znp_api::*;
}

pub use znp_api::{with_timeout, ZnpApi, ZnpError};
