//! Command/response/event dispatch engine for Z-Stack ZNP devices.
//!
//! A ZNP device speaks one synchronous request at a time over a serial
//! link, interleaved with a continuous stream of unsolicited indications.
//! This crate turns that stream into:
//!
//! - typed request futures ([`ZnpApi::sys_ping`], [`ZnpApi::af_register`],
//!   ...) that resolve when the matching response arrives,
//! - multicast [`EventBus`]es for resets, incoming messages, state changes
//!   and permit-join windows,
//! - [`ZnpApi::wait_for_state`] for waiting on network state convergence.
//!
//! Underneath sits an ordered [`HandlerChain`]: every frame from the
//! transport is offered to one-shot waiters and permanent event handlers in
//! registration order until one of them claims it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use znp_api::{config, with_timeout, DeviceState, ZnpApi};
//! use znp_transport::{SerialConfig, StreamInterface};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = StreamInterface::open("/dev/ttyACM0", &SerialConfig::default())?;
//! let api = ZnpApi::new(Arc::new(transport));
//!
//! let caps = with_timeout(Duration::from_secs(2), api.sys_ping()).await?;
//! println!("capabilities: {caps}");
//!
//! let pan_id = api.sapi_read_configuration::<config::PanId>().await?;
//! println!("PAN id: {pan_id:#06x}");
//!
//! let started = api.wait_for_state([DeviceState::ZbCoord], [DeviceState::CoordStarting]);
//! api.zdo_startup_from_app(100).await?;
//! started.await?;
//! # Ok(())
//! # }
//! ```

mod af;
mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod handler;
pub mod info;
pub mod pending;
mod sapi;
pub mod state;
pub mod status;
mod sys;
mod timeout;
pub mod types;
mod util;
mod zdo;

pub use api::ZnpApi;
pub use config::{ConfigId, ConfigurationOption};
pub use error::{Result, ZnpError};
pub use events::{EventBus, NextEvent, Subscription, ZnpEvents};
pub use handler::{Handler, HandlerAction, HandlerChain, HandlerId};
pub use info::{DeviceInfo, DeviceInfoId};
pub use pending::PendingResponse;
pub use status::{check_only_status, check_status};
pub use timeout::with_timeout;
pub use types::{
    AddrMode, Capability, DataRequest, DeviceState, EndpointDescriptor, IeeeAddress,
    IeeeAddressResponse, IncomingMsg, Latency, LinkKey, LogicalType, NvItemId, ResetInfo,
    ResetReason, ShortAddress, StartupFromAppResponse,
};
