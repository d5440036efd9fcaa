use std::time::Duration;

use znp_encoding::DecodeError;
use znp_frame::Command;
use znp_transport::TransportError;

use crate::status;
use crate::types::DeviceState;

/// Errors surfaced by ZNP operations.
///
/// Every public operation fails with one of these rather than panicking.
/// A failure only ever affects the operation that triggered it; other
/// pending requests and the dispatch loop carry on.
#[derive(Debug, thiserror::Error)]
pub enum ZnpError {
    /// A payload was malformed or had the wrong length for its type.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The device answered with a non-zero status byte.
    #[error("device returned status {0:#04x} ({name})", name = status::describe(*.0))]
    Status(u8),

    /// The frame could not be handed to the transport.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The device moved to a state outside the allowed set while a caller
    /// was waiting for it to converge.
    #[error("unexpected device state {0:?}")]
    UnexpectedState(DeviceState),

    /// A permanent event handler could not decode its frame. Logged by the
    /// handler chain, never returned to a caller.
    #[error("failed to decode {command}: {source}")]
    HandlerDecode {
        command: Command,
        #[source]
        source: DecodeError,
    },

    /// The device rejected the request frame itself (`RPC_ERROR` response).
    #[error("device rejected command: {name} ({code:#04x})", name = status::describe_rpc(*.code))]
    Rpc { code: u8 },

    /// A bounded wait expired. Only produced by [`with_timeout`](crate::with_timeout).
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The engine was dropped before the awaited frame or event arrived.
    #[error("ZNP engine closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, ZnpError>;
