//! Leading-status-byte convention of ZNP synchronous responses.
//!
//! Most SRSP payloads start with a one-byte status where zero means
//! success. These helpers sit between the raw response payload and the
//! typed decode of whatever follows.

use znp_encoding::DecodeError;

use crate::error::{Result, ZnpError};

pub const SUCCESS: u8 = 0x00;

/// `SYS_OSAL_NV_ITEM_INIT` reports a freshly created item with this code.
pub const NV_ITEM_UNINIT: u8 = 0x09;

/// Strip a zero status byte and return the rest of the payload.
pub fn check_status(payload: &[u8]) -> Result<&[u8]> {
    check_status_in(payload, &[SUCCESS])
}

/// Validate the status byte and discard any remaining payload.
pub fn check_only_status(payload: &[u8]) -> Result<()> {
    check_status(payload).map(|_| ())
}

/// Like [`check_status`], but treat every code in `accepted` as success.
pub fn check_status_in<'a>(payload: &'a [u8], accepted: &[u8]) -> Result<&'a [u8]> {
    match payload.split_first() {
        Some((code, rest)) if accepted.contains(code) => Ok(rest),
        Some((&code, _)) => Err(ZnpError::Status(code)),
        None => Err(DecodeError::UnexpectedEnd {
            needed: 1,
            remaining: 0,
        }
        .into()),
    }
}

/// Human-readable name for a Z-Stack status code.
pub fn describe(code: u8) -> &'static str {
    match code {
        0x00 => "success",
        0x01 => "failure",
        0x02 => "invalid parameter",
        0x09 => "NV item uninitialized",
        0x0A => "NV operation failed",
        0x0C => "NV bad item length",
        0x10 => "memory error",
        0x11 => "buffer full",
        0x12 => "unsupported mode",
        0x13 => "MAC memory error",
        0x80 => "ZDO invalid request type",
        0x84 => "ZDO not supported",
        0xB8 => "NWK invalid request",
        0xC2 => "NWK not permitted",
        0xCD => "NWK no route",
        0xE9 => "MAC no ACK",
        0xF0 => "MAC transaction expired",
        _ => "unknown status",
    }
}

/// Human-readable name for the error code of an `RPC_ERROR` response.
pub fn describe_rpc(code: u8) -> &'static str {
    match code {
        0x01 => "invalid subsystem",
        0x02 => "invalid command id",
        0x03 => "invalid parameter",
        0x04 => "invalid length",
        _ => "unknown RPC error",
    }
}
