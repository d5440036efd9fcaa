//! Typed little-endian wire encoding for ZNP command payloads.
//!
//! Every payload type implements [`Wire`] once, at compile time. Three entry
//! points turn values into bytes and back:
//!
//! - [`encode`] is total for every `Wire` type. Sequences longer than a
//!   frame payload are written in full, so the frame layer refuses them.
//! - [`decode`] requires the input to be consumed exactly.
//! - [`decode_partial`] ignores trailing bytes, for responses that always
//!   return a fixed-size buffer regardless of the logical value's width.

pub mod error;
mod macros;
pub mod wire;

pub use error::{DecodeError, Result};
pub use wire::Wire;

#[doc(hidden)]
pub use bytes;

use bytes::{Bytes, BytesMut};

/// Encode a value into a fresh byte buffer.
pub fn encode<T: Wire>(value: &T) -> Bytes {
    let mut dst = BytesMut::new();
    value.encode_to(&mut dst);
    dst.freeze()
}

/// Decode a value, failing if any input bytes are left over.
pub fn decode<T: Wire>(data: &[u8]) -> Result<T> {
    let mut src = data;
    let value = T::decode_from(&mut src)?;
    if !src.is_empty() {
        return Err(DecodeError::TrailingBytes(src.len()));
    }
    Ok(value)
}

/// Decode a value and discard any trailing bytes beyond its wire width.
pub fn decode_partial<T: Wire>(data: &[u8]) -> Result<T> {
    let mut src = data;
    T::decode_from(&mut src)
}
