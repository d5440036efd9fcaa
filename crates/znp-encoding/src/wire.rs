use bytes::{Buf, BufMut, BytesMut};

use crate::error::{DecodeError, Result};

/// A value with a fixed mapping to and from its ZNP wire representation.
///
/// Multi-byte integers are little-endian. Sequences carry a one-byte element
/// count prefix, matching how the MT command set lays out cluster lists and
/// data buffers.
pub trait Wire: Sized {
    /// Append the wire form of `self` to `dst`.
    fn encode_to(&self, dst: &mut BytesMut);

    /// Read one value from the front of `src`, advancing it past the bytes used.
    fn decode_from(src: &mut &[u8]) -> Result<Self>;
}

/// Fail with `UnexpectedEnd` unless `src` holds at least `needed` bytes.
pub fn ensure_remaining(src: &[u8], needed: usize) -> Result<()> {
    if src.len() < needed {
        return Err(DecodeError::UnexpectedEnd {
            needed,
            remaining: src.len(),
        });
    }
    Ok(())
}

impl Wire for () {
    fn encode_to(&self, _dst: &mut BytesMut) {}

    fn decode_from(_src: &mut &[u8]) -> Result<Self> {
        Ok(())
    }
}

macro_rules! impl_wire_int {
    ($($ty:ty => $put:ident, $get:ident;)+) => {
        $(
            impl Wire for $ty {
                fn encode_to(&self, dst: &mut BytesMut) {
                    dst.$put(*self);
                }

                fn decode_from(src: &mut &[u8]) -> Result<Self> {
                    ensure_remaining(src, std::mem::size_of::<$ty>())?;
                    Ok(src.$get())
                }
            }
        )+
    };
}

impl_wire_int! {
    u8 => put_u8, get_u8;
    i8 => put_i8, get_i8;
    u16 => put_u16_le, get_u16_le;
    i16 => put_i16_le, get_i16_le;
    u32 => put_u32_le, get_u32_le;
    i32 => put_i32_le, get_i32_le;
    u64 => put_u64_le, get_u64_le;
}

impl Wire for bool {
    fn encode_to(&self, dst: &mut BytesMut) {
        dst.put_u8(u8::from(*self));
    }

    fn decode_from(src: &mut &[u8]) -> Result<Self> {
        match u8::decode_from(src)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidValue {
                ty: "bool",
                value: u64::from(other),
            }),
        }
    }
}

impl<const N: usize> Wire for [u8; N] {
    fn encode_to(&self, dst: &mut BytesMut) {
        dst.put_slice(self);
    }

    fn decode_from(src: &mut &[u8]) -> Result<Self> {
        ensure_remaining(src, N)?;
        let mut out = [0u8; N];
        src.copy_to_slice(&mut out);
        Ok(out)
    }
}

/// Count-prefixed sequence.
///
/// Sequences are bounded by the 250-byte frame payload. A longer one is
/// never shortened to fit its one-byte count: every element is written
/// after a saturated count, so the frame encoder rejects the payload as too
/// large and a strict [`decode`](crate::decode) reports trailing bytes.
impl<T: Wire> Wire for Vec<T> {
    fn encode_to(&self, dst: &mut BytesMut) {
        dst.put_u8(u8::try_from(self.len()).unwrap_or(u8::MAX));
        for item in self {
            item.encode_to(dst);
        }
    }

    fn decode_from(src: &mut &[u8]) -> Result<Self> {
        let count = usize::from(u8::decode_from(src)?);
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(T::decode_from(src)?);
        }
        Ok(out)
    }
}

macro_rules! impl_wire_tuple {
    ($($name:ident),+) => {
        impl<$($name: Wire),+> Wire for ($($name,)+) {
            #[allow(non_snake_case)]
            fn encode_to(&self, dst: &mut BytesMut) {
                let ($($name,)+) = self;
                $($name.encode_to(dst);)+
            }

            fn decode_from(src: &mut &[u8]) -> Result<Self> {
                Ok(($($name::decode_from(src)?,)+))
            }
        }
    };
}

impl_wire_tuple!(A);
impl_wire_tuple!(A, B);
impl_wire_tuple!(A, B, C);
impl_wire_tuple!(A, B, C, D);
impl_wire_tuple!(A, B, C, D, E);
impl_wire_tuple!(A, B, C, D, E, F);
impl_wire_tuple!(A, B, C, D, E, F, G);
impl_wire_tuple!(A, B, C, D, E, F, G, H);
