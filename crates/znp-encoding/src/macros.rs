/// Declare a fieldless enum carried on the wire as its integer discriminant.
///
/// Decoding an unknown discriminant fails with
/// [`DecodeError::InvalidValue`](crate::DecodeError::InvalidValue).
///
/// ```
/// znp_encoding::wire_enum! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq)]
///     pub enum Latency: u8 {
///         NoLatency = 0,
///         FastBeacons = 1,
///         SlowBeacons = 2,
///     }
/// }
///
/// assert_eq!(znp_encoding::decode::<Latency>(&[1]).unwrap(), Latency::FastBeacons);
/// assert!(znp_encoding::decode::<Latency>(&[7]).is_err());
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = $value:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr($repr)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant = $value,
            )+
        }

        impl $name {
            /// Raw wire discriminant.
            pub const fn as_raw(self) -> $repr {
                self as $repr
            }
        }

        impl ::core::convert::TryFrom<$repr> for $name {
            type Error = $crate::DecodeError;

            fn try_from(raw: $repr) -> ::core::result::Result<Self, Self::Error> {
                $(
                    if raw == $value {
                        return Ok(Self::$variant);
                    }
                )+
                Err($crate::DecodeError::InvalidValue {
                    ty: stringify!($name),
                    value: raw as u64,
                })
            }
        }

        impl $crate::Wire for $name {
            fn encode_to(&self, dst: &mut $crate::bytes::BytesMut) {
                <$repr as $crate::Wire>::encode_to(&self.as_raw(), dst);
            }

            fn decode_from(src: &mut &[u8]) -> $crate::Result<Self> {
                let raw = <$repr as $crate::Wire>::decode_from(src)?;
                ::core::convert::TryFrom::try_from(raw)
            }
        }
    };
}

/// Declare a struct whose wire form is its fields encoded in order.
///
/// ```
/// znp_encoding::wire_struct! {
///     #[derive(Debug, PartialEq)]
///     pub struct Endpoint {
///         pub id: u8,
///         pub profile: u16,
///         pub clusters: Vec<u16>,
///     }
/// }
///
/// let endpoint = Endpoint { id: 1, profile: 0x0104, clusters: vec![6] };
/// let bytes = znp_encoding::encode(&endpoint);
/// assert_eq!(bytes.as_ref(), &[1, 0x04, 0x01, 1, 6, 0]);
/// assert_eq!(znp_encoding::decode::<Endpoint>(&bytes).unwrap(), endpoint);
/// ```
#[macro_export]
macro_rules! wire_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )+
        }

        impl $crate::Wire for $name {
            fn encode_to(&self, dst: &mut $crate::bytes::BytesMut) {
                $( <$ty as $crate::Wire>::encode_to(&self.$field, dst); )+
            }

            fn decode_from(src: &mut &[u8]) -> $crate::Result<Self> {
                Ok(Self {
                    $( $field: <$ty as $crate::Wire>::decode_from(src)?, )+
                })
            }
        }
    };
}
