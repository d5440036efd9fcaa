//! `SAPI_GET_DEVICE_INFO` parameters, bound to their value types at
//! compile time.
//!
//! The device always answers with an eight-byte buffer, so values are read
//! with a partial decode.

use znp_encoding::{wire_enum, Wire};

use crate::types::{DeviceState, IeeeAddress, ShortAddress};

wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum DeviceInfoId: u8 {
        State = 0,
        IeeeAddr = 1,
        ShortAddr = 2,
        ParentShortAddr = 3,
        ParentIeeeAddr = 4,
        Channel = 5,
        PanId = 6,
        ExtPanId = 7,
    }
}

/// A device-info parameter with a fixed identifier and value type.
pub trait DeviceInfo: 'static {
    const ID: DeviceInfoId;
    type Value: Wire + Send + 'static;
}

macro_rules! device_info {
    ($($name:ident: $value:ty;)+) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
            pub struct $name;

            impl DeviceInfo for $name {
                const ID: DeviceInfoId = DeviceInfoId::$name;
                type Value = $value;
            }
        )+
    };
}

device_info! {
    State: DeviceState;
    IeeeAddr: IeeeAddress;
    ShortAddr: ShortAddress;
    ParentShortAddr: ShortAddress;
    ParentIeeeAddr: IeeeAddress;
    Channel: u8;
    PanId: u16;
    ExtPanId: u64;
}
