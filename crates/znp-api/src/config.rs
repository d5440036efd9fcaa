//! SAPI configuration items, bound to their value types at compile time.
//!
//! Each item is a zero-sized marker implementing [`ConfigurationOption`],
//! so `api.sapi_read_configuration::<config::PanId>()` can only ever yield a
//! `u16`.

use znp_encoding::{wire_enum, Wire};

wire_enum! {
    /// Wire identifier of a configuration item.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum ConfigId: u8 {
        StartupOption = 0x03,
        ExtendedPanId = 0x2D,
        PrecfgKey = 0x62,
        PrecfgKeysEnable = 0x63,
        SecurityMode = 0x64,
        PanId = 0x83,
        ChanList = 0x84,
        LogicalType = 0x87,
        ZdoDirectCb = 0x8F,
    }
}

/// A configuration item with a fixed identifier and value type.
pub trait ConfigurationOption: 'static {
    const ID: ConfigId;
    type Value: Wire + Send + 'static;
}

macro_rules! configuration_options {
    ($($(#[$meta:meta])* $name:ident => $id:ident: $value:ty;)+) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
            pub struct $name;

            impl ConfigurationOption for $name {
                const ID: ConfigId = ConfigId::$id;
                type Value = $value;
            }
        )+
    };
}

configuration_options! {
    /// Bit 0 clears network state on the next start, bit 1 clears config.
    StartupOption => StartupOption: u8;
    PanId => PanId: u16;
    ExtendedPanId => ExtendedPanId: u64;
    /// Bitmask of channels 11..=26.
    ChannelList => ChanList: u32;
    PrecfgKey => PrecfgKey: [u8; 16];
    PrecfgKeysEnable => PrecfgKeysEnable: bool;
    SecurityMode => SecurityMode: bool;
    LogicalType => LogicalType: crate::types::LogicalType;
    ZdoDirectCb => ZdoDirectCb: bool;
}
