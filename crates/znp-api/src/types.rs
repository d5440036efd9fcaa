//! Domain values carried in ZNP command payloads.

use std::fmt;

use znp_encoding::bytes::BytesMut;
use znp_encoding::{wire_enum, wire_struct, Wire};

/// 16-bit network (short) address.
pub type ShortAddress = u16;

/// 64-bit IEEE (extended) address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct IeeeAddress(pub u64);

impl fmt::Display for IeeeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        for (i, byte) in bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Wire for IeeeAddress {
    fn encode_to(&self, dst: &mut BytesMut) {
        self.0.encode_to(dst);
    }

    fn decode_from(src: &mut &[u8]) -> znp_encoding::Result<Self> {
        u64::decode_from(src).map(Self)
    }
}

/// Identifier of a non-volatile memory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NvItemId(pub u16);

impl NvItemId {
    pub const EXTADDR: Self = Self(0x0001);
    pub const STARTUP_OPTION: Self = Self(0x0003);
    pub const PRECFG_KEY: Self = Self(0x0062);
    pub const PRECFG_KEYS_ENABLE: Self = Self(0x0063);
    pub const PAN_ID: Self = Self(0x0083);
    pub const CHANNEL_LIST: Self = Self(0x0084);
    pub const LOGICAL_TYPE: Self = Self(0x0087);
    pub const ZDO_DIRECT_CB: Self = Self(0x008F);
    pub const HAS_CONFIGURED_ZSTACK1: Self = Self(0x0F00);
}

impl fmt::Display for NvItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

impl Wire for NvItemId {
    fn encode_to(&self, dst: &mut BytesMut) {
        self.0.encode_to(dst);
    }

    fn decode_from(src: &mut &[u8]) -> znp_encoding::Result<Self> {
        u16::decode_from(src).map(Self)
    }
}

/// Subsystems the firmware was built with, as reported by `SYS_PING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capability(pub u16);

impl Capability {
    pub const SYS: Self = Self(0x0001);
    pub const MAC: Self = Self(0x0002);
    pub const NWK: Self = Self(0x0004);
    pub const AF: Self = Self(0x0008);
    pub const ZDO: Self = Self(0x0010);
    pub const SAPI: Self = Self(0x0020);
    pub const UTIL: Self = Self(0x0040);
    pub const DEBUG: Self = Self(0x0080);
    pub const APP: Self = Self(0x0100);
    pub const ZOAD: Self = Self(0x1000);

    const NAMES: [(Self, &'static str); 10] = [
        (Self::SYS, "SYS"),
        (Self::MAC, "MAC"),
        (Self::NWK, "NWK"),
        (Self::AF, "AF"),
        (Self::ZDO, "ZDO"),
        (Self::SAPI, "SAPI"),
        (Self::UTIL, "UTIL"),
        (Self::DEBUG, "DEBUG"),
        (Self::APP, "APP"),
        (Self::ZOAD, "ZOAD"),
    ];

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Names of the subsystems present, in bit order.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join("|"))
    }
}

impl Wire for Capability {
    fn encode_to(&self, dst: &mut BytesMut) {
        self.0.encode_to(dst);
    }

    fn decode_from(src: &mut &[u8]) -> znp_encoding::Result<Self> {
        u16::decode_from(src).map(Self)
    }
}

wire_enum! {
    /// Network state of the device, as reported by `ZDO_STATE_CHANGE_IND`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum DeviceState: u8 {
        Hold = 0,
        Init = 1,
        NwkDisc = 2,
        NwkJoining = 3,
        NwkRejoin = 4,
        EndDeviceUnauth = 5,
        EndDevice = 6,
        Router = 7,
        CoordStarting = 8,
        ZbCoord = 9,
        NwkOrphan = 10,
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ResetReason: u8 {
        PowerUp = 0,
        External = 1,
        Watchdog = 2,
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Latency: u8 {
        NoLatency = 0,
        FastBeacons = 1,
        SlowBeacons = 2,
    }
}

wire_enum! {
    /// Addressing mode of a ZDO destination.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum AddrMode: u8 {
        NotPresent = 0,
        Group = 1,
        Addr16Bit = 2,
        Addr64Bit = 3,
        Broadcast = 15,
    }
}

wire_enum! {
    /// Result of `ZDO_STARTUP_FROM_APP`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum StartupFromAppResponse: u8 {
        RestoredNetworkState = 0,
        NewNetworkState = 1,
        LeaveAndNotStarted = 2,
    }
}

wire_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum LogicalType: u8 {
        Coordinator = 0,
        Router = 1,
        EndDevice = 2,
    }
}

wire_struct! {
    /// Payload of `SYS_RESET_IND`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResetInfo {
        pub reason: ResetReason,
        pub transport_rev: u8,
        pub product_id: u8,
        pub major_rel: u8,
        pub minor_rel: u8,
        pub hw_rev: u8,
    }
}

wire_struct! {
    /// Payload of `AF_INCOMING_MSG`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct IncomingMsg {
        pub group_id: u16,
        pub cluster_id: u16,
        pub src_addr: ShortAddress,
        pub src_endpoint: u8,
        pub dst_endpoint: u8,
        pub was_broadcast: bool,
        pub link_quality: u8,
        pub security_use: bool,
        pub timestamp: u32,
        pub trans_seq_number: u8,
        pub data: Vec<u8>,
    }
}

wire_struct! {
    /// Request payload of `AF_REGISTER`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EndpointDescriptor {
        pub endpoint: u8,
        pub profile_id: u16,
        pub device_id: u16,
        pub version: u8,
        pub latency: Latency,
        pub input_clusters: Vec<u16>,
        pub output_clusters: Vec<u16>,
    }
}

wire_struct! {
    /// Request payload of `AF_DATA_REQUEST`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DataRequest {
        pub dst_addr: ShortAddress,
        pub dst_endpoint: u8,
        pub src_endpoint: u8,
        pub cluster_id: u16,
        pub trans_id: u8,
        pub options: u8,
        pub radius: u8,
        pub data: Vec<u8>,
    }
}

wire_struct! {
    /// `ZDO_IEEE_ADDR_RSP` after its status byte.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct IeeeAddressResponse {
        pub ieee_addr: IeeeAddress,
        pub nwk_addr: ShortAddress,
        pub start_index: u8,
        pub associated_devices: Vec<ShortAddress>,
    }
}

/// 128-bit link key.
pub type LinkKey = [u8; 16];
