//! Command types, subsystems and the MT command tables.
//!
//! CMD0 carries the command type in its top three bits and the subsystem in
//! the low five; CMD1 is the command id within the subsystem.

use std::fmt;

use crate::error::FrameError;

/// Frame category carried in the top bits of CMD0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandType {
    Poll = 0,
    /// Synchronous request; obliges exactly one `Srsp`.
    Sreq = 1,
    /// Asynchronous request or indication.
    Areq = 2,
    /// Synchronous response.
    Srsp = 3,
}

impl TryFrom<u8> for CommandType {
    type Error = FrameError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Poll),
            1 => Ok(Self::Sreq),
            2 => Ok(Self::Areq),
            3 => Ok(Self::Srsp),
            other => Err(FrameError::UnknownCommandType(other)),
        }
    }
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Poll => "POLL",
            Self::Sreq => "SREQ",
            Self::Areq => "AREQ",
            Self::Srsp => "SRSP",
        };
        f.write_str(name)
    }
}

/// Protocol area a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Subsystem {
    RpcError = 0x00,
    Sys = 0x01,
    Mac = 0x02,
    Nwk = 0x03,
    Af = 0x04,
    Zdo = 0x05,
    Sapi = 0x06,
    Util = 0x07,
    Debug = 0x08,
    App = 0x09,
    AppConfig = 0x0F,
    GreenPower = 0x15,
}

impl TryFrom<u8> for Subsystem {
    type Error = FrameError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0x00 => Ok(Self::RpcError),
            0x01 => Ok(Self::Sys),
            0x02 => Ok(Self::Mac),
            0x03 => Ok(Self::Nwk),
            0x04 => Ok(Self::Af),
            0x05 => Ok(Self::Zdo),
            0x06 => Ok(Self::Sapi),
            0x07 => Ok(Self::Util),
            0x08 => Ok(Self::Debug),
            0x09 => Ok(Self::App),
            0x0F => Ok(Self::AppConfig),
            0x15 => Ok(Self::GreenPower),
            other => Err(FrameError::UnknownSubsystem(other)),
        }
    }
}

impl Subsystem {
    /// Short uppercase name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::RpcError => "RPC_ERROR",
            Self::Sys => "SYS",
            Self::Mac => "MAC",
            Self::Nwk => "NWK",
            Self::Af => "AF",
            Self::Zdo => "ZDO",
            Self::Sapi => "SAPI",
            Self::Util => "UTIL",
            Self::Debug => "DEBUG",
            Self::App => "APP",
            Self::AppConfig => "APP_CNF",
            Self::GreenPower => "GP",
        }
    }
}

/// A command identifier scoped to its subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Command {
    pub subsystem: Subsystem,
    pub id: u8,
}

impl Command {
    pub const fn new(subsystem: Subsystem, id: u8) -> Self {
        Self { subsystem, id }
    }

    /// Build CMD0 for this command sent as `command_type`.
    pub const fn cmd0(self, command_type: CommandType) -> u8 {
        ((command_type as u8) << 5) | (self.subsystem as u8)
    }

    /// Split CMD0/CMD1 back into a command type and command.
    pub fn from_header(cmd0: u8, cmd1: u8) -> Result<(CommandType, Self), FrameError> {
        let command_type = CommandType::try_from(cmd0 >> 5)?;
        let subsystem = Subsystem::try_from(cmd0 & 0x1F)?;
        Ok((command_type, Self::new(subsystem, cmd1)))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match command_name(*self) {
            Some(name) => f.write_str(name),
            None => write!(f, "{}(0x{:02X})", self.subsystem.name(), self.id),
        }
    }
}

/// SYS subsystem.
pub mod sys {
    use super::{Command, Subsystem};

    pub const RESET_REQ: Command = Command::new(Subsystem::Sys, 0x00);
    pub const PING: Command = Command::new(Subsystem::Sys, 0x01);
    pub const VERSION: Command = Command::new(Subsystem::Sys, 0x02);
    pub const OSAL_NV_ITEM_INIT: Command = Command::new(Subsystem::Sys, 0x07);
    pub const OSAL_NV_READ: Command = Command::new(Subsystem::Sys, 0x08);
    pub const OSAL_NV_WRITE: Command = Command::new(Subsystem::Sys, 0x09);
    pub const OSAL_NV_DELETE: Command = Command::new(Subsystem::Sys, 0x12);
    pub const OSAL_NV_LENGTH: Command = Command::new(Subsystem::Sys, 0x13);
    pub const RESET_IND: Command = Command::new(Subsystem::Sys, 0x80);
}

/// AF (application framework) subsystem.
pub mod af {
    use super::{Command, Subsystem};

    pub const REGISTER: Command = Command::new(Subsystem::Af, 0x00);
    pub const DATA_REQUEST: Command = Command::new(Subsystem::Af, 0x01);
    pub const DATA_CONFIRM: Command = Command::new(Subsystem::Af, 0x80);
    pub const INCOMING_MSG: Command = Command::new(Subsystem::Af, 0x81);
}

/// ZDO (device object) subsystem.
pub mod zdo {
    use super::{Command, Subsystem};

    pub const IEEE_ADDR_REQ: Command = Command::new(Subsystem::Zdo, 0x01);
    pub const REMOVE_LINK_KEY: Command = Command::new(Subsystem::Zdo, 0x24);
    pub const GET_LINK_KEY: Command = Command::new(Subsystem::Zdo, 0x25);
    pub const MGMT_LEAVE_REQ: Command = Command::new(Subsystem::Zdo, 0x34);
    pub const MGMT_PERMIT_JOIN_REQ: Command = Command::new(Subsystem::Zdo, 0x36);
    pub const STARTUP_FROM_APP: Command = Command::new(Subsystem::Zdo, 0x40);
    pub const IEEE_ADDR_RSP: Command = Command::new(Subsystem::Zdo, 0x81);
    pub const MGMT_LEAVE_RSP: Command = Command::new(Subsystem::Zdo, 0xB4);
    pub const MGMT_PERMIT_JOIN_RSP: Command = Command::new(Subsystem::Zdo, 0xB6);
    pub const STATE_CHANGE_IND: Command = Command::new(Subsystem::Zdo, 0xC0);
    pub const END_DEVICE_ANNCE_IND: Command = Command::new(Subsystem::Zdo, 0xC1);
    pub const TC_DEV_IND: Command = Command::new(Subsystem::Zdo, 0xCA);
    pub const PERMIT_JOIN_IND: Command = Command::new(Subsystem::Zdo, 0xCB);
}

/// SAPI (simple API) subsystem.
pub mod sapi {
    use super::{Command, Subsystem};

    pub const READ_CONFIGURATION: Command = Command::new(Subsystem::Sapi, 0x04);
    pub const WRITE_CONFIGURATION: Command = Command::new(Subsystem::Sapi, 0x05);
    pub const GET_DEVICE_INFO: Command = Command::new(Subsystem::Sapi, 0x06);
}

/// UTIL subsystem.
pub mod util {
    use super::{Command, Subsystem};

    pub const ADDRMGR_EXT_ADDR_LOOKUP: Command = Command::new(Subsystem::Util, 0x40);
    pub const ADDRMGR_NWK_ADDR_LOOKUP: Command = Command::new(Subsystem::Util, 0x41);
}

/// The device's rejection of an unknown or malformed request.
pub const RPC_ERROR: Command = Command::new(Subsystem::RpcError, 0x00);

/// Returns the MT name of a known command.
pub fn command_name(command: Command) -> Option<&'static str> {
    let name = match command {
        sys::RESET_REQ => "SYS_RESET_REQ",
        sys::PING => "SYS_PING",
        sys::VERSION => "SYS_VERSION",
        sys::OSAL_NV_ITEM_INIT => "SYS_OSAL_NV_ITEM_INIT",
        sys::OSAL_NV_READ => "SYS_OSAL_NV_READ",
        sys::OSAL_NV_WRITE => "SYS_OSAL_NV_WRITE",
        sys::OSAL_NV_DELETE => "SYS_OSAL_NV_DELETE",
        sys::OSAL_NV_LENGTH => "SYS_OSAL_NV_LENGTH",
        sys::RESET_IND => "SYS_RESET_IND",
        af::REGISTER => "AF_REGISTER",
        af::DATA_REQUEST => "AF_DATA_REQUEST",
        af::DATA_CONFIRM => "AF_DATA_CONFIRM",
        af::INCOMING_MSG => "AF_INCOMING_MSG",
        zdo::IEEE_ADDR_REQ => "ZDO_IEEE_ADDR_REQ",
        zdo::REMOVE_LINK_KEY => "ZDO_REMOVE_LINK_KEY",
        zdo::GET_LINK_KEY => "ZDO_GET_LINK_KEY",
        zdo::MGMT_LEAVE_REQ => "ZDO_MGMT_LEAVE_REQ",
        zdo::MGMT_PERMIT_JOIN_REQ => "ZDO_MGMT_PERMIT_JOIN_REQ",
        zdo::STARTUP_FROM_APP => "ZDO_STARTUP_FROM_APP",
        zdo::IEEE_ADDR_RSP => "ZDO_IEEE_ADDR_RSP",
        zdo::MGMT_LEAVE_RSP => "ZDO_MGMT_LEAVE_RSP",
        zdo::MGMT_PERMIT_JOIN_RSP => "ZDO_MGMT_PERMIT_JOIN_RSP",
        zdo::STATE_CHANGE_IND => "ZDO_STATE_CHANGE_IND",
        zdo::END_DEVICE_ANNCE_IND => "ZDO_END_DEVICE_ANNCE_IND",
        zdo::TC_DEV_IND => "ZDO_TC_DEV_IND",
        zdo::PERMIT_JOIN_IND => "ZDO_PERMIT_JOIN_IND",
        sapi::READ_CONFIGURATION => "ZB_READ_CONFIGURATION",
        sapi::WRITE_CONFIGURATION => "ZB_WRITE_CONFIGURATION",
        sapi::GET_DEVICE_INFO => "ZB_GET_DEVICE_INFO",
        util::ADDRMGR_EXT_ADDR_LOOKUP => "UTIL_ADDRMGR_EXT_ADDR_LOOKUP",
        util::ADDRMGR_NWK_ADDR_LOOKUP => "UTIL_ADDRMGR_NWK_ADDR_LOOKUP",
        RPC_ERROR => "RPC_ERROR",
        _ => return None,
    };
    Some(name)
}
