//! ZDO (device object) subsystem.
//!
//! Several ZDO requests are answered twice: an `SRSP` acknowledging the
//! request, then an `AREQ` carrying the remote device's answer. Those use
//! [`ZnpApi::wait_after`] so the answer is only reported once the
//! acknowledgement succeeded.

use std::future::Future;

use znp_encoding::{decode, encode};
use znp_frame::{zdo, CommandType};

use crate::api::ZnpApi;
use crate::error::{Result, ZnpError};
use crate::status::{check_status, SUCCESS};
use crate::types::{
    AddrMode, IeeeAddress, IeeeAddressResponse, LinkKey, ShortAddress, StartupFromAppResponse,
};

/// `ReqType` of `ZDO_IEEE_ADDR_REQ`.
const SINGLE_DEVICE: u8 = 0x00;
const EXTENDED: u8 = 0x01;

impl ZnpApi {
    /// Ask the device at `address` for its IEEE address.
    ///
    /// With `children_index`, the response also lists associated devices
    /// starting at that index.
    pub fn zdo_ieee_address(
        &self,
        address: ShortAddress,
        children_index: Option<u8>,
    ) -> impl Future<Output = Result<IeeeAddressResponse>> + Send + 'static + use<'_> {
        let (req_type, start_index) = match children_index {
            Some(index) => (EXTENDED, index),
            None => (SINGLE_DEVICE, 0),
        };
        let payload = encode(&(address, req_type, start_index));
        let answer = self.wait_after(
            || self.request_status(zdo::IEEE_ADDR_REQ, payload),
            CommandType::Areq,
            zdo::IEEE_ADDR_RSP,
        );
        async move { Ok(decode(check_status(&answer.await?)?)?) }
    }

    pub fn zdo_remove_link_key(
        &self,
        ieee_addr: IeeeAddress,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        self.request_status(zdo::REMOVE_LINK_KEY, encode(&ieee_addr))
    }

    pub fn zdo_get_link_key(
        &self,
        ieee_addr: IeeeAddress,
    ) -> impl Future<Output = Result<(IeeeAddress, LinkKey)>> + Send + 'static {
        self.request_checked(zdo::GET_LINK_KEY, encode(&ieee_addr))
    }

    /// Ask `dst_addr` to remove `device_addr` from the network. Resolves
    /// with the address that answered.
    pub fn zdo_mgmt_leave(
        &self,
        dst_addr: ShortAddress,
        device_addr: IeeeAddress,
        remove_rejoin: u8,
    ) -> impl Future<Output = Result<ShortAddress>> + Send + 'static + use<'_> {
        let payload = encode(&(dst_addr, device_addr, remove_rejoin));
        let answer = self.wait_after(
            || self.request_status(zdo::MGMT_LEAVE_REQ, payload),
            CommandType::Areq,
            zdo::MGMT_LEAVE_RSP,
        );
        async move { source_of_answer(&answer.await?) }
    }

    /// Open the join window for `duration` seconds (0 closes it, 0xFF keeps
    /// it open). Resolves with the address that answered.
    pub fn zdo_mgmt_permit_join(
        &self,
        addr_mode: AddrMode,
        dst_address: u16,
        duration: u8,
        tc_significance: u8,
    ) -> impl Future<Output = Result<u16>> + Send + 'static + use<'_> {
        let payload = encode(&(addr_mode, dst_address, duration, tc_significance));
        let answer = self.wait_after(
            || self.request_status(zdo::MGMT_PERMIT_JOIN_REQ, payload),
            CommandType::Areq,
            zdo::MGMT_PERMIT_JOIN_RSP,
        );
        async move { source_of_answer(&answer.await?) }
    }

    /// Start the network stack after `start_delay_ms`.
    pub fn zdo_startup_from_app(
        &self,
        start_delay_ms: u16,
    ) -> impl Future<Output = Result<StartupFromAppResponse>> + Send + 'static {
        self.request_decoded(zdo::STARTUP_FROM_APP, encode(&start_delay_ms))
    }
}

/// Management responses carry `SrcAddr` then a status byte.
fn source_of_answer(payload: &[u8]) -> Result<ShortAddress> {
    let (src_addr, status): (ShortAddress, u8) = decode(payload)?;
    if status != SUCCESS {
        return Err(ZnpError::Status(status));
    }
    Ok(src_addr)
}
