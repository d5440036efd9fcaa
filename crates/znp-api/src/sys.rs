//! SYS subsystem: reset, ping and non-volatile memory items.

use std::future::Future;

use znp_encoding::encode;
use znp_frame::sys;

use crate::api::ZnpApi;
use crate::error::Result;
use crate::status::{check_status_in, NV_ITEM_UNINIT, SUCCESS};
use crate::types::{Capability, NvItemId, ResetInfo};

impl ZnpApi {
    /// Reset the device and resolve with its next reset indication.
    ///
    /// The reset request has no synchronous response. The indication is
    /// taken from the reset event bus, so existing `sys_on_reset`
    /// subscribers see it too.
    pub fn sys_reset(
        &self,
        soft_reset: bool,
    ) -> impl Future<Output = Result<ResetInfo>> + Send + 'static {
        let indication = self.sys_on_reset().next();
        let sent = self.send_areq(sys::RESET_REQ, encode(&soft_reset));
        async move {
            sent?;
            indication.await
        }
    }

    pub fn sys_ping(&self) -> impl Future<Output = Result<Capability>> + Send + 'static {
        self.request_decoded(sys::PING, encode(&()))
    }

    /// Create an NV item if it does not exist yet.
    ///
    /// The device answers `0x09` when it had to create the item, which
    /// counts as success here.
    pub fn sys_osal_nv_item_init_raw(
        &self,
        id: NvItemId,
        item_len: u16,
        init_data: Vec<u8>,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        let payload = encode(&(id, item_len, init_data));
        let response = self.send_and_wait(sys::OSAL_NV_ITEM_INIT, payload);
        async move {
            check_status_in(&response.await?, &[SUCCESS, NV_ITEM_UNINIT])?;
            Ok(())
        }
    }

    pub fn sys_osal_nv_read_raw(
        &self,
        id: NvItemId,
        offset: u8,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send + 'static {
        self.request_checked(sys::OSAL_NV_READ, encode(&(id, offset)))
    }

    pub fn sys_osal_nv_write_raw(
        &self,
        id: NvItemId,
        offset: u8,
        value: Vec<u8>,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        self.request_status(sys::OSAL_NV_WRITE, encode(&(id, offset, value)))
    }

    pub fn sys_osal_nv_delete(
        &self,
        id: NvItemId,
        item_len: u16,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        self.request_status(sys::OSAL_NV_DELETE, encode(&(id, item_len)))
    }

    /// Length of an NV item; zero if it does not exist.
    pub fn sys_osal_nv_length(
        &self,
        id: NvItemId,
    ) -> impl Future<Output = Result<u16>> + Send + 'static {
        self.request_decoded(sys::OSAL_NV_LENGTH, encode(&id))
    }
}
