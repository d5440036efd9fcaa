use std::future::Future;

use znp_encoding::encode;
use znp_frame::util;

use crate::api::ZnpApi;
use crate::error::Result;
use crate::types::{IeeeAddress, ShortAddress};

impl ZnpApi {
    /// Look up the IEEE address the device has recorded for `address`.
    pub fn util_addrmgr_nwk_addr_lookup(
        &self,
        address: ShortAddress,
    ) -> impl Future<Output = Result<IeeeAddress>> + Send + 'static {
        self.request_decoded(util::ADDRMGR_NWK_ADDR_LOOKUP, encode(&address))
    }
}
