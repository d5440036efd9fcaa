//! AF (application framework) subsystem.

use std::future::Future;

use znp_encoding::encode;
use znp_frame::af;

use crate::api::ZnpApi;
use crate::error::Result;
use crate::types::{DataRequest, EndpointDescriptor};

impl ZnpApi {
    /// Register an application endpoint.
    pub fn af_register(
        &self,
        endpoint: &EndpointDescriptor,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        self.request_status(af::REGISTER, encode(endpoint))
    }

    /// Queue a message for transmission. Success means the device accepted
    /// the request, not that it was delivered.
    pub fn af_data_request(
        &self,
        request: &DataRequest,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        self.request_status(af::DATA_REQUEST, encode(request))
    }
}
