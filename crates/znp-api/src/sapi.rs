//! SAPI (simple API) configuration and device info.

use std::future::Future;

use znp_encoding::{decode, decode_partial, encode, DecodeError};
use znp_frame::sapi;

use crate::api::ZnpApi;
use crate::config::{ConfigId, ConfigurationOption};
use crate::error::Result;
use crate::info::{DeviceInfo, DeviceInfoId};
use crate::status::check_status;

impl ZnpApi {
    /// Read a configuration item as raw bytes.
    pub fn sapi_read_configuration_raw(
        &self,
        id: ConfigId,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send + 'static {
        let response = self.send_and_wait(sapi::READ_CONFIGURATION, encode(&id));
        async move {
            let (echoed, value): (u8, Vec<u8>) = decode(check_status(&response.await?)?)?;
            if echoed != id.as_raw() {
                return Err(DecodeError::InvalidValue {
                    ty: "ConfigId",
                    value: u64::from(echoed),
                }
                .into());
            }
            Ok(value)
        }
    }

    /// Read a configuration item as its bound value type.
    pub fn sapi_read_configuration<O: ConfigurationOption>(
        &self,
    ) -> impl Future<Output = Result<O::Value>> + Send + 'static {
        let raw = self.sapi_read_configuration_raw(O::ID);
        async move { Ok(decode::<O::Value>(&raw.await?)?) }
    }

    pub fn sapi_write_configuration_raw(
        &self,
        id: ConfigId,
        value: Vec<u8>,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        self.request_status(sapi::WRITE_CONFIGURATION, encode(&(id, value)))
    }

    /// Write a configuration item from its bound value type.
    pub fn sapi_write_configuration<O: ConfigurationOption>(
        &self,
        value: &O::Value,
    ) -> impl Future<Output = Result<()>> + Send + 'static {
        self.sapi_write_configuration_raw(O::ID, encode(value).to_vec())
    }

    /// Read a device-info parameter as the raw eight-byte buffer.
    pub fn sapi_get_device_info_raw(
        &self,
        id: DeviceInfoId,
    ) -> impl Future<Output = Result<[u8; 8]>> + Send + 'static {
        let response = self.send_and_wait(sapi::GET_DEVICE_INFO, encode(&id));
        async move {
            let (_param, value): (u8, [u8; 8]) = decode(&response.await?)?;
            Ok(value)
        }
    }

    /// Read a device-info parameter as its bound value type.
    pub fn sapi_get_device_info<I: DeviceInfo>(
        &self,
    ) -> impl Future<Output = Result<I::Value>> + Send + 'static {
        let raw = self.sapi_get_device_info_raw(I::ID);
        async move { Ok(decode_partial::<I::Value>(&raw.await?)?) }
    }
}
