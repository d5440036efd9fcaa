use serde::Serialize;
use znp_api::{info, with_timeout, ZnpApi, ZnpError};

use crate::cmd::{runtime, InfoArgs, Session};
use crate::exit::{znp_error, CliResult, SUCCESS};
use crate::output::{emit, OutputFormat, Report};

#[derive(Serialize)]
struct InfoOutput {
    state: String,
    ieee_address: String,
    short_address: String,
    parent_short_address: String,
    parent_ieee_address: String,
    channel: u8,
    pan_id: String,
    extended_pan_id: String,
}

impl Report for InfoOutput {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("state", self.state.clone()),
            ("ieee address", self.ieee_address.clone()),
            ("short address", self.short_address.clone()),
            ("parent short", self.parent_short_address.clone()),
            ("parent ieee", self.parent_ieee_address.clone()),
            ("channel", self.channel.to_string()),
            ("pan id", self.pan_id.clone()),
            ("extended pan id", self.extended_pan_id.clone()),
        ]
    }
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let session = Session::open(&args.device)?;
    let rt = runtime()?;

    let out = rt
        .block_on(with_timeout(session.timeout, query(&session.api)))
        .map_err(|err| znp_error("device info failed", err))?;

    emit(&out, format);
    Ok(SUCCESS)
}

async fn query(api: &ZnpApi) -> Result<InfoOutput, ZnpError> {
    // One request in flight at a time, as the device expects.
    let state = api.sapi_get_device_info::<info::State>().await?;
    let ieee = api.sapi_get_device_info::<info::IeeeAddr>().await?;
    let short = api.sapi_get_device_info::<info::ShortAddr>().await?;
    let parent_short = api.sapi_get_device_info::<info::ParentShortAddr>().await?;
    let parent_ieee = api.sapi_get_device_info::<info::ParentIeeeAddr>().await?;
    let channel = api.sapi_get_device_info::<info::Channel>().await?;
    let pan_id = api.sapi_get_device_info::<info::PanId>().await?;
    let ext_pan_id = api.sapi_get_device_info::<info::ExtPanId>().await?;

    Ok(InfoOutput {
        state: format!("{state:?}"),
        ieee_address: ieee.to_string(),
        short_address: format!("{short:#06x}"),
        parent_short_address: format!("{parent_short:#06x}"),
        parent_ieee_address: parent_ieee.to_string(),
        channel,
        pan_id: format!("{pan_id:#06x}"),
        extended_pan_id: format!("{ext_pan_id:#018x}"),
    })
}
