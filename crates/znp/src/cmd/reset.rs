use serde::Serialize;
use znp_api::{with_timeout, ResetInfo};

use crate::cmd::{runtime, ResetArgs, Session};
use crate::exit::{znp_error, CliResult, SUCCESS};
use crate::output::{emit, OutputFormat, Report};

#[derive(Serialize)]
struct ResetOutput {
    reason: String,
    transport_rev: u8,
    product_id: u8,
    version: String,
    hw_rev: u8,
}

impl From<ResetInfo> for ResetOutput {
    fn from(info: ResetInfo) -> Self {
        Self {
            reason: format!("{:?}", info.reason),
            transport_rev: info.transport_rev,
            product_id: info.product_id,
            version: format!("{}.{}", info.major_rel, info.minor_rel),
            hw_rev: info.hw_rev,
        }
    }
}

impl Report for ResetOutput {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("reason", self.reason.clone()),
            ("transport rev", self.transport_rev.to_string()),
            ("product id", self.product_id.to_string()),
            ("firmware", self.version.clone()),
            ("hardware rev", self.hw_rev.to_string()),
        ]
    }
}

pub fn run(args: ResetArgs, format: OutputFormat) -> CliResult<i32> {
    let session = Session::open(&args.device)?;
    let rt = runtime()?;

    tracing::info!(hard = args.hard, "resetting device");
    let info = rt
        .block_on(with_timeout(session.timeout, session.api.sys_reset(!args.hard)))
        .map_err(|err| znp_error("reset failed", err))?;

    emit(&ResetOutput::from(info), format);
    Ok(SUCCESS)
}
