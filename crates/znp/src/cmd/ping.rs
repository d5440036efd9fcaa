use std::time::Instant;

use serde::Serialize;
use znp_api::with_timeout;

use crate::cmd::{runtime, PingArgs, Session};
use crate::exit::{znp_error, CliResult, SUCCESS};
use crate::output::{emit, OutputFormat, Report};

#[derive(Serialize)]
struct PingOutput {
    device: String,
    capabilities: Vec<&'static str>,
    capability_mask: u16,
    latency_ms: f64,
}

impl Report for PingOutput {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("device", self.device.clone()),
            ("capabilities", self.capabilities.join(", ")),
            ("mask", format!("{:#06x}", self.capability_mask)),
            ("latency", format!("{:.2}ms", self.latency_ms)),
        ]
    }
}

pub fn run(args: PingArgs, format: OutputFormat) -> CliResult<i32> {
    let session = Session::open(&args.device)?;
    let rt = runtime()?;

    let start = Instant::now();
    let caps = rt
        .block_on(with_timeout(session.timeout, session.api.sys_ping()))
        .map_err(|err| znp_error("ping failed", err))?;
    let latency_ms = (start.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0;

    emit(
        &PingOutput {
            device: args.device.device.display().to_string(),
            capabilities: caps.names(),
            capability_mask: caps.0,
            latency_ms,
        },
        format,
    );
    Ok(SUCCESS)
}
