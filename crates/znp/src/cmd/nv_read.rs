use serde::Serialize;
use znp_api::{with_timeout, NvItemId};

use crate::cmd::{runtime, NvReadArgs, Session};
use crate::exit::{znp_error, CliResult, SUCCESS};
use crate::output::{emit, hex, OutputFormat, Report};

#[derive(Serialize)]
struct NvReadOutput {
    id: u16,
    offset: u8,
    length: usize,
    value: String,
}

impl Report for NvReadOutput {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", format!("{:#06x}", self.id)),
            ("offset", self.offset.to_string()),
            ("length", self.length.to_string()),
            ("value", self.value.clone()),
        ]
    }
}

pub fn run(args: NvReadArgs, format: OutputFormat) -> CliResult<i32> {
    let session = Session::open(&args.device)?;
    let rt = runtime()?;

    let read = session.api.sys_osal_nv_read_raw(NvItemId(args.id), args.offset);
    let value = rt
        .block_on(with_timeout(session.timeout, read))
        .map_err(|err| znp_error("nv read failed", err))?;

    emit(
        &NvReadOutput {
            id: args.id,
            offset: args.offset,
            length: value.len(),
            value: hex(&value),
        },
        format,
    );
    Ok(SUCCESS)
}
