use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("znp {}", env!("CARGO_PKG_VERSION"));
    if !args.extended {
        return Ok(SUCCESS);
    }

    println!("target: {}", option_env!("ZNP_BUILD_TARGET").unwrap_or("unknown"));
    println!("profile: {}", option_env!("ZNP_BUILD_PROFILE").unwrap_or("unknown"));
    println!("os: {} ({})", std::env::consts::OS, std::env::consts::ARCH);
    println!(
        "features: async={}, cli=true",
        cfg!(feature = "async")
    );
    println!("max payload: {} bytes", znp_frame::MAX_PAYLOAD);

    Ok(SUCCESS)
}
