use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("ec450 {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: ec450");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("EC450_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("features: serde={}, cli=true", cfg!(feature = "serde"));
    println!("device_line: {}", ec450_transport::LineConfig::EC450);
    println!(
        "max_msg_length: {:#04x}",
        ec450_frame::MAX_MSG_LENGTH
    );

    Ok(SUCCESS)
}
