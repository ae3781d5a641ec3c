use crate::cmd::ConfigArgs;
use crate::config::MeterConfig;
use crate::exit::{CliResult, FAILURE, SUCCESS};
use crate::output::{print_config, OutputFormat};

pub fn run(_args: ConfigArgs, config: MeterConfig, format: OutputFormat) -> CliResult<i32> {
    let mismatches = config.line.mismatches();
    print_config(&config, &mismatches, format);

    if mismatches.is_empty() {
        Ok(SUCCESS)
    } else {
        Ok(FAILURE)
    }
}
