use ec450_transport::ByteSource;

use crate::cmd::pipeline::{drain, open_meter};
use crate::cmd::DecodeArgs;
use crate::config::MeterConfig;
use crate::exit::{meter_error, transport_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_publications, print_report, DecodeReport, OutputFormat};

pub fn run(args: DecodeArgs, config: MeterConfig, format: OutputFormat) -> CliResult<i32> {
    let chunk_size = args.chunk_size.unwrap_or(config.chunk_size);
    if chunk_size == 0 {
        return Err(CliError::new(USAGE, "--chunk-size must be positive"));
    }

    let (mut meter, published) = open_meter(&args.path, &config, chunk_size)?;

    loop {
        let read = meter
            .source_mut()
            .fill()
            .map_err(|err| transport_error("read failed", err))?;
        meter.tick().map_err(|err| meter_error("decode failed", err))?;

        let batch = drain(&published);
        if !args.summary_only {
            print_publications(&batch, format);
        }

        if read == 0 && meter.source().is_eof() {
            break;
        }
    }

    let report = DecodeReport {
        schema_id: "ec450/cli/v1/decode-report.json",
        source: args.path.display().to_string(),
        state: meter.state(),
        stats: meter.stats(),
        trailing_bytes: meter.source().available(),
        rx_overflowed: meter.source().rx().overflowed(),
    };
    print_report(&report, format);

    Ok(SUCCESS)
}
