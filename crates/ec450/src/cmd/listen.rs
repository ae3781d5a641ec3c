use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ec450_transport::ByteSource;
use tracing::{info, warn};

use crate::cmd::pipeline::{drain, open_meter};
use crate::cmd::ListenArgs;
use crate::config::MeterConfig;
use crate::exit::{meter_error, transport_error, CliError, CliResult, INTERRUPTED, SUCCESS};
use crate::output::{print_publications, print_report, DecodeReport, OutputFormat};

pub fn run(args: ListenArgs, config: MeterConfig, format: OutputFormat) -> CliResult<i32> {
    if !config.line.check() {
        warn!(line = %config.line, "line mismatch, frames will likely fail validation");
    }

    let (mut meter, published) = open_meter(&args.path, &config, config.chunk_size)?;
    info!(path = %args.path.display(), "listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    while running.load(Ordering::SeqCst) {
        let read = meter
            .source_mut()
            .fill()
            .map_err(|err| transport_error("read failed", err))?;
        meter.tick().map_err(|err| meter_error("decode failed", err))?;
        print_publications(&drain(&published), format);

        if let Some(count) = args.count {
            if meter.stats().records >= count {
                break;
            }
        }
        if read == 0 {
            if meter.source().is_eof() {
                info!("input closed");
                break;
            }
            std::thread::sleep(config.poll_interval());
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

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        // A blocked read only notices the flag once a byte arrives.
        if !running.swap(false, Ordering::SeqCst) {
            std::process::exit(INTERRUPTED);
        }
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
