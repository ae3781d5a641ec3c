use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use bytes::BytesMut;
use ec450_frame::FrameWriter;
use ec450_meter::{encode_record, MeasurementRecord, CHANNELS};
use tracing::info;

use crate::cmd::SimulateArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};

pub fn run(args: SimulateArgs) -> CliResult<i32> {
    if args.corrupt_every == Some(0) {
        return Err(CliError::new(USAGE, "--corrupt-every must be positive"));
    }

    let out: Box<dyn Write> = if args.output == Path::new("-") {
        Box::new(io::stdout().lock())
    } else {
        let file = File::create(&args.output).map_err(|err| {
            io_error(&format!("failed creating {}", args.output.display()), err)
        })?;
        Box::new(file)
    };
    let mut writer = FrameWriter::new(BufWriter::new(out));

    let mut buf = BytesMut::new();
    let mut written = 0u32;
    let mut corrupted = 0u32;
    for cycle in 0..args.cycles {
        for record in cycle_records(cycle) {
            buf.clear();
            encode_record(&record, &mut buf).map_err(|err| frame_error("encode failed", err))?;

            written += 1;
            if args.corrupt_every.is_some_and(|n| written % n == 0) {
                let checksum_at = buf.len() - 2;
                buf[checksum_at] = buf[checksum_at].wrapping_add(1);
                corrupted += 1;
            }

            writer
                .write_raw(&buf)
                .map_err(|err| frame_error("write failed", err))?;
            writer
                .send_filler(args.filler)
                .map_err(|err| frame_error("write failed", err))?;
        }
    }
    writer.flush().map_err(|err| frame_error("flush failed", err))?;

    info!(frames = written, corrupted, "capture written");
    Ok(SUCCESS)
}

/// One measurement cycle: voltage, current, power, then an energy delta.
///
/// Values drift with `cycle` so successive cycles are distinguishable.
fn cycle_records(cycle: u32) -> [MeasurementRecord; 4] {
    let step = cycle % 50;
    let mut current = [0u16; CHANNELS];
    let mut power = [0u32; CHANNELS];
    let mut energy = [0u32; CHANNELS];
    for sub in 1..CHANNELS {
        let amps_centi = 50 * sub as u16 + step as u16;
        current[sub] = amps_centi;
        power[sub] = 230 * u32::from(amps_centi) / 100;
        energy[sub] = power[sub] * 10_000 / 3600;
    }
    current[0] = current[1..].iter().sum();
    power[0] = power[1..].iter().sum();
    energy[0] = energy[1..].iter().sum();

    [
        MeasurementRecord::Voltage(23_000 + step as u16),
        MeasurementRecord::Current(current),
        MeasurementRecord::Power(power),
        MeasurementRecord::EnergyDelta(energy),
    ]
}
