//! Replay a capture through the decoder and print what each sensor receives.
//!
//! Run with:
//!   cargo run --example replay -p ec450 [capture.bin]
//!
//! Without a path, a short synthetic capture is built in memory.

use std::io::Cursor;

use bytes::BytesMut;
use ec450::frame::BUSY_BYTE;
use ec450::meter::{encode_record, MeasurementRecord, Meter, SUB_CHANNELS};
use ec450::transport::{RxBuffer, StreamSource};

fn synthetic_capture() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let records = [
        MeasurementRecord::Voltage(23_050),
        MeasurementRecord::Current([1500, 100, 200, 300, 400, 500]),
        MeasurementRecord::Power([3450, 230, 460, 690, 920, 1150]),
        MeasurementRecord::EnergyDelta([9580, 640, 1280, 1920, 2560, 3200]),
    ];
    let mut buf = BytesMut::new();
    for record in &records {
        buf.extend_from_slice(&[BUSY_BYTE; 3]);
        encode_record(record, &mut buf)?;
    }
    Ok(buf.to_vec())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let capture = match std::env::args_os().nth(1) {
        Some(path) => std::fs::read(path)?,
        None => synthetic_capture()?,
    };

    // Small chunks so frames arrive split across ticks, as they would off a UART.
    let source = StreamSource::with_buffer(Cursor::new(capture), RxBuffer::new(), 5);
    let mut meter = Meter::new(source);

    meter
        .sinks_mut()
        .set_voltage_sensor(|v: f32| println!("voltage: {v:.2} V"));
    for index in 0..SUB_CHANNELS {
        meter
            .sinks_mut()
            .set_power_sensor(index, move |w: f32| println!("power[{index}]: {w:.0} W"))?;
        meter
            .sinks_mut()
            .set_energy_sensor(index, move |wh: f32| println!("energy[{index}]: {wh:.4} Wh"))?;
    }

    loop {
        let read = meter.source_mut().fill()?;
        meter.tick()?;
        if read == 0 && meter.source().is_eof() {
            break;
        }
    }

    let stats = meter.stats();
    eprintln!(
        "{} frames, {} records, {} filler bytes, {} dropped",
        stats.reader.frames, stats.records, stats.reader.filler_bytes, stats.reader.dropped_bytes
    );
    // Slot 1 feeds sub-channel 0.
    if let Some(wh) = meter.state().energy_wh(1) {
        eprintln!("channel_0 total: {wh:.4} Wh");
    }
    Ok(())
}
