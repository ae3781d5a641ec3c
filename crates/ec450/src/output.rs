use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use ec450_meter::{MeasurementState, MeterStats, Publication, CHANNELS};
use serde::Serialize;

use crate::config::MeterConfig;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PublicationOutput<'a> {
    channel: String,
    value: f32,
    unit: &'a str,
}

/// Print the values published during one tick.
pub fn print_publications(batch: &[Publication], format: OutputFormat) {
    if batch.is_empty() {
        return;
    }
    match format {
        OutputFormat::Json => {
            for p in batch {
                let out = PublicationOutput {
                    channel: p.channel.to_string(),
                    value: p.value,
                    unit: p.channel.unit(),
                };
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "VALUE", "UNIT"]);
            for p in batch {
                table.add_row(vec![
                    p.channel.to_string(),
                    format_value(p),
                    p.channel.unit().to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for p in batch {
                println!("{}={} {}", p.channel, format_value(p), p.channel.unit());
            }
        }
        OutputFormat::Raw => {
            let mut out = std::io::stdout().lock();
            for p in batch {
                let _ = writeln!(out, "{} {}", p.channel, p.value);
            }
            let _ = out.flush();
        }
    }
}

fn format_value(p: &Publication) -> String {
    match p.channel.unit() {
        "Wh" => format!("{:.4}", p.value),
        "W" => format!("{:.0}", p.value),
        _ => format!("{:.2}", p.value),
    }
}

/// End-of-input report for `decode` and `listen`.
#[derive(Serialize)]
pub struct DecodeReport<'a> {
    pub schema_id: &'static str,
    pub source: String,
    pub state: &'a MeasurementState,
    pub stats: MeterStats,
    /// Bytes left over at end of input (an incomplete frame).
    pub trailing_bytes: usize,
    pub rx_overflowed: u64,
}

pub fn print_report(report: &DecodeReport<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let state = report.state;
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SLOT", "CURRENT (A)", "POWER (W)", "ENERGY (Wh)"]);
            for slot in 0..CHANNELS {
                table.add_row(vec![
                    slot_name(slot),
                    format!("{:.2}", state.current()[slot]),
                    state.power()[slot].to_string(),
                    format!("{:.4}", state.energy_wh(slot).unwrap_or_default()),
                ]);
            }
            println!("voltage: {:.2} V", state.voltage());
            println!("{table}");
            print_stats_lines(report);
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            let state = report.state;
            println!("source: {}", report.source);
            println!("voltage: {:.2} V", state.voltage());
            for slot in 0..CHANNELS {
                println!(
                    "{}: {:.2} A, {} W, {:.4} Wh",
                    slot_name(slot),
                    state.current()[slot],
                    state.power()[slot],
                    state.energy_wh(slot).unwrap_or_default()
                );
            }
            print_stats_lines(report);
        }
    }
}

fn print_stats_lines(report: &DecodeReport<'_>) {
    let s = report.stats;
    println!(
        "frames={} records={} unknown_type={} truncated={} bad_eof={} bad_checksum={} filler={} dropped={} trailing={} overflowed={}",
        s.reader.frames,
        s.records,
        s.unknown_type,
        s.truncated,
        s.reader.bad_eof,
        s.reader.bad_checksum,
        s.reader.filler_bytes,
        s.reader.dropped_bytes,
        report.trailing_bytes,
        report.rx_overflowed,
    );
}

fn slot_name(slot: usize) -> String {
    match slot {
        0 => "aggregate".to_string(),
        n => format!("channel_{}", n - 1),
    }
}

#[derive(Serialize)]
struct ConfigOutput<'a> {
    schema_id: &'static str,
    config: &'a MeterConfig,
    line_ok: bool,
    line_mismatches: &'a [String],
}

pub fn print_config(config: &MeterConfig, mismatches: &[String], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ConfigOutput {
                schema_id: "ec450/cli/v1/config.json",
                config,
                line_ok: mismatches.is_empty(),
                line_mismatches: mismatches,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty | OutputFormat::Raw => {
            println!("EC450");
            println!("  line: {}", config.line);
            println!("  max_msg_length: {:#04x}", config.max_msg_length);
            println!("  stale_after: {} ms", config.stale_after_ms);
            println!("  rx_buffer_size: {}", config.rx_buffer_size);
            println!("  chunk_size: {}", config.chunk_size);
            let channels = config
                .sensors
                .channels()
                .map(|c| c.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))
                .unwrap_or_else(|err| format!("<{err}>"));
            println!("  sensors: {channels}");
            for m in mismatches {
                println!("  WARNING line {m}");
            }
        }
    }
}
