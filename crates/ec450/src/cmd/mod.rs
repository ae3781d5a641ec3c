use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::config::MeterConfig;
use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod config;
pub mod decode;
pub mod listen;
pub mod simulate;
pub mod version;

mod pipeline;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a capture file and print published values and final totals.
    Decode(DecodeArgs),
    /// Decode a live serial device or FIFO until end of input or Ctrl-C.
    ///
    /// Reads block while the device is quiet, so the first Ctrl-C takes effect
    /// once the next byte arrives. A second Ctrl-C exits immediately.
    Listen(ListenArgs),
    /// Write a synthetic EC450 capture.
    Simulate(SimulateArgs),
    /// Print the effective configuration and check line settings.
    Config(ConfigArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, config: MeterConfig, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, config, format),
        Command::Listen(args) => listen::run(args, config, format),
        Command::Simulate(args) => simulate::run(args),
        Command::Config(args) => config::run(args, config, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file holding raw bytes as received from the device.
    pub path: PathBuf,
    /// Bytes fed to the decoder per tick (overrides config).
    #[arg(long)]
    pub chunk_size: Option<usize>,
    /// Print only the final report, not every published value.
    #[arg(long)]
    pub summary_only: bool,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Serial device node (already configured for 19200 8N1) or FIFO.
    /// Reads block until data arrives.
    pub path: PathBuf,
    /// Exit after N decoded records.
    #[arg(long)]
    pub count: Option<u64>,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Output file; `-` writes to stdout.
    pub output: PathBuf,
    /// Number of measurement cycles (voltage, current, power, energy delta).
    #[arg(long, default_value = "10")]
    pub cycles: u32,
    /// Filler bytes written between frames.
    #[arg(long, default_value = "2")]
    pub filler: usize,
    /// Corrupt the checksum of every Nth frame.
    #[arg(long, value_name = "N")]
    pub corrupt_every: Option<u32>,
}

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
