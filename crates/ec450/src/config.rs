use std::fs;
use std::path::Path;
use std::time::Duration;

use ec450_frame::{FrameConfig, DEFAULT_STALE_AFTER, MAX_FRAME_SIZE, MAX_MSG_LENGTH};
use ec450_meter::{BindError, SensorChannel, SubChannel, SUB_CHANNELS};
use ec450_transport::{LineConfig, DEFAULT_RX_BUFFER_SIZE};
use serde::{Deserialize, Serialize};

use crate::exit::{bind_error, io_error, CliError, CliResult, CONFIG_INVALID};

/// Which sensor channels get a sink. Unlisted channels are decoded but not published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    pub voltage: bool,
    pub current: Vec<usize>,
    pub power: Vec<usize>,
    pub energy: Vec<usize>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        let all: Vec<usize> = (0..SUB_CHANNELS).collect();
        Self {
            voltage: true,
            current: all.clone(),
            power: all.clone(),
            energy: all,
        }
    }
}

impl SensorConfig {
    pub fn channels(&self) -> Result<Vec<SensorChannel>, BindError> {
        let mut out = Vec::new();
        if self.voltage {
            out.push(SensorChannel::Voltage);
        }
        for i in &self.current {
            out.push(SensorChannel::Current(SubChannel::new(*i)?));
        }
        for i in &self.power {
            out.push(SensorChannel::Power(SubChannel::new(*i)?));
        }
        for i in &self.energy {
            out.push(SensorChannel::Energy(SubChannel::new(*i)?));
        }
        Ok(out)
    }
}

/// CLI configuration, loaded from a JSON file. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeterConfig {
    /// Serial settings the host configured; checked against the device's 19200 8N1.
    pub line: LineConfig,
    /// Length bytes at or above this are dropped as noise.
    pub max_msg_length: u8,
    /// Idle gap flagged as stale, in milliseconds.
    pub stale_after_ms: u64,
    /// Receive buffer size in bytes. Must hold at least one maximum-size frame.
    pub rx_buffer_size: usize,
    /// Bytes pulled from the input per tick.
    pub chunk_size: usize,
    /// Sleep between ticks when the input had nothing to offer.
    pub poll_interval_ms: u64,
    pub sensors: SensorConfig,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            line: LineConfig::default(),
            max_msg_length: MAX_MSG_LENGTH,
            stale_after_ms: DEFAULT_STALE_AFTER.as_millis() as u64,
            rx_buffer_size: DEFAULT_RX_BUFFER_SIZE,
            chunk_size: 64,
            poll_interval_ms: 16,
            sensors: SensorConfig::default(),
        }
    }
}

impl MeterConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let config = match path {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|err| {
                    io_error(&format!("failed reading config {}", path.display()), err)
                })?;
                Self::from_json(&text)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> CliResult<Self> {
        serde_json::from_str(text)
            .map_err(|err| CliError::new(CONFIG_INVALID, format!("invalid config: {err}")))
    }

    pub fn validate(&self) -> CliResult<()> {
        if self.max_msg_length == 0 || self.max_msg_length > MAX_MSG_LENGTH {
            return Err(CliError::new(
                CONFIG_INVALID,
                format!(
                    "max_msg_length must be between 1 and {MAX_MSG_LENGTH:#04x}, got {:#04x}",
                    self.max_msg_length
                ),
            ));
        }
        if self.rx_buffer_size < MAX_FRAME_SIZE {
            return Err(CliError::new(
                CONFIG_INVALID,
                format!(
                    "rx_buffer_size must be at least {MAX_FRAME_SIZE}, got {}",
                    self.rx_buffer_size
                ),
            ));
        }
        if self.chunk_size == 0 {
            return Err(CliError::new(CONFIG_INVALID, "chunk_size must be positive"));
        }
        self.sensors
            .channels()
            .map_err(|err| bind_error("invalid sensors", err))?;
        Ok(())
    }

    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_msg_length: self.max_msg_length,
            stale_after: Duration::from_millis(self.stale_after_ms),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use ec450_transport::Parity;

    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let cfg = MeterConfig::from_json("{}").unwrap();
        assert_eq!(cfg, MeterConfig::default());
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.sensors.channels().unwrap().len(), 16);
        assert_eq!(cfg.frame_config(), FrameConfig::default());
    }

    #[test]
    fn partial_config_overrides_fields() {
        let cfg = MeterConfig::from_json(
            r#"{
                "line": { "baud_rate": 9600, "parity": "even" },
                "chunk_size": 8,
                "sensors": { "voltage": false, "energy": [0, 2] }
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.line.baud_rate, 9600);
        assert_eq!(cfg.line.parity, Parity::Even);
        assert_eq!(cfg.line.stop_bits, 1);
        assert_eq!(cfg.chunk_size, 8);

        let names: Vec<String> = cfg
            .sensors
            .channels()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names.len(), 12);
        assert!(!names.contains(&"voltage".to_string()));
        assert!(names.contains(&"energy_2".to_string()));
        assert!(!names.contains(&"energy_1".to_string()));
    }

    #[test]
    fn unknown_field_rejected() {
        let err = MeterConfig::from_json(r#"{ "baud": 19200 }"#).unwrap_err();
        assert_eq!(err.code, CONFIG_INVALID);
    }

    #[test]
    fn out_of_range_channel_rejected() {
        let cfg = MeterConfig::from_json(r#"{ "sensors": { "power": [5] } }"#).unwrap();
        assert_eq!(cfg.validate().unwrap_err().code, CONFIG_INVALID);
    }

    #[test]
    fn small_rx_buffer_rejected() {
        let cfg = MeterConfig {
            rx_buffer_size: MAX_FRAME_SIZE - 1,
            ..MeterConfig::default()
        };
        assert_eq!(cfg.validate().unwrap_err().code, CONFIG_INVALID);
    }

    #[test]
    fn max_length_bounds() {
        let cfg = MeterConfig {
            max_msg_length: MAX_MSG_LENGTH + 1,
            ..MeterConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
