use tracing::info;

use crate::decoder::{MeasurementRecord, CHANNELS};
use crate::sink::{Publication, SensorChannel, SubChannel};

/// Energy counter units per watt-hour (the device counts in 100 µWh).
const ENERGY_UNITS_PER_WH: f64 = 10_000.0;

/// Latest readings and lifetime energy totals.
///
/// Voltage, current and power are overwritten by each record of their kind.
/// Energy totals only ever grow: each delta is added to its channel.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeasurementState {
    voltage: f32,
    current: [f32; CHANNELS],
    power: [u32; CHANNELS],
    energy_total: [u64; CHANNELS],
}

impl MeasurementState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Volts.
    pub fn voltage(&self) -> f32 {
        self.voltage
    }

    /// Amps per slot; slot 0 is the aggregate.
    pub fn current(&self) -> &[f32; CHANNELS] {
        &self.current
    }

    /// Watts per slot; slot 0 is the aggregate.
    pub fn power(&self) -> &[u32; CHANNELS] {
        &self.power
    }

    /// Accumulated energy per slot in 100 µWh.
    pub fn energy_total(&self) -> &[u64; CHANNELS] {
        &self.energy_total
    }

    /// Accumulated energy of `slot` in watt-hours.
    pub fn energy_wh(&self, slot: usize) -> Option<f64> {
        self.energy_total
            .get(slot)
            .map(|total| *total as f64 / ENERGY_UNITS_PER_WH)
    }

    /// Fold a record into the state and return the values to publish.
    ///
    /// Slot 0 is never published; slots 1..=5 map to sub-channels 0..=4.
    pub fn apply(&mut self, record: &MeasurementRecord) -> Vec<Publication> {
        match record {
            MeasurementRecord::Voltage(raw) => {
                self.voltage = centi(*raw);
                info!(volts = format_args!("{:.2}", self.voltage), "voltage");
                vec![Publication {
                    channel: SensorChannel::Voltage,
                    value: self.voltage,
                }]
            }
            MeasurementRecord::Current(raw) => {
                for (slot, value) in self.current.iter_mut().zip(raw) {
                    *slot = centi(*value);
                }
                info!(amps = ?self.current, "current");
                per_sub_channel(SensorChannel::Current, |slot| self.current[slot])
            }
            MeasurementRecord::Power(raw) => {
                self.power = *raw;
                info!(watts = ?self.power, "power");
                per_sub_channel(SensorChannel::Power, |slot| self.power[slot] as f32)
            }
            MeasurementRecord::EnergyDelta(deltas) => {
                for (total, delta) in self.energy_total.iter_mut().zip(deltas) {
                    *total += u64::from(*delta);
                }
                let delta_wh = deltas.map(|d| f64::from(d) / ENERGY_UNITS_PER_WH);
                let total_wh = self.energy_total.map(|t| t as f64 / ENERGY_UNITS_PER_WH);
                info!(delta_wh = ?delta_wh, total_wh = ?total_wh, "energy");
                per_sub_channel(SensorChannel::Energy, |slot| {
                    (self.energy_total[slot] as f64 / ENERGY_UNITS_PER_WH) as f32
                })
            }
        }
    }
}

fn centi(raw: u16) -> f32 {
    f32::from(raw) / 100.0
}

fn per_sub_channel(
    kind: fn(SubChannel) -> SensorChannel,
    value_of: impl Fn(usize) -> f32,
) -> Vec<Publication> {
    (1..CHANNELS)
        .filter_map(|slot| {
            SubChannel::from_slot(slot).map(|sub| Publication {
                channel: kind(sub),
                value: value_of(slot),
            })
        })
        .collect()
}
