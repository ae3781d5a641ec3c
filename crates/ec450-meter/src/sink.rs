//! Sensor sinks and channel addressing.
//!
//! Every published value goes to at most one sink. A channel with no sink bound
//! is skipped without error.

use std::fmt;

use crate::error::BindError;

/// Physical sub-channels exposed by the device (record slots 1 through 5).
pub const SUB_CHANNELS: usize = 5;

/// A physical sub-channel, `0..SUB_CHANNELS`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubChannel(u8);

impl SubChannel {
    pub fn new(index: usize) -> Result<Self, BindError> {
        if index >= SUB_CHANNELS {
            return Err(BindError::SubChannelOutOfRange {
                index,
                max: SUB_CHANNELS - 1,
            });
        }
        Ok(Self(index as u8))
    }

    /// Sub-channel fed by record slot `slot`. Slot 0 (the aggregate) has none.
    pub fn from_slot(slot: usize) -> Option<Self> {
        slot.checked_sub(1).and_then(|i| Self::new(i).ok())
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    pub fn all() -> impl Iterator<Item = SubChannel> {
        (0..SUB_CHANNELS as u8).map(SubChannel)
    }
}

/// A publishable measurement channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SensorChannel {
    Voltage,
    Current(SubChannel),
    Power(SubChannel),
    Energy(SubChannel),
}

impl SensorChannel {
    pub fn unit(self) -> &'static str {
        match self {
            Self::Voltage => "V",
            Self::Current(_) => "A",
            Self::Power(_) => "W",
            Self::Energy(_) => "Wh",
        }
    }
}

impl fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Voltage => f.write_str("voltage"),
            Self::Current(c) => write!(f, "current_{}", c.index()),
            Self::Power(c) => write!(f, "power_{}", c.index()),
            Self::Energy(c) => write!(f, "energy_{}", c.index()),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for SensorChannel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A value ready to be handed to the sink bound on `channel`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Publication {
    pub channel: SensorChannel,
    pub value: f32,
}

/// Receiver of published values. Fire-and-forget.
pub trait Sensor {
    fn publish_state(&mut self, value: f32);
}

impl<F> Sensor for F
where
    F: FnMut(f32),
{
    fn publish_state(&mut self, value: f32) {
        self(value)
    }
}

pub type SinkHandle = Box<dyn Sensor>;

/// Optional sink per channel: one voltage sink plus current, power and energy
/// sinks for each sub-channel.
#[derive(Default)]
pub struct SinkBindings {
    voltage: Option<SinkHandle>,
    current: [Option<SinkHandle>; SUB_CHANNELS],
    power: [Option<SinkHandle>; SUB_CHANNELS],
    energy: [Option<SinkHandle>; SUB_CHANNELS],
}

impl SinkBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `sink` to `channel`, returning whatever was bound there before.
    pub fn bind(&mut self, channel: SensorChannel, sink: impl Sensor + 'static) -> Option<SinkHandle> {
        self.slot_mut(channel).replace(Box::new(sink))
    }

    pub fn unbind(&mut self, channel: SensorChannel) -> Option<SinkHandle> {
        self.slot_mut(channel).take()
    }

    pub fn set_voltage_sensor(&mut self, sink: impl Sensor + 'static) {
        self.bind(SensorChannel::Voltage, sink);
    }

    pub fn set_current_sensor(&mut self, index: usize, sink: impl Sensor + 'static) -> Result<(), BindError> {
        self.bind(SensorChannel::Current(SubChannel::new(index)?), sink);
        Ok(())
    }

    pub fn set_power_sensor(&mut self, index: usize, sink: impl Sensor + 'static) -> Result<(), BindError> {
        self.bind(SensorChannel::Power(SubChannel::new(index)?), sink);
        Ok(())
    }

    pub fn set_energy_sensor(&mut self, index: usize, sink: impl Sensor + 'static) -> Result<(), BindError> {
        self.bind(SensorChannel::Energy(SubChannel::new(index)?), sink);
        Ok(())
    }

    pub fn is_bound(&self, channel: SensorChannel) -> bool {
        self.slot(channel).is_some()
    }

    /// Every channel with a sink, voltage first, then current, power, energy.
    pub fn bound_channels(&self) -> Vec<SensorChannel> {
        let mut out = Vec::new();
        if self.voltage.is_some() {
            out.push(SensorChannel::Voltage);
        }
        let kinds: [fn(SubChannel) -> SensorChannel; 3] = [
            SensorChannel::Current,
            SensorChannel::Power,
            SensorChannel::Energy,
        ];
        for kind in kinds {
            out.extend(SubChannel::all().map(kind).filter(|c| self.is_bound(*c)));
        }
        out
    }

    /// Hand the value to its sink. Returns false when the channel is unbound.
    pub fn publish(&mut self, publication: Publication) -> bool {
        match self.slot_mut(publication.channel) {
            Some(sink) => {
                sink.publish_state(publication.value);
                true
            }
            None => false,
        }
    }

    fn slot(&self, channel: SensorChannel) -> &Option<SinkHandle> {
        match channel {
            SensorChannel::Voltage => &self.voltage,
            SensorChannel::Current(c) => &self.current[c.index()],
            SensorChannel::Power(c) => &self.power[c.index()],
            SensorChannel::Energy(c) => &self.energy[c.index()],
        }
    }

    fn slot_mut(&mut self, channel: SensorChannel) -> &mut Option<SinkHandle> {
        match channel {
            SensorChannel::Voltage => &mut self.voltage,
            SensorChannel::Current(c) => &mut self.current[c.index()],
            SensorChannel::Power(c) => &mut self.power[c.index()],
            SensorChannel::Energy(c) => &mut self.energy[c.index()],
        }
    }
}

impl fmt::Debug for SinkBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound: Vec<String> = self.bound_channels().iter().map(ToString::to_string).collect();
        f.debug_struct("SinkBindings").field("bound", &bound).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<f32>>>, impl FnMut(f32)) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = {
            let seen = Rc::clone(&seen);
            move |v: f32| seen.borrow_mut().push(v)
        };
        (seen, sink)
    }

    #[test]
    fn sub_channel_range() {
        assert!(SubChannel::new(4).is_ok());
        assert_eq!(
            SubChannel::new(5).unwrap_err(),
            BindError::SubChannelOutOfRange { index: 5, max: 4 }
        );
        assert_eq!(SubChannel::from_slot(0), None);
        assert_eq!(SubChannel::from_slot(1).map(SubChannel::index), Some(0));
        assert_eq!(SubChannel::from_slot(5).map(SubChannel::index), Some(4));
        assert_eq!(SubChannel::from_slot(6), None);
    }

    #[test]
    fn publish_reaches_bound_sink_only() {
        let (seen, sink) = recorder();
        let mut sinks = SinkBindings::new();
        sinks.set_current_sensor(2, sink).unwrap();

        let bound = SensorChannel::Current(SubChannel::new(2).unwrap());
        let unbound = SensorChannel::Current(SubChannel::new(3).unwrap());

        assert!(sinks.publish(Publication { channel: bound, value: 1.5 }));
        assert!(!sinks.publish(Publication { channel: unbound, value: 9.0 }));
        assert_eq!(*seen.borrow(), vec![1.5]);
    }

    #[test]
    fn out_of_range_setter_is_rejected() {
        let mut sinks = SinkBindings::new();
        assert!(sinks.set_energy_sensor(5, |_v: f32| {}).is_err());
        assert!(sinks.bound_channels().is_empty());
    }

    #[test]
    fn rebind_returns_previous() {
        let mut sinks = SinkBindings::new();
        assert!(sinks.bind(SensorChannel::Voltage, |_v: f32| {}).is_none());
        assert!(sinks.bind(SensorChannel::Voltage, |_v: f32| {}).is_some());
        assert!(sinks.unbind(SensorChannel::Voltage).is_some());
        assert!(!sinks.is_bound(SensorChannel::Voltage));
    }

    #[test]
    fn bound_channels_are_ordered() {
        let mut sinks = SinkBindings::new();
        sinks.set_energy_sensor(0, |_v: f32| {}).unwrap();
        sinks.set_power_sensor(4, |_v: f32| {}).unwrap();
        sinks.set_voltage_sensor(|_v: f32| {});

        let names: Vec<String> = sinks.bound_channels().iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["voltage", "power_4", "energy_0"]);
        assert_eq!(format!("{sinks:?}"), r#"SinkBindings { bound: ["voltage", "power_4", "energy_0"] }"#);
    }

    #[test]
    fn channel_units() {
        let c = SubChannel::new(0).unwrap();
        assert_eq!(SensorChannel::Voltage.unit(), "V");
        assert_eq!(SensorChannel::Current(c).unit(), "A");
        assert_eq!(SensorChannel::Power(c).unit(), "W");
        assert_eq!(SensorChannel::Energy(c).unit(), "Wh");
    }
}
