use std::fmt;

use bytes::{BufMut, BytesMut};
use ec450_frame::{encode_frame, Frame};

use crate::error::DecodeError;

/// Slots in multi-value messages. Slot 0 is the device aggregate.
pub const CHANNELS: usize = 6;

/// Frame offset of the first field.
const FIELDS_OFFSET: usize = 2;

/// Message type identifiers (frame offset 1).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    Voltage = 0x0D,
    Current = 0x0E,
    Power = 0x0F,
    EnergyDelta = 0x10,
}

impl MessageType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x0D => Some(Self::Voltage),
            0x0E => Some(Self::Current),
            0x0F => Some(Self::Power),
            0x10 => Some(Self::EnergyDelta),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Bytes taken by the fixed field layout.
    pub fn fields_len(self) -> usize {
        match self {
            Self::Voltage => 2,
            Self::Current => 2 * CHANNELS,
            Self::Power | Self::EnergyDelta => 4 * CHANNELS,
        }
    }

    /// Smallest declared length that holds the whole layout before the checksum.
    pub fn min_declared_len(self) -> usize {
        FIELDS_OFFSET + self.fields_len()
    }
}

impl TryFrom<u8> for MessageType {
    type Error = DecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Self::from_byte(byte).ok_or(DecodeError::UnknownType { type_byte: byte })
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Voltage => "voltage",
            Self::Current => "current",
            Self::Power => "power",
            Self::EnergyDelta => "energy-delta",
        };
        f.write_str(name)
    }
}

/// One decoded message, in raw device units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MeasurementRecord {
    /// Line voltage in centivolts.
    Voltage(u16),
    /// Per-channel current in centiamps.
    Current([u16; CHANNELS]),
    /// Per-channel active power in watts.
    Power([u32; CHANNELS]),
    /// Per-channel energy since the previous delta, in 100 µWh.
    EnergyDelta([u32; CHANNELS]),
}

impl MeasurementRecord {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Voltage(_) => MessageType::Voltage,
            Self::Current(_) => MessageType::Current,
            Self::Power(_) => MessageType::Power,
            Self::EnergyDelta(_) => MessageType::EnergyDelta,
        }
    }
}

/// Decode a validated frame.
///
/// Only the type byte and the fixed field layout are looked at; bytes past the
/// layout and before the checksum are ignored.
pub fn decode(frame: &Frame) -> Result<MeasurementRecord, DecodeError> {
    let msg_type = MessageType::try_from(frame.message_type())?;
    if frame.declared_len() < msg_type.min_declared_len() {
        return Err(DecodeError::Truncated {
            msg_type,
            needed: msg_type.min_declared_len(),
            declared: frame.declared_len(),
        });
    }

    let record = match msg_type {
        MessageType::Voltage => {
            MeasurementRecord::Voltage(field(frame, msg_type, 0, 2, Frame::u16_at)?)
        }
        MessageType::Current => {
            MeasurementRecord::Current(fields(frame, msg_type, 2, Frame::u16_at)?)
        }
        MessageType::Power => MeasurementRecord::Power(fields(frame, msg_type, 4, Frame::u32_at)?),
        MessageType::EnergyDelta => {
            MeasurementRecord::EnergyDelta(fields(frame, msg_type, 4, Frame::u32_at)?)
        }
    };
    Ok(record)
}

fn field<T>(
    frame: &Frame,
    msg_type: MessageType,
    index: usize,
    stride: usize,
    read: fn(&Frame, usize) -> Option<T>,
) -> Result<T, DecodeError> {
    read(frame, FIELDS_OFFSET + stride * index).ok_or(DecodeError::Truncated {
        msg_type,
        needed: msg_type.min_declared_len(),
        declared: frame.declared_len(),
    })
}

fn fields<T: Copy + Default>(
    frame: &Frame,
    msg_type: MessageType,
    stride: usize,
    read: fn(&Frame, usize) -> Option<T>,
) -> Result<[T; CHANNELS], DecodeError> {
    let mut out = [T::default(); CHANNELS];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = field(frame, msg_type, i, stride, read)?;
    }
    Ok(out)
}

/// Encode a record as a complete wire frame.
pub fn encode_record(record: &MeasurementRecord, dst: &mut BytesMut) -> ec450_frame::Result<()> {
    let msg_type = record.message_type();
    let mut payload = BytesMut::with_capacity(msg_type.fields_len());
    match record {
        MeasurementRecord::Voltage(raw) => payload.put_u16(*raw),
        MeasurementRecord::Current(values) => values.iter().for_each(|v| payload.put_u16(*v)),
        MeasurementRecord::Power(values) | MeasurementRecord::EnergyDelta(values) => {
            values.iter().for_each(|v| payload.put_u32(*v))
        }
    }
    encode_frame(msg_type.as_byte(), &payload, dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_of(msg_type: u8, payload: &[u8]) -> Frame {
        let mut buf = BytesMut::new();
        encode_frame(msg_type, payload, &mut buf).unwrap();
        Frame::validate(buf.freeze()).unwrap()
    }

    fn roundtrip(record: MeasurementRecord) -> MeasurementRecord {
        let mut buf = BytesMut::new();
        encode_record(&record, &mut buf).unwrap();
        decode(&Frame::validate(buf.freeze()).unwrap()).unwrap()
    }

    #[test]
    fn voltage_field_is_big_endian() {
        let frame = frame_of(0x0D, &[0x09, 0xC4]);
        assert_eq!(decode(&frame).unwrap(), MeasurementRecord::Voltage(2500));
    }

    #[test]
    fn current_uses_stride_two() {
        let payload = [0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x01, 0x00, 0xFF, 0xFF];
        let frame = frame_of(0x0E, &payload);
        assert_eq!(
            decode(&frame).unwrap(),
            MeasurementRecord::Current([1, 2, 3, 4, 256, 65535])
        );
    }

    #[test]
    fn power_uses_stride_four() {
        let mut payload = Vec::new();
        for v in [0x0102_0304u32, 0, 1, 100, 65_536, u32::MAX] {
            payload.extend_from_slice(&v.to_be_bytes());
        }
        let frame = frame_of(0x0F, &payload);
        assert_eq!(
            decode(&frame).unwrap(),
            MeasurementRecord::Power([0x0102_0304, 0, 1, 100, 65_536, u32::MAX])
        );
    }

    #[test]
    fn energy_delta_decodes() {
        let record = MeasurementRecord::EnergyDelta([0, 10_000, 0, 0, 0, 7]);
        assert_eq!(roundtrip(record.clone()), record);
    }

    #[test]
    fn unknown_type_is_reported() {
        let frame = frame_of(0x11, &[0x00, 0x01]);
        assert_eq!(
            decode(&frame).unwrap_err(),
            DecodeError::UnknownType { type_byte: 0x11 }
        );
    }

    #[test]
    fn short_payload_is_truncated_not_over_read() {
        let frame = frame_of(0x0F, &[0u8; 8]);
        assert_eq!(
            decode(&frame).unwrap_err(),
            DecodeError::Truncated {
                msg_type: MessageType::Power,
                needed: 26,
                declared: 10,
            }
        );

        let frame = frame_of(0x0D, &[]);
        assert!(matches!(
            decode(&frame),
            Err(DecodeError::Truncated {
                msg_type: MessageType::Voltage,
                ..
            })
        ));
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let frame = frame_of(0x0D, &[0x00, 0x64, 0xAA, 0xBB]);
        assert_eq!(decode(&frame).unwrap(), MeasurementRecord::Voltage(100));
    }

    #[test]
    fn message_type_bytes() {
        for t in [
            MessageType::Voltage,
            MessageType::Current,
            MessageType::Power,
            MessageType::EnergyDelta,
        ] {
            assert_eq!(MessageType::from_byte(t.as_byte()), Some(t));
        }
        assert_eq!(MessageType::Current.min_declared_len(), 14);
        assert_eq!(MessageType::EnergyDelta.to_string(), "energy-delta");
    }
}
