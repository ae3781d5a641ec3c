//! EC450 measurement decoding and accumulation.
//!
//! Frames handed out by [`ec450_frame::FrameReader`] go through two stages:
//! - [`decode`] turns a frame into a [`MeasurementRecord`] (pure)
//! - [`MeasurementState::apply`] folds the record into the running state and
//!   yields the values to publish
//!
//! [`Meter`] wires both stages to a byte source and a set of [`SinkBindings`].

pub mod decoder;
pub mod error;
pub mod meter;
pub mod sink;
pub mod state;

pub use decoder::{decode, encode_record, MeasurementRecord, MessageType, CHANNELS};
pub use error::{BindError, DecodeError, MeterError, Result};
pub use meter::{Meter, MeterStats, TickSummary};
pub use sink::{Publication, Sensor, SensorChannel, SinkBindings, SinkHandle, SubChannel, SUB_CHANNELS};
pub use state::MeasurementState;
