//! Decoder for the EC450 multi-channel energy monitor serial protocol.
//!
//! The device streams length-prefixed, checksummed frames at 19200 8N1 carrying
//! line voltage and per-channel current, power and energy deltas.
//!
//! # Crate Structure
//!
//! - [`transport`]: Byte-source abstraction (RX buffer, stream adapter, line settings)
//! - [`frame`]: Frame validation and extraction from a noisy byte stream
//! - [`meter`]: Message decoding, measurement state and sensor publication

/// Re-export transport types.
pub mod transport {
    pub use ec450_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use ec450_frame::*;
}

/// Re-export meter types.
pub mod meter {
    pub use ec450_meter::*;
}

pub use ec450_meter::{MeasurementRecord, MeasurementState, Meter, SensorChannel};
