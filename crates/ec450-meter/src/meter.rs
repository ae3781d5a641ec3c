use std::time::Instant;

use ec450_frame::{hex_dump, FrameConfig, FrameReader, ReaderStats};
use ec450_transport::ByteSource;
use tracing::{debug, info, warn};

use crate::decoder::decode;
use crate::error::{DecodeError, Result};
use crate::sink::{Publication, SinkBindings};
use crate::state::MeasurementState;

/// What one [`Meter::tick`] did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    /// Frames that passed validation.
    pub frames: usize,
    /// Frames that decoded into a record.
    pub records: usize,
    /// Values handed to a bound sink.
    pub published: usize,
}

/// Counters accumulated over the meter's lifetime.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MeterStats {
    pub reader: ReaderStats,
    pub records: u64,
    pub unknown_type: u64,
    pub truncated: u64,
}

/// The full receive pipeline: byte source, frame reader, decoder, state, sinks.
///
/// Drive it by calling [`tick`](Self::tick) from the host loop. Every tick
/// consumes whatever complete frames are buffered and returns without waiting.
pub struct Meter<S> {
    reader: FrameReader<S>,
    state: MeasurementState,
    sinks: SinkBindings,
    records: u64,
    unknown_type: u64,
    truncated: u64,
}

impl<S: ByteSource> Meter<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, FrameConfig::default())
    }

    pub fn with_config(source: S, config: FrameConfig) -> Self {
        Self {
            reader: FrameReader::with_config(source, config),
            state: MeasurementState::new(),
            sinks: SinkBindings::new(),
            records: 0,
            unknown_type: 0,
            truncated: 0,
        }
    }

    /// Run one receive cycle.
    pub fn tick(&mut self) -> Result<TickSummary> {
        self.tick_with(Instant::now(), |_| {})
    }

    /// Run one receive cycle at `now`, also reporting every publication to `observe`.
    ///
    /// `observe` sees each value whether or not a sink is bound on its channel.
    pub fn tick_with<F>(&mut self, now: Instant, mut observe: F) -> Result<TickSummary>
    where
        F: FnMut(&Publication),
    {
        let state = &mut self.state;
        let sinks = &mut self.sinks;
        let records = &mut self.records;
        let unknown_type = &mut self.unknown_type;
        let truncated = &mut self.truncated;

        let mut decoded = 0usize;
        let mut published = 0usize;
        let frames = self.reader.poll_at(now, |frame| match decode(&frame) {
            Ok(record) => {
                *records += 1;
                decoded += 1;
                for publication in state.apply(&record) {
                    observe(&publication);
                    if sinks.publish(publication) {
                        published += 1;
                    }
                }
            }
            Err(err @ DecodeError::UnknownType { .. }) => {
                *unknown_type += 1;
                info!(error = %err, "ignoring frame");
                debug!(frame = %hex_dump(frame.as_bytes()), "unrecognized frame bytes");
            }
            Err(err @ DecodeError::Truncated { .. }) => {
                *truncated += 1;
                warn!(error = %err, "discarding frame");
                debug!(frame = %hex_dump(frame.as_bytes()), "rejected frame bytes");
            }
        })?;

        Ok(TickSummary {
            frames,
            records: decoded,
            published,
        })
    }

    pub fn state(&self) -> &MeasurementState {
        &self.state
    }

    pub fn sinks(&self) -> &SinkBindings {
        &self.sinks
    }

    /// Sink wiring. Bind before the first tick; values published earlier are not replayed.
    pub fn sinks_mut(&mut self) -> &mut SinkBindings {
        &mut self.sinks
    }

    pub fn stats(&self) -> MeterStats {
        MeterStats {
            reader: self.reader.stats(),
            records: self.records,
            unknown_type: self.unknown_type,
            truncated: self.truncated,
        }
    }

    /// Borrow the byte source.
    pub fn source(&self) -> &S {
        self.reader.get_ref()
    }

    /// Mutably borrow the byte source, e.g. to push freshly received bytes.
    pub fn source_mut(&mut self) -> &mut S {
        self.reader.get_mut()
    }

    /// Consume the meter, returning the byte source and the final state.
    pub fn into_parts(self) -> (S, MeasurementState) {
        (self.reader.into_inner(), self.state)
    }
}

impl<S> std::fmt::Debug for Meter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Meter")
            .field("reader", &self.reader)
            .field("state", &self.state)
            .field("sinks", &self.sinks)
            .finish()
    }
}
