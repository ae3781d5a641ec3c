use std::time::Instant;

use bytes::BytesMut;
use ec450_transport::ByteSource;
use tracing::{debug, info, trace, warn};

use crate::codec::{hex_dump, is_length_candidate, Frame, FrameConfig, BUSY_BYTE, FRAME_OVERHEAD};
use crate::error::{FrameError, Result};

/// Running counters for a [`FrameReader`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ReaderStats {
    /// Frames that passed validation.
    pub frames: u64,
    /// `0xB5` filler bytes skipped.
    pub filler_bytes: u64,
    /// Other bytes skipped because they could not start a frame.
    pub dropped_bytes: u64,
    /// Frames discarded for a wrong end marker.
    pub bad_eof: u64,
    /// Frames discarded for a checksum mismatch.
    pub bad_checksum: u64,
}

/// Extracts validated frames from a [`ByteSource`].
///
/// Each [`poll`](Self::poll) drains every complete frame currently buffered and
/// returns as soon as the source runs short. A partially received frame is left
/// in the source, length byte included, and picked up again on the next poll.
pub struct FrameReader<S> {
    source: S,
    buf: BytesMut,
    config: FrameConfig,
    stats: ReaderStats,
    last_transmission: Option<Instant>,
}

impl<S: ByteSource> FrameReader<S> {
    /// Create a new frame reader with default configuration.
    pub fn new(source: S) -> Self {
        Self::with_config(source, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(source: S, config: FrameConfig) -> Self {
        Self {
            source,
            buf: BytesMut::with_capacity(usize::from(config.max_msg_length) + FRAME_OVERHEAD),
            config,
            stats: ReaderStats::default(),
            last_transmission: None,
        }
    }

    /// Process every complete frame currently buffered, timed against the current instant.
    ///
    /// `on_frame` is called once per validated frame, in wire order. Returns the
    /// number of frames delivered. Protocol errors never surface here; only a
    /// failing byte source does.
    pub fn poll<F>(&mut self, on_frame: F) -> Result<usize>
    where
        F: FnMut(Frame),
    {
        self.poll_at(Instant::now(), on_frame)
    }

    /// Same as [`poll`](Self::poll) with an explicit clock reading.
    pub fn poll_at<F>(&mut self, now: Instant, mut on_frame: F) -> Result<usize>
    where
        F: FnMut(Frame),
    {
        if let Some(last) = self.last_transmission {
            let gap = now.saturating_duration_since(last);
            if gap > self.config.stale_after {
                // No partial frame survives between polls, so there is nothing to reset.
                trace!(
                    gap_ms = (gap.as_millis() as u64),
                    "reception gap exceeded staleness window"
                );
            }
        }

        if self.source.available() == 0 {
            return Ok(0);
        }
        self.last_transmission = Some(now);

        let mut delivered = 0usize;
        while let Some(length) = self.source.peek_byte() {
            if !is_length_candidate(length, self.config.max_msg_length) {
                self.source.read_byte()?;
                if length == BUSY_BYTE {
                    self.stats.filler_bytes += 1;
                } else {
                    self.stats.dropped_bytes += 1;
                    info!(byte = format_args!("{length:02X}"), "dropped byte");
                }
                continue;
            }

            let total = usize::from(length) + FRAME_OVERHEAD;
            if self.source.max_buffered().is_some_and(|max| total > max) {
                self.source.read_byte()?;
                self.stats.dropped_bytes += 1;
                info!(
                    byte = format_args!("{length:02X}"),
                    frame_size = total,
                    "dropped length byte, frame cannot fit receive buffer"
                );
                continue;
            }
            if self.source.available() < total {
                break;
            }

            self.buf.clear();
            self.source.read_exact(total, &mut self.buf)?;
            let raw = self.buf.split().freeze();

            match Frame::validate_with_max(raw.clone(), self.config.max_msg_length) {
                Ok(frame) => {
                    self.stats.frames += 1;
                    delivered += 1;
                    on_frame(frame);
                }
                Err(err) => {
                    match err {
                        FrameError::BadEof { .. } => self.stats.bad_eof += 1,
                        FrameError::BadChecksum { .. } => self.stats.bad_checksum += 1,
                        _ => {}
                    }
                    warn!(error = %err, "discarding frame");
                    debug!(frame = %hex_dump(&raw), "rejected frame bytes");
                }
            }
        }

        Ok(delivered)
    }

    /// Counters accumulated since creation.
    pub fn stats(&self) -> ReaderStats {
        self.stats
    }

    /// Borrow the underlying byte source.
    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Mutably borrow the underlying byte source.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the reader and return the byte source.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl<S> std::fmt::Debug for FrameReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReader")
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish()
    }
}
