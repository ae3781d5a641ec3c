use bytes::{Buf, BytesMut};
use tracing::warn;

use crate::error::{Result, TransportError};
use crate::source::ByteSource;

/// Default receive buffer size, matching a typical UART RX ring.
pub const DEFAULT_RX_BUFFER_SIZE: usize = 256;

/// In-memory receive FIFO.
///
/// The host pushes whatever the line delivered; the frame reader drains it.
/// Bytes pushed past `capacity` are dropped and counted, as a hardware RX
/// ring would.
#[derive(Debug)]
pub struct RxBuffer {
    buf: BytesMut,
    capacity: usize,
    overflowed: u64,
}

impl RxBuffer {
    /// Create a buffer with [`DEFAULT_RX_BUFFER_SIZE`] capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RX_BUFFER_SIZE)
    }

    /// Create a buffer holding at most `capacity` unread bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
            overflowed: 0,
        }
    }

    /// Append received bytes. Returns how many were accepted.
    pub fn push(&mut self, data: &[u8]) -> usize {
        let accepted = data.len().min(self.free());
        self.buf.extend_from_slice(&data[..accepted]);

        let dropped = data.len() - accepted;
        if dropped > 0 {
            self.overflowed = self.overflowed.saturating_add(dropped as u64);
            warn!(dropped, capacity = self.capacity, "rx buffer overflow");
        }
        accepted
    }

    /// Free space left before pushes start dropping bytes.
    pub fn free(&self) -> usize {
        self.capacity.saturating_sub(self.buf.len())
    }

    /// Maximum number of unread bytes held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total bytes dropped on overflow since creation.
    pub fn overflowed(&self) -> u64 {
        self.overflowed
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Discard everything buffered.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl Default for RxBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSource for RxBuffer {
    fn available(&self) -> usize {
        self.buf.len()
    }

    fn peek_byte(&self) -> Option<u8> {
        self.buf.first().copied()
    }

    fn max_buffered(&self) -> Option<usize> {
        Some(self.capacity)
    }

    fn read_byte(&mut self) -> Result<u8> {
        if self.buf.is_empty() {
            return Err(TransportError::Underrun {
                requested: 1,
                available: 0,
            });
        }
        Ok(self.buf.get_u8())
    }

    fn read_exact(&mut self, n: usize, dst: &mut BytesMut) -> Result<()> {
        if n > self.buf.len() {
            return Err(TransportError::Underrun {
                requested: n,
                available: self.buf.len(),
            });
        }
        dst.extend_from_slice(&self.buf[..n]);
        self.buf.advance(n);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peek_does_not_consume() {
        let mut rx = RxBuffer::new();
        rx.push(&[0x05, 0x0D]);

        assert_eq!(rx.peek_byte(), Some(0x05));
        assert_eq!(rx.peek_byte(), Some(0x05));
        assert_eq!(rx.available(), 2);
    }

    #[test]
    fn read_exact_consumes_in_order() {
        let mut rx = RxBuffer::new();
        rx.push(&[1, 2, 3, 4]);

        let mut dst = BytesMut::new();
        rx.read_exact(3, &mut dst).unwrap();

        assert_eq!(dst.as_ref(), &[1, 2, 3]);
        assert_eq!(rx.available(), 1);
        assert_eq!(rx.read_byte().unwrap(), 4);
        assert!(rx.is_empty());
        assert_eq!(rx.peek_byte(), None);
    }

    #[test]
    fn read_byte_on_empty_is_underrun() {
        let mut rx = RxBuffer::with_capacity(4);
        rx.push(&[0xB5]);

        assert_eq!(rx.read_byte().unwrap(), 0xB5);
        assert!(matches!(
            rx.read_byte().unwrap_err(),
            TransportError::Underrun {
                requested: 1,
                available: 0
            }
        ));
        assert_eq!(rx.max_buffered(), Some(4));
    }

    #[test]
    fn read_past_available_is_underrun() {
        let mut rx = RxBuffer::new();
        rx.push(&[1, 2]);

        let mut dst = BytesMut::new();
        let err = rx.read_exact(3, &mut dst).unwrap_err();

        assert!(matches!(
            err,
            TransportError::Underrun {
                requested: 3,
                available: 2
            }
        ));
        assert_eq!(rx.available(), 2);
        assert!(dst.is_empty());
    }

    #[test]
    fn overflow_drops_tail_and_counts() {
        let mut rx = RxBuffer::with_capacity(4);

        assert_eq!(rx.push(&[1, 2, 3]), 3);
        assert_eq!(rx.push(&[4, 5, 6]), 1);

        assert_eq!(rx.available(), 4);
        assert_eq!(rx.overflowed(), 2);
        assert_eq!(rx.free(), 0);
    }

    #[test]
    fn space_is_reclaimed_after_reads() {
        let mut rx = RxBuffer::with_capacity(2);
        rx.push(&[1, 2]);
        rx.read_byte().unwrap();

        assert_eq!(rx.free(), 1);
        assert_eq!(rx.push(&[3]), 1);

        rx.clear();
        assert!(rx.is_empty());
        assert_eq!(rx.capacity(), 2);
    }
}
