use bytes::BytesMut;

use crate::error::{Result, TransportError};

/// A buffered, non-blocking byte stream, the way a UART RX FIFO looks to its reader.
///
/// Implementations must never block: `available` reports what is already
/// buffered and `read_exact` only hands out bytes that are counted there.
pub trait ByteSource {
    /// Number of bytes that can be consumed right now.
    fn available(&self) -> usize;

    /// The next byte, without consuming it. `None` when nothing is buffered.
    fn peek_byte(&self) -> Option<u8>;

    /// Consume exactly `n` bytes and append them to `dst`.
    ///
    /// Callers check `available()` first; asking for more is a
    /// [`TransportError::Underrun`](crate::TransportError::Underrun).
    fn read_exact(&mut self, n: usize, dst: &mut BytesMut) -> Result<()>;

    /// Most bytes the source can ever hold at once, if bounded.
    ///
    /// A frame longer than this can never become fully available, so readers
    /// treat its length byte as noise instead of waiting on it.
    fn max_buffered(&self) -> Option<usize> {
        None
    }

    /// Consume and return a single byte.
    fn read_byte(&mut self) -> Result<u8> {
        let mut one = BytesMut::with_capacity(1);
        self.read_exact(1, &mut one)?;
        one.first().copied().ok_or(TransportError::Underrun {
            requested: 1,
            available: 0,
        })
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn available(&self) -> usize {
        (**self).available()
    }

    fn peek_byte(&self) -> Option<u8> {
        (**self).peek_byte()
    }

    fn read_exact(&mut self, n: usize, dst: &mut BytesMut) -> Result<()> {
        (**self).read_exact(n, dst)
    }

    fn max_buffered(&self) -> Option<usize> {
        (**self).max_buffered()
    }

    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }
}
