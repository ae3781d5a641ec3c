use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use bytes::BytesMut;
use tracing::debug;

use crate::buffer::RxBuffer;
use crate::error::{Result, TransportError};
use crate::source::ByteSource;

const DEFAULT_CHUNK_SIZE: usize = 64;

/// Adapts any `Read` into a [`ByteSource`].
///
/// Bytes only move from the reader into the receive buffer on [`fill`](Self::fill);
/// the `ByteSource` side never touches the reader, so frame parsing stays non-blocking
/// regardless of how the inner stream behaves.
pub struct StreamSource<R> {
    inner: R,
    rx: RxBuffer,
    chunk_size: usize,
    eof: bool,
}

impl<R: Read> StreamSource<R> {
    /// Wrap a reader with a default-sized receive buffer.
    pub fn new(inner: R) -> Self {
        Self::with_buffer(inner, RxBuffer::new(), DEFAULT_CHUNK_SIZE)
    }

    /// Wrap a reader with an explicit receive buffer and per-fill chunk size.
    pub fn with_buffer(inner: R, rx: RxBuffer, chunk_size: usize) -> Self {
        Self {
            inner,
            rx,
            chunk_size: chunk_size.max(1),
            eof: false,
        }
    }

    /// Perform at most one read on the inner stream.
    ///
    /// Never reads more than the receive buffer has room for. Returns the number
    /// of bytes moved; `0` means the buffer is full, the stream would block, or
    /// the stream ended (see [`is_eof`](Self::is_eof)).
    pub fn fill(&mut self) -> Result<usize> {
        let want = self.chunk_size.min(self.rx.free());
        if want == 0 || self.eof {
            return Ok(0);
        }

        let mut chunk = vec![0u8; want];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(0) => {
                    debug!("byte stream reached end");
                    self.eof = true;
                    return Ok(0);
                }
                Ok(n) => return Ok(self.rx.push(&chunk[..n])),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(0),
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    /// True once the inner stream reported end of file.
    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Borrow the receive buffer.
    pub fn rx(&self) -> &RxBuffer {
        &self.rx
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the source and return the inner stream. Buffered bytes are lost.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl StreamSource<File> {
    /// Open a capture file, FIFO or pre-configured serial device node.
    pub fn open(path: impl AsRef<Path>, rx: RxBuffer, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TransportError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::with_buffer(file, rx, chunk_size))
    }
}

impl<R> ByteSource for StreamSource<R> {
    fn available(&self) -> usize {
        self.rx.available()
    }

    fn peek_byte(&self) -> Option<u8> {
        self.rx.peek_byte()
    }

    fn max_buffered(&self) -> Option<usize> {
        self.rx.max_buffered()
    }

    fn read_byte(&mut self) -> Result<u8> {
        self.rx.read_byte()
    }

    fn read_exact(&mut self, n: usize, dst: &mut BytesMut) -> Result<()> {
        self.rx.read_exact(n, dst)
    }
}

impl<R> std::fmt::Debug for StreamSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSource")
            .field("buffered", &self.rx.available())
            .field("chunk_size", &self.chunk_size)
            .field("eof", &self.eof)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn fill_moves_one_chunk() {
        let mut src = StreamSource::with_buffer(Cursor::new(vec![1u8; 10]), RxBuffer::new(), 4);

        assert_eq!(src.fill().unwrap(), 4);
        assert_eq!(src.available(), 4);
        assert_eq!(src.fill().unwrap(), 4);
        assert_eq!(src.fill().unwrap(), 2);
        assert!(!src.is_eof());
        assert_eq!(src.fill().unwrap(), 0);
        assert!(src.is_eof());
        assert_eq!(src.available(), 10);
    }

    #[test]
    fn fill_respects_buffer_room() {
        let mut src =
            StreamSource::with_buffer(Cursor::new(vec![7u8; 8]), RxBuffer::with_capacity(3), 16);

        assert_eq!(src.fill().unwrap(), 3);
        assert_eq!(src.fill().unwrap(), 0);
        assert!(!src.is_eof());
        assert_eq!(src.rx().overflowed(), 0);

        src.read_byte().unwrap();
        assert_eq!(src.fill().unwrap(), 1);
        assert_eq!(src.max_buffered(), Some(3));
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            bytes: vec![0xB5, 0xB5],
        };
        let mut src = StreamSource::new(reader);

        assert_eq!(src.fill().unwrap(), 2);
        assert_eq!(src.peek_byte(), Some(0xB5));
    }

    #[test]
    fn would_block_is_not_an_error() {
        let mut src = StreamSource::new(AlwaysWouldBlock);
        assert_eq!(src.fill().unwrap(), 0);
        assert!(!src.is_eof());
    }

    #[test]
    fn open_missing_file_reports_path() {
        let missing = std::env::temp_dir().join(format!("ec450-missing-{}", std::process::id()));
        let err = StreamSource::open(&missing, RxBuffer::new(), 8).unwrap_err();
        assert!(matches!(err, TransportError::Open { path, .. } if path == missing));
    }

    struct InterruptedThenData {
        interrupted: bool,
        bytes: Vec<u8>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            let n = self.bytes.len().min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[..n]);
            self.bytes.drain(..n);
            Ok(n)
        }
    }

    struct AlwaysWouldBlock;

    impl Read for AlwaysWouldBlock {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::WouldBlock))
        }
    }
}
