//! Byte-source abstraction for EC450 serial links.
//!
//! The frame layer never talks to a UART directly. It only needs a buffered
//! byte stream that can report how many bytes are pending, peek the next one
//! without consuming it, and hand over a run of bytes on request:
//! - [`RxBuffer`] is an in-memory receive FIFO, fed by the host
//! - [`StreamSource`] fills an `RxBuffer` from any [`std::io::Read`]
//!
//! This is the lowest layer of the workspace. Everything else builds on top of
//! the [`ByteSource`] trait provided here.

pub mod buffer;
pub mod error;
pub mod line;
pub mod source;
pub mod stream;

pub use buffer::{RxBuffer, DEFAULT_RX_BUFFER_SIZE};
pub use error::{Result, TransportError};
pub use line::{LineConfig, Parity};
pub use source::ByteSource;
pub use stream::StreamSource;
