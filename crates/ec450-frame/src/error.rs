use ec450_transport::TransportError;

/// Errors that can occur during frame encoding, validation or reading.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The length byte is zero, filler, or not below the maximum message length.
    #[error("declared length {length:#04x} out of range (max {max:#04x})")]
    LengthOutOfRange { length: u8, max: u8 },

    /// The buffer size does not match its declared length.
    #[error("frame buffer is {actual} bytes, length byte implies {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The byte after the checksum is not the end marker.
    #[error("incorrect EOF {found:#04x}")]
    BadEof { found: u8 },

    /// The additive checksum does not match.
    #[error("invalid checksum {computed:#04x} (expect: {expected:#04x})")]
    BadChecksum { computed: u8, expected: u8 },

    /// The payload does not fit in a single frame.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The byte source failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An I/O error occurred while writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
