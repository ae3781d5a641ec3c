use std::path::PathBuf;

/// Errors that can occur while pulling bytes from a serial source.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A consuming read asked for more bytes than the source holds.
    #[error("read underrun ({requested} bytes requested, {available} available)")]
    Underrun { requested: usize, available: usize },

    /// Failed to open the device or capture file.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
