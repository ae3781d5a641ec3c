use ec450_frame::FrameError;

use crate::decoder::MessageType;

/// Errors produced when turning a validated frame into a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The message type byte is not one this decoder knows.
    #[error("unrecognized message type {type_byte:#04x}")]
    UnknownType { type_byte: u8 },

    /// The frame is too short for its type's fixed layout.
    #[error("{msg_type} frame too short (declared length {declared}, need {needed})")]
    Truncated {
        msg_type: MessageType,
        needed: usize,
        declared: usize,
    },
}

/// Errors binding a sensor sink to a channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// Sub-channel index past the last physical channel.
    #[error("sub-channel {index} out of range (max {max})")]
    SubChannelOutOfRange { index: usize, max: usize },
}

/// Errors surfaced by [`Meter::tick`](crate::Meter::tick).
#[derive(Debug, thiserror::Error)]
pub enum MeterError {
    #[error(transparent)]
    Frame(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, MeterError>;

#[cfg(test)]
mod tests {
    use ec450_transport::TransportError;

    use super::*;

    #[test]
    fn tick_errors_wrap_frame_errors_transparently() {
        let err = MeterError::from(FrameError::Transport(TransportError::Underrun {
            requested: 6,
            available: 2,
        }));
        assert!(matches!(err, MeterError::Frame(FrameError::Transport(_))));
        assert_eq!(
            err.to_string(),
            FrameError::Transport(TransportError::Underrun {
                requested: 6,
                available: 2
            })
            .to_string()
        );
    }
}
