use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MidiError {
    #[error("MIDI channel {0} is outside 1..=16")]
    InvalidChannel(u8),
    #[error("{field} value {value} exceeds maximum {max}")]
    ValueOutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },
    #[error("Delta time {0} exceeds the 4-byte VLQ maximum 0x0FFFFFFF")]
    DeltaTimeTooLarge(u32),
    #[error("Variable-length quantity at byte {0} is not terminated")]
    UnterminatedVlq(usize),
    #[error("Variable-length quantity at byte {0} is longer than 4 bytes")]
    VlqTooLong(usize),
    #[error("Byte 0x{status:02X} at byte {offset} is not a channel voice status")]
    InvalidStatus { status: u8, offset: usize },
    #[error("Data byte 0x{byte:02X} at byte {offset} has its high bit set")]
    InvalidDataByte { byte: u8, offset: usize },
    #[error("Message truncated: needs {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },
    #[error("Invalid track chunk: {0}")]
    InvalidTrack(String),
}

impl MidiError {
    pub fn invalid_track<S: Into<String>>(message: S) -> Self {
        MidiError::InvalidTrack(message.into())
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            MidiError::InvalidChannel(_)
            | MidiError::ValueOutOfRange { .. }
            | MidiError::DeltaTimeTooLarge(_) => ErrorKind::InvalidParameter,
            MidiError::UnterminatedVlq(_)
            | MidiError::VlqTooLong(_)
            | MidiError::InvalidStatus { .. }
            | MidiError::InvalidDataByte { .. }
            | MidiError::Truncated { .. }
            | MidiError::InvalidTrack(_) => ErrorKind::MalformedMessage,
        }
    }
}
