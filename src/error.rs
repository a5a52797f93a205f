#[cfg(feature = "aiff")]
use crate::aiff::error::AiffError;
#[cfg(feature = "midi")]
use crate::midi::error::MidiError;
#[cfg(feature = "wav")]
use crate::wav::error::WavError;

use core::fmt::{Display, Formatter, Result as FmtResult};
use std::io;
use thiserror::Error;

/// Result type for audio_container_io operations
#[allow(clippy::result_large_err)]
pub type AudioIOResult<T> = Result<T, AudioIOError>;

/// Coarse classification of every error the crate can produce.
///
/// Callers that only care about *why* something failed (bad input, bad data,
/// bad I/O, or an unrepresentable format) can match on this instead of the
/// full error tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A construction-time contract was violated (zero channels, 14-bit overflow, ...)
    InvalidParameter,
    /// Decoded bytes do not follow the wire/container layout
    MalformedMessage,
    /// The underlying reader or writer failed
    IoFailure,
    /// The destination cannot represent the source's format
    FormatMismatch,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let s = match self {
            ErrorKind::InvalidParameter => "invalid parameter",
            ErrorKind::MalformedMessage => "malformed message",
            ErrorKind::IoFailure => "I/O failure",
            ErrorKind::FormatMismatch => "format mismatch",
        };
        f.write_str(s)
    }
}

/// Comprehensive error type for audio_container_io operations
#[derive(Debug, Error)]
pub enum AudioIOError {
    /// File I/O errors (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Data that does not follow the container or message layout
    #[error("Malformed data at {position}: {description} - {details}")]
    Malformed {
        description: String,
        details: String,
        position: ErrorPosition,
    },

    #[error("Format mismatch: {0}")]
    FormatMismatch(String),

    #[cfg(feature = "wav")]
    #[error("WAV error: {0}")]
    WavError(#[from] WavError),

    #[cfg(feature = "aiff")]
    #[error("AIFF error: {0}")]
    AiffError(#[from] AiffError),

    #[cfg(feature = "midi")]
    #[error("MIDI error: {0}")]
    MidiError(#[from] MidiError),

    #[error("Missing feature: {0}")]
    MissingFeature(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Position information for errors that occur during parsing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorPosition {
    /// Byte offset in the stream where the error occurred
    pub offset: usize,
    /// Human-readable description of the position
    pub description: String,
}

impl ErrorPosition {
    /// Create a new error position at the given byte offset
    pub fn new(offset: usize) -> Self {
        Self {
            offset,
            description: format!("byte offset {}", offset),
        }
    }

    /// Set a custom description for the error position
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Display for ErrorPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.description)
    }
}

impl AudioIOError {
    /// Create an InvalidParameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        AudioIOError::InvalidParameter(message.into())
    }

    /// Create a Malformed error with position information
    pub fn malformed(
        description: impl Into<String>,
        details: impl Into<String>,
        position: ErrorPosition,
    ) -> Self {
        AudioIOError::Malformed {
            description: description.into(),
            details: details.into(),
            position,
        }
    }

    /// Create a Malformed error without position information (uses default position)
    pub fn malformed_simple(description: impl Into<String>, details: impl Into<String>) -> Self {
        AudioIOError::Malformed {
            description: description.into(),
            details: details.into(),
            position: ErrorPosition::default(),
        }
    }

    /// Create a FormatMismatch error
    pub fn format_mismatch(message: impl Into<String>) -> Self {
        AudioIOError::FormatMismatch(message.into())
    }

    /// Create a MissingFeature error with a custom message
    pub fn missing_feature(message: impl Into<String>) -> Self {
        AudioIOError::MissingFeature(message.into())
    }

    /// Create an UnsupportedFormat error with a custom message
    pub fn unsupported_format(message: impl Into<String>) -> Self {
        AudioIOError::UnsupportedFormat(message.into())
    }

    /// Classify this error into one of the four error kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AudioIOError::Io(_) => ErrorKind::IoFailure,
            AudioIOError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            AudioIOError::Malformed { .. } => ErrorKind::MalformedMessage,
            AudioIOError::FormatMismatch(_)
            | AudioIOError::MissingFeature(_)
            | AudioIOError::UnsupportedFormat(_) => ErrorKind::FormatMismatch,
            #[cfg(feature = "wav")]
            AudioIOError::WavError(e) => e.kind(),
            #[cfg(feature = "aiff")]
            AudioIOError::AiffError(e) => e.kind(),
            #[cfg(feature = "midi")]
            AudioIOError::MidiError(e) => e.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_classify_as_io_failure() {
        let err: AudioIOError = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_malformed_error_reports_position() {
        let err = AudioIOError::malformed(
            "Bad chunk",
            "size overflows file",
            ErrorPosition::new(36).with_description("data chunk header"),
        );
        assert_eq!(err.kind(), ErrorKind::MalformedMessage);
        assert_eq!(
            err.to_string(),
            "Malformed data at data chunk header: Bad chunk - size overflows file"
        );
    }

    #[test]
    fn test_unsupported_format_is_a_mismatch() {
        assert_eq!(
            AudioIOError::unsupported_format("ogg").kind(),
            ErrorKind::FormatMismatch
        );
        assert_eq!(
            AudioIOError::invalid_parameter("zero channels").kind(),
            ErrorKind::InvalidParameter
        );
    }
}
