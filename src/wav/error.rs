use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Debug, Clone, Error)]
pub enum WavError {
    #[error("WAV chunk parsing error: Chunk '{0}', Position {1}, Details: {2}")]
    ChunkParsingError(String, String, String),
    #[error("Invalid FMT chunk size: found {0} bytes")]
    InvalidFmtChunkSize(usize),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("WAVE cannot represent this format: {0}")]
    UnrepresentableFormat(String),
    #[error("Payload of {0} bytes exceeds the 4 GiB RIFF size limit")]
    FileTooLarge(u64),
    #[error("Cannot write to a finalized WAV stream")]
    WriteAfterFinalize,
}

impl WavError {
    pub fn chunk_parsing<S1: Into<String>, S2: Into<String>, S3: Into<String>>(
        chunk_id: S1,
        position: S2,
        details: S3,
    ) -> Self {
        WavError::ChunkParsingError(chunk_id.into(), position.into(), details.into())
    }

    pub fn invalid_format<S: Into<String>>(message: S) -> Self {
        WavError::InvalidFormat(message.into())
    }

    pub fn unrepresentable<S: Into<String>>(message: S) -> Self {
        WavError::UnrepresentableFormat(message.into())
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            WavError::ChunkParsingError(..)
            | WavError::InvalidFmtChunkSize(_)
            | WavError::InvalidFormat(_) => ErrorKind::MalformedMessage,
            WavError::UnrepresentableFormat(_) | WavError::FileTooLarge(_) => {
                ErrorKind::FormatMismatch
            }
            WavError::WriteAfterFinalize => ErrorKind::InvalidParameter,
        }
    }
}
