use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Debug, Clone, Error)]
pub enum AiffError {
    #[error("Not an AIFF stream: {0}")]
    NotAiff(String),
    #[error("Required {0} chunk not found in AIFF file")]
    MissingChunk(&'static str),
    #[error("Invalid COMM chunk: {0}")]
    InvalidCommChunk(String),
    #[error("Invalid SSND chunk: {0}")]
    InvalidSoundData(String),
    #[error("Invalid 80-bit sample rate: {0}")]
    InvalidSampleRate(String),
}

impl AiffError {
    pub fn invalid_comm<S: Into<String>>(message: S) -> Self {
        AiffError::InvalidCommChunk(message.into())
    }

    pub fn invalid_sound_data<S: Into<String>>(message: S) -> Self {
        AiffError::InvalidSoundData(message.into())
    }

    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::MalformedMessage
    }
}
