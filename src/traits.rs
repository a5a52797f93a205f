use crate::{descriptor::FormatDescriptor, error::AudioIOResult};

// ============================================================================
// STREAMING READ TRAITS
// ============================================================================

/// Source side of a container conversion (object-safe).
///
/// A reader parses its container header at construction and afterwards
/// yields the raw payload in WAVE byte layout, whatever the on-disk layout is.
/// Readers for big-endian containers normalize as they go, so a consumer can
/// copy the bytes straight into a WAVE `data` chunk.
///
/// # Example
///
/// ```no_run
/// use audio_container_io::traits::ContainerReader;
///
/// fn drain(stream: &mut dyn ContainerReader) -> Result<u64, audio_container_io::AudioIOError> {
///     let mut buf = [0u8; 4096];
///     let mut total = 0;
///     loop {
///         let n = stream.read_payload(&mut buf)?;
///         if n == 0 {
///             return Ok(total);
///         }
///         total += n as u64;
///     }
/// }
/// ```
pub trait ContainerReader {
    /// The format of the payload this reader yields.
    fn format(&self) -> &FormatDescriptor;

    /// Read up to `buf.len()` payload bytes.
    ///
    /// # Returns
    ///
    /// The number of bytes placed at the start of `buf`. `Ok(0)` means the
    /// payload is exhausted (or `buf` is empty).
    ///
    /// # Errors
    ///
    /// `IoFailure` if the underlying reader fails, `MalformedMessage` if the
    /// stream ends before the size its header declared.
    fn read_payload(&mut self, buf: &mut [u8]) -> AudioIOResult<usize>;

    /// Total payload length declared by the container header, in bytes.
    fn payload_len(&self) -> u64;

    /// Payload bytes already returned by [`read_payload`](Self::read_payload).
    fn payload_position(&self) -> u64;

    /// Payload bytes not yet read.
    fn remaining_payload(&self) -> u64 {
        self.payload_len().saturating_sub(self.payload_position())
    }
}

// ============================================================================
// STREAMING WRITE TRAITS
// ============================================================================

/// Destination side of a container conversion (object-safe).
///
/// A writer is bound to one [`FormatDescriptor`] at construction and emits its
/// header right away, with placeholder sizes where the container needs them.
///
/// # Finalization
///
/// Containers that store sizes up front need those fields back-patched once
/// the payload is complete. Call [`finalize()`](ContainerWriter::finalize)
/// when done writing. The internal `finalized` flag makes repeated calls a
/// no-op.
pub trait ContainerWriter {
    /// The format this writer was bound to.
    fn format(&self) -> &FormatDescriptor;

    /// Append payload bytes. Any length is accepted, including lengths that
    /// split a sample frame.
    ///
    /// # Errors
    ///
    /// Fails if the writer was already finalized, if the container's size
    /// limit would be exceeded, or if the underlying writer fails.
    fn write_payload(&mut self, bytes: &[u8]) -> AudioIOResult<()>;

    /// Flush any buffered data to the underlying writer.
    fn flush(&mut self) -> AudioIOResult<()>;

    /// Finalize the stream: pad, back-patch sizes and flush.
    ///
    /// # Idempotency
    ///
    /// Calling `finalize()` multiple times succeeds without re-writing
    /// headers.
    fn finalize(&mut self) -> AudioIOResult<()>;

    /// Check if the stream has been finalized.
    fn is_finalized(&self) -> bool;

    /// Payload bytes accepted so far (excluding padding).
    fn payload_bytes_written(&self) -> u64;
}

impl<T: ContainerReader + ?Sized> ContainerReader for Box<T> {
    fn format(&self) -> &FormatDescriptor {
        (**self).format()
    }

    fn read_payload(&mut self, buf: &mut [u8]) -> AudioIOResult<usize> {
        (**self).read_payload(buf)
    }

    fn payload_len(&self) -> u64 {
        (**self).payload_len()
    }

    fn payload_position(&self) -> u64 {
        (**self).payload_position()
    }
}

impl<T: ContainerWriter + ?Sized> ContainerWriter for Box<T> {
    fn format(&self) -> &FormatDescriptor {
        (**self).format()
    }

    fn write_payload(&mut self, bytes: &[u8]) -> AudioIOResult<()> {
        (**self).write_payload(bytes)
    }

    fn flush(&mut self) -> AudioIOResult<()> {
        (**self).flush()
    }

    fn finalize(&mut self) -> AudioIOResult<()> {
        (**self).finalize()
    }

    fn is_finalized(&self) -> bool {
        (**self).is_finalized()
    }

    fn payload_bytes_written(&self) -> u64 {
        (**self).payload_bytes_written()
    }
}
