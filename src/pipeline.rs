//! Fixed-chunk payload copy between a [`ContainerReader`] and a
//! [`ContainerWriter`].
//!
//! The pipeline owns both ends for the duration of one conversion. Payload
//! bytes pass through a single reusable buffer of `chunk_size` bytes (or the
//! declared payload length, if smaller), so memory use is independent of the
//! payload length.
//!
//! # Example
//!
//! ```no_run
//! use audio_container_io::aiff::StreamedAiffReader;
//! use audio_container_io::pipeline::ContainerStreamPipeline;
//! use audio_container_io::wav::StreamedWavWriter;
//!
//! let source = StreamedAiffReader::open("input.aiff")?;
//! let summary = ContainerStreamPipeline::default()
//!     .convert(source, |format| StreamedWavWriter::create("output.wav", format))?;
//! println!("copied {} bytes", summary.bytes_copied);
//! # Ok::<(), audio_container_io::AudioIOError>(())
//! ```

use core::fmt::{Display, Formatter, Result as FmtResult};

use crate::{
    descriptor::FormatDescriptor,
    error::{AudioIOError, AudioIOResult},
    traits::{ContainerReader, ContainerWriter},
};

/// Default transfer buffer size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Outcome of a successful conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Payload bytes read from the source and written to the destination
    pub bytes_copied: u64,
    /// Number of non-empty reads
    pub chunks: u64,
    /// Format the destination was created with
    pub descriptor: FormatDescriptor,
}

impl Display for ConversionSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} bytes in {} chunks ({})",
            self.bytes_copied, self.chunks, self.descriptor
        )
    }
}

/// Copies a container payload through a fixed-size buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerStreamPipeline {
    chunk_size: usize,
}

impl Default for ContainerStreamPipeline {
    fn default() -> Self {
        ContainerStreamPipeline {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ContainerStreamPipeline {
    /// Create a pipeline with a custom buffer size.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> AudioIOResult<Self> {
        if chunk_size == 0 {
            return Err(AudioIOError::invalid_parameter(
                "Pipeline chunk size must be greater than zero",
            ));
        }
        Ok(ContainerStreamPipeline { chunk_size })
    }

    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Copy the payload of `source` into a destination created by
    /// `destination_factory`.
    ///
    /// The factory receives the source format and must write the destination
    /// header before returning. The payload is then copied until the source
    /// reports end of stream, and the destination is finalized.
    ///
    /// Both streams are consumed and dropped before this returns, on every
    /// path.
    ///
    /// # Errors
    ///
    /// - Whatever the factory returns (typically `FormatMismatch` when the
    ///   destination cannot represent the format). No destination exists in
    ///   that case.
    /// - The first read, write or finalize error. The destination is
    ///   finalized best effort before the error propagates; a failure of that
    ///   cleanup is logged and the original error is returned. A partially
    ///   written destination may remain.
    pub fn convert<R, W, F>(
        &self,
        mut source: R,
        destination_factory: F,
    ) -> AudioIOResult<ConversionSummary>
    where
        R: ContainerReader,
        W: ContainerWriter,
        F: FnOnce(&FormatDescriptor) -> AudioIOResult<W>,
    {
        let descriptor = source.format().clone();
        let mut destination = destination_factory(&descriptor)?;

        tracing::debug!(
            format = %descriptor,
            payload_len = source.payload_len(),
            chunk_size = self.chunk_size,
            "starting payload copy"
        );

        match self.pump(&mut source, &mut destination) {
            Ok((bytes_copied, chunks)) => {
                destination.finalize()?;
                tracing::debug!(bytes_copied, chunks, "payload copy complete");
                Ok(ConversionSummary {
                    bytes_copied,
                    chunks,
                    descriptor,
                })
            }
            Err(e) => {
                if let Err(cleanup) = destination.finalize() {
                    tracing::warn!(
                        error = %cleanup,
                        "failed to finalize destination after aborted copy"
                    );
                }
                Err(e)
            }
        }
    }

    fn pump<R, W>(&self, source: &mut R, destination: &mut W) -> AudioIOResult<(u64, u64)>
    where
        R: ContainerReader + ?Sized,
        W: ContainerWriter + ?Sized,
    {
        // Never larger than the payload left to copy
        let remaining = usize::try_from(source.remaining_payload().max(1)).unwrap_or(usize::MAX);
        let mut buffer = vec![0u8; self.chunk_size.min(remaining)];
        let mut bytes_copied = 0u64;
        let mut chunks = 0u64;

        loop {
            let n = source.read_payload(&mut buffer)?;
            if n == 0 {
                break;
            }
            destination.write_payload(&buffer[..n])?;
            bytes_copied += n as u64;
            chunks += 1;
            tracing::trace!(n, bytes_copied, "copied chunk");
        }

        Ok((bytes_copied, chunks))
    }
}

#[cfg(all(test, feature = "wav"))]
mod tests {
    use std::{
        cell::Cell,
        io::{self, Cursor},
        rc::Rc,
    };

    use super::*;
    use crate::{
        descriptor::CodecTag,
        error::ErrorKind,
        wav::{StreamedWavReader, StreamedWavWriter},
    };

    /// In-memory source that returns at most `max_read` bytes per call.
    struct MemoryReader {
        format: FormatDescriptor,
        payload: Vec<u8>,
        position: usize,
        max_read: usize,
        fail_at: Option<usize>,
        dropped: Rc<Cell<bool>>,
    }

    impl MemoryReader {
        fn new(format: FormatDescriptor, payload: Vec<u8>) -> Self {
            MemoryReader {
                format,
                payload,
                position: 0,
                max_read: usize::MAX,
                fail_at: None,
                dropped: Rc::new(Cell::new(false)),
            }
        }
    }

    impl Drop for MemoryReader {
        fn drop(&mut self) {
            self.dropped.set(true);
        }
    }

    impl ContainerReader for MemoryReader {
        fn format(&self) -> &FormatDescriptor {
            &self.format
        }

        fn read_payload(&mut self, buf: &mut [u8]) -> AudioIOResult<usize> {
            if let Some(at) = self.fail_at {
                if self.position >= at {
                    return Err(io::Error::other("source went away").into());
                }
            }
            let n = buf
                .len()
                .min(self.max_read)
                .min(self.payload.len() - self.position);
            buf[..n].copy_from_slice(&self.payload[self.position..self.position + n]);
            self.position += n;
            Ok(n)
        }

        fn payload_len(&self) -> u64 {
            self.payload.len() as u64
        }

        fn payload_position(&self) -> u64 {
            self.position as u64
        }
    }

    /// Destination that fails after accepting `limit` bytes.
    struct FailingWriter {
        format: FormatDescriptor,
        written: u64,
        limit: u64,
        finalize_calls: Rc<Cell<u32>>,
    }

    impl ContainerWriter for FailingWriter {
        fn format(&self) -> &FormatDescriptor {
            &self.format
        }

        fn write_payload(&mut self, bytes: &[u8]) -> AudioIOResult<()> {
            if self.written + bytes.len() as u64 > self.limit {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "disk full").into());
            }
            self.written += bytes.len() as u64;
            Ok(())
        }

        fn flush(&mut self) -> AudioIOResult<()> {
            Ok(())
        }

        fn finalize(&mut self) -> AudioIOResult<()> {
            self.finalize_calls.set(self.finalize_calls.get() + 1);
            Err(io::Error::other("finalize failed too").into())
        }

        fn is_finalized(&self) -> bool {
            false
        }

        fn payload_bytes_written(&self) -> u64 {
            self.written
        }
    }

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 251) as u8).collect()
    }

    fn pcm16_stereo() -> FormatDescriptor {
        FormatDescriptor::new_pcm(44_100, 2, 16).unwrap()
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = ContainerStreamPipeline::new(0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert_eq!(
            ContainerStreamPipeline::default().chunk_size(),
            DEFAULT_CHUNK_SIZE
        );
    }

    #[test]
    fn test_oversized_chunk_size_copies_in_one_chunk() {
        let data = payload(2);
        let source = MemoryReader::new(pcm16_stereo(), data.clone());
        let mut out = Cursor::new(Vec::new());

        let summary = ContainerStreamPipeline::new(usize::MAX)
            .unwrap()
            .convert(source, |format| StreamedWavWriter::new(&mut out, format))
            .unwrap();
        assert_eq!(summary.bytes_copied, 2);
        assert_eq!(summary.chunks, 1);
        assert_eq!(&out.get_ref()[44..46], data.as_slice());
    }

    #[test]
    fn test_byte_count_preserved() {
        for len in [0usize, 1, 4095, 4096, 10_000] {
            let data = payload(len);
            let source = MemoryReader::new(pcm16_stereo(), data.clone());
            let mut out = Cursor::new(Vec::new());

            let summary = ContainerStreamPipeline::default()
                .convert(source, |format| StreamedWavWriter::new(&mut out, format))
                .unwrap();
            assert_eq!(summary.bytes_copied, len as u64);
            assert_eq!(summary.chunks, len.div_ceil(DEFAULT_CHUNK_SIZE) as u64);
            assert_eq!(summary.descriptor, pcm16_stereo());

            out.set_position(0);
            let mut reader = StreamedWavReader::new(out).unwrap();
            assert_eq!(reader.payload_len(), len as u64);
            let mut copied = vec![0u8; len];
            let mut filled = 0;
            while filled < len {
                filled += reader.read_payload(&mut copied[filled..]).unwrap();
            }
            assert_eq!(copied, data, "len {}", len);
        }
    }

    #[test]
    fn test_short_reads_and_small_chunks() {
        let data = payload(1001);
        let mut source = MemoryReader::new(pcm16_stereo(), data.clone());
        source.max_read = 3;
        let mut out = Cursor::new(Vec::new());

        let summary = ContainerStreamPipeline::new(7)
            .unwrap()
            .convert(source, |format| StreamedWavWriter::new(&mut out, format))
            .unwrap();
        assert_eq!(summary.bytes_copied, 1001);
        assert_eq!(summary.chunks, 334);

        let bytes = out.into_inner();
        // 44-byte header, payload, one pad byte
        assert_eq!(bytes.len(), 44 + 1001 + 1);
        assert_eq!(&bytes[44..44 + 1001], data.as_slice());
    }

    #[test]
    fn test_unrepresentable_format_releases_source() {
        let format = FormatDescriptor::from_raw_parts(
            CodecTag::Unknown(0),
            2,
            44_100,
            176_400,
            4,
            16,
            Vec::new(),
        )
        .unwrap();
        let source = MemoryReader::new(format, payload(64));
        let dropped = Rc::clone(&source.dropped);
        let mut out = Cursor::new(Vec::new());

        let err = ContainerStreamPipeline::default()
            .convert(source, |format| StreamedWavWriter::new(&mut out, format))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatMismatch);
        assert!(dropped.get());
        assert!(out.get_ref().is_empty());
    }

    #[test]
    fn test_write_failure_keeps_primary_error() {
        let source = MemoryReader::new(pcm16_stereo(), payload(10_000));
        let dropped = Rc::clone(&source.dropped);
        let finalize_calls = Rc::new(Cell::new(0));
        let calls = Rc::clone(&finalize_calls);

        let err = ContainerStreamPipeline::default()
            .convert(source, move |format| {
                Ok(FailingWriter {
                    format: format.clone(),
                    written: 0,
                    limit: 5000,
                    finalize_calls: calls,
                })
            })
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert!(err.to_string().contains("disk full"), "{}", err);
        assert_eq!(finalize_calls.get(), 1);
        assert!(dropped.get());
    }

    #[test]
    fn test_read_failure_finalizes_destination() {
        let mut source = MemoryReader::new(pcm16_stereo(), payload(9000));
        source.fail_at = Some(4096);
        let mut out = Cursor::new(Vec::new());

        let err = ContainerStreamPipeline::default()
            .convert(source, |format| StreamedWavWriter::new(&mut out, format))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoFailure);

        // Partial output is still a well-formed WAVE stream
        out.set_position(0);
        let reader = StreamedWavReader::new(out).unwrap();
        assert_eq!(reader.payload_len(), 4096);
    }
}
