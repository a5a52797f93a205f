//! Streaming WAV file writer.
//!
//! `StreamedWavWriter` writes the RIFF header on construction from a
//! [`FormatDescriptor`] and then appends payload bytes as they arrive, so a
//! file of any length can be produced from fixed-size buffers.

use std::{
    fs::File,
    io::{BufWriter, Seek, SeekFrom, Write},
    path::Path,
};

use crate::{
    chunks::{CHUNK_HEADER_LEN, DATA_CHUNK, FACT_CHUNK, FMT_CHUNK, RIFF_CHUNK, WAVE_CHUNK},
    descriptor::{CodecTag, FormatDescriptor},
    error::AudioIOResult,
    traits::ContainerWriter,
    wav::{error::WavError, fmt::FmtChunk},
};

/// A streaming WAV file writer.
///
/// Layout produced:
///
/// ```text
/// RIFF <size> WAVE
/// fmt  <len>  <FormatDescriptor::to_fmt_bytes()> [pad]
/// fact 4      <sample frames>        (non-PCM formats only)
/// data <size> <payload> [pad]
/// ```
///
/// # Finalization
///
/// The RIFF, `data` and `fact` fields hold placeholders until
/// [`finalize()`](ContainerWriter::finalize) back-patches them:
///
/// ```no_run
/// use audio_container_io::descriptor::FormatDescriptor;
/// use audio_container_io::traits::ContainerWriter;
/// use audio_container_io::wav::StreamedWavWriter;
///
/// let format = FormatDescriptor::new_pcm(44_100, 2, 16)?;
/// let mut writer = StreamedWavWriter::create("output.wav", &format)?;
/// writer.write_payload(&[0u8; 4096])?;
/// writer.finalize()?; // Updates headers with final sizes
/// # Ok::<(), audio_container_io::AudioIOError>(())
/// ```
#[derive(Debug)]
pub struct StreamedWavWriter<W: Write + Seek> {
    /// The underlying writer
    writer: W,
    /// Format the header was written for
    format: FormatDescriptor,
    /// Total bytes of payload written (excluding padding)
    data_bytes_written: u64,
    /// Offset of the `RIFF` identifier
    riff_offset: u64,
    /// Offset where RIFF size field is located (for backpatching)
    riff_size_offset: u64,
    /// Offset of the `fact` sample count, when the format has one
    fact_frames_offset: Option<u64>,
    /// Offset where data chunk size field is located (for backpatching)
    data_size_offset: u64,
    /// Largest payload the RIFF size field can still describe
    max_payload: u64,
    /// Whether finalize() has been called
    finalized: bool,
}

impl StreamedWavWriter<BufWriter<File>> {
    /// Create (or truncate) the file at `path` and write the header for `format`.
    ///
    /// The file is not touched when `format` is unrepresentable.
    pub fn create<P: AsRef<Path>>(path: P, format: &FormatDescriptor) -> AudioIOResult<Self> {
        Self::check_representable(format)?;
        let file = File::create(path.as_ref())?;
        Self::new(BufWriter::new(file), format)
    }
}

impl<W: Write + Seek> StreamedWavWriter<W> {
    /// Write the WAV header for `format` and return a writer ready for payload.
    ///
    /// # Errors
    ///
    /// `FormatMismatch` if WAVE cannot represent `format` (unknown codec tag,
    /// inconsistent block fields, truncated extensible header). Nothing is
    /// written in that case.
    pub fn new(mut writer: W, format: &FormatDescriptor) -> AudioIOResult<Self> {
        Self::check_representable(format)?;

        let fmt_bytes = format.to_fmt_bytes();
        let fmt_len = fmt_bytes.len() as u64;

        // Write RIFF header with placeholder size
        let riff_offset = writer.stream_position()?;
        writer.write_all(RIFF_CHUNK.as_bytes())?;
        let riff_size_offset = writer.stream_position()?;
        writer.write_all(&0u32.to_le_bytes())?; // Placeholder - will be updated in finalize()
        writer.write_all(WAVE_CHUNK.as_bytes())?;

        // FMT chunk
        writer.write_all(FMT_CHUNK.as_bytes())?;
        writer.write_all(&(fmt_len as u32).to_le_bytes())?;
        writer.write_all(&fmt_bytes)?;
        if fmt_len % 2 == 1 {
            writer.write_all(&[0])?;
        }

        // FACT chunk for anything that is not plain PCM
        let fact_frames_offset = if Self::needs_fact_chunk(format) {
            writer.write_all(FACT_CHUNK.as_bytes())?;
            writer.write_all(&4u32.to_le_bytes())?;
            let offset = writer.stream_position()?;
            writer.write_all(&0u32.to_le_bytes())?;
            Some(offset)
        } else {
            None
        };

        // DATA chunk header with placeholder size
        writer.write_all(DATA_CHUNK.as_bytes())?;
        let data_size_offset = writer.stream_position()?;
        writer.write_all(&0u32.to_le_bytes())?;

        let data_start = writer.stream_position()?;
        let header_len = data_start - riff_offset - CHUNK_HEADER_LEN;
        // One byte kept back for the pad of an odd payload
        let max_payload = u32::MAX as u64 - header_len - 1;

        tracing::debug!(format = %format, header_len, "wrote WAV header");

        Ok(StreamedWavWriter {
            writer,
            format: format.clone(),
            data_bytes_written: 0,
            riff_offset,
            riff_size_offset,
            fact_frames_offset,
            data_size_offset,
            max_payload,
            finalized: false,
        })
    }

    fn check_representable(format: &FormatDescriptor) -> Result<(), WavError> {
        if let CodecTag::Unknown(code) = format.codec_tag() {
            return Err(WavError::unrepresentable(format!(
                "format tag 0x{:04X} has no WAVE encoding",
                code
            )));
        }
        let fmt_bytes = format.to_fmt_bytes();
        FmtChunk::from_bytes_validated(&fmt_bytes)
            .map_err(|e| WavError::unrepresentable(e.to_string()))?;
        match format.extended_info() {
            Some(info) if info.is_standard_wav_subformat() => match info.sub_format_code() {
                CodecTag::Unknown(code) => Err(WavError::unrepresentable(format!(
                    "extensible sub-format 0x{:04X} has no WAVE encoding",
                    code
                ))),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }

    fn needs_fact_chunk(format: &FormatDescriptor) -> bool {
        !format.effective_codec().is_pcm()
    }

    /// Get a reference to the underlying writer.
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Sample frames described by the payload written so far.
    pub fn frames_written(&self) -> u64 {
        self.format.frames_in_payload(self.data_bytes_written)
    }
}

impl<W: Write + Seek> ContainerWriter for StreamedWavWriter<W> {
    fn format(&self) -> &FormatDescriptor {
        &self.format
    }

    fn write_payload(&mut self, bytes: &[u8]) -> AudioIOResult<()> {
        if self.finalized {
            return Err(WavError::WriteAfterFinalize.into());
        }

        let new_total = self.data_bytes_written + bytes.len() as u64;
        if new_total > self.max_payload {
            return Err(WavError::FileTooLarge(new_total).into());
        }

        self.writer.write_all(bytes)?;
        self.data_bytes_written = new_total;
        Ok(())
    }

    fn flush(&mut self) -> AudioIOResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn finalize(&mut self) -> AudioIOResult<()> {
        if self.finalized {
            return Ok(()); // Already finalized, idempotent
        }
        // A failed finalize is not retried
        self.finalized = true;

        // Add padding byte if data size is odd
        if self.data_bytes_written % 2 == 1 {
            self.writer.write_all(&[0])?;
        }

        let end_pos = self.writer.stream_position()?;
        let riff_size = end_pos - self.riff_offset - CHUNK_HEADER_LEN;
        let riff_size = u32::try_from(riff_size).map_err(|_| WavError::FileTooLarge(riff_size))?;
        // Bounded by max_payload in write_payload
        let data_size = self.data_bytes_written as u32;

        // Backpatch RIFF size
        self.writer.seek(SeekFrom::Start(self.riff_size_offset))?;
        self.writer.write_all(&riff_size.to_le_bytes())?;

        // Backpatch fact sample count
        if let Some(offset) = self.fact_frames_offset {
            let frames = self.format.frames_in_payload(self.data_bytes_written);
            let frames = u32::try_from(frames).unwrap_or(u32::MAX);
            self.writer.seek(SeekFrom::Start(offset))?;
            self.writer.write_all(&frames.to_le_bytes())?;
        }

        // Backpatch data size
        self.writer.seek(SeekFrom::Start(self.data_size_offset))?;
        self.writer.write_all(&data_size.to_le_bytes())?;

        // Restore position and flush
        self.writer.seek(SeekFrom::Start(end_pos))?;
        self.writer.flush()?;

        tracing::debug!(
            payload_bytes = self.data_bytes_written,
            riff_size,
            "finalized WAV stream"
        );
        Ok(())
    }

    fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn payload_bytes_written(&self) -> u64 {
        self.data_bytes_written
    }
}

/// Drop implementation to warn if not finalized.
///
/// Finalizing here could fail with nowhere to report the error, so the
/// writer only logs. The file keeps its placeholder sizes.
impl<W: Write + Seek> Drop for StreamedWavWriter<W> {
    fn drop(&mut self) {
        if !self.finalized {
            tracing::warn!(
                payload_bytes = self.data_bytes_written,
                "StreamedWavWriter dropped without calling finalize(); the output has invalid headers"
            );
        }
    }
}
