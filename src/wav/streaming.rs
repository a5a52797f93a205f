//! Streaming WAV file reader.
//!
//! `StreamedWavReader` parses the RIFF header on construction, locating the
//! `fmt ` and `data` chunks by seeking, then serves the `data` payload
//! on demand without buffering it.

use std::{
    fs::File,
    io::{self, BufReader, SeekFrom},
    path::Path,
};

use crate::{
    ReadSeek,
    chunks::{
        ChunkDesc, ChunkID, DATA_CHUNK, FMT_CHUNK, RIFF_CHUNK, SizeOrder, WAVE_CHUNK,
        read_chunk_header, read_exact_at,
    },
    descriptor::FormatDescriptor,
    error::{AudioIOError, AudioIOResult, ErrorPosition},
    traits::ContainerReader,
};

/// Upper bound for a `fmt ` body: base fields, cbSize and a full u16 extension
const MAX_FMT_LEN: u64 = 18 + u16::MAX as u64;

/// A streaming WAV file reader that reads payload bytes on demand.
///
/// # Example
///
/// ```no_run
/// use audio_container_io::traits::ContainerReader;
/// use audio_container_io::wav::StreamedWavReader;
///
/// let mut streamed = StreamedWavReader::open("audio.wav")?;
/// println!("{}", streamed.format());
/// let mut buffer = [0u8; 4096];
/// while streamed.read_payload(&mut buffer)? > 0 {
///     // Process buffer...
/// }
/// # Ok::<(), audio_container_io::AudioIOError>(())
/// ```
#[derive(Debug)]
pub struct StreamedWavReader<R: ReadSeek> {
    /// The underlying reader
    reader: R,
    /// Discovered chunks (for metadata)
    chunks: Vec<ChunkDesc>,
    /// Parsed `fmt ` chunk
    format: FormatDescriptor,
    /// Location of the `data` chunk
    data: ChunkDesc,
    /// Payload bytes already returned
    position: u64,
}

impl StreamedWavReader<BufReader<File>> {
    /// Open the WAV file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> AudioIOResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file))
    }
}

impl<R: ReadSeek> StreamedWavReader<R> {
    /// Create a new streaming WAV reader from any `Read + Seek` source.
    ///
    /// Parses the RIFF header and the `fmt ` chunk, locates the `data` chunk,
    /// and leaves the stream positioned at the first payload byte. Unknown
    /// chunks (`LIST`, `fact`, ...) are skipped.
    ///
    /// # Errors
    ///
    /// `MalformedMessage` if the source is not a RIFF/WAVE stream, if `fmt `
    /// or `data` is missing, or if the `fmt ` chunk is inconsistent.
    pub fn new(mut reader: R) -> AudioIOResult<Self> {
        let start = reader.stream_position()?;

        let mut riff_header = [0u8; 12];
        read_exact_at(&mut reader, &mut riff_header, start, "RIFF header")?;
        let riff = ChunkID::new(&[riff_header[0], riff_header[1], riff_header[2], riff_header[3]]);
        if riff != RIFF_CHUNK {
            return Err(AudioIOError::malformed(
                "Data does not start with RIFF header",
                format!("Found: {}", riff),
                ErrorPosition::new(start as usize).with_description("RIFF header at file start"),
            ));
        }
        let wave = ChunkID::new(&[riff_header[8], riff_header[9], riff_header[10], riff_header[11]]);
        if wave != WAVE_CHUNK {
            return Err(AudioIOError::malformed(
                "Data does not contain WAVE identifier",
                format!("Found: {}", wave),
                ErrorPosition::new(start as usize + 8).with_description("WAVE identifier"),
            ));
        }
        let riff_size =
            u32::from_le_bytes([riff_header[4], riff_header[5], riff_header[6], riff_header[7]]);

        let mut chunks = vec![ChunkDesc::new(riff, start, riff_size as u64, true)];
        let mut format: Option<FormatDescriptor> = None;
        let mut data: Option<ChunkDesc> = None;
        let mut offset = start + 12;

        while format.is_none() || data.is_none() {
            let Some(desc) = read_chunk_header(&mut reader, offset, SizeOrder::LittleEndian)? else {
                break;
            };
            tracing::trace!(chunk = %desc, "found WAV chunk");

            if desc.id == FMT_CHUNK {
                if desc.logical_size > MAX_FMT_LEN {
                    return Err(AudioIOError::malformed(
                        "Oversized fmt chunk",
                        format!("{} bytes", desc.logical_size),
                        ErrorPosition::new(offset as usize),
                    ));
                }
                let mut body = vec![0u8; desc.logical_size as usize];
                read_exact_at(&mut reader, &mut body, desc.data_start(), "fmt chunk")?;
                format = Some(FormatDescriptor::from_fmt_bytes(&body)?);
            } else if desc.id == DATA_CHUNK {
                data = Some(desc.clone());
            }

            offset = desc.end();
            chunks.push(desc);
            reader.seek(SeekFrom::Start(offset))?;
        }

        let found = || {
            chunks
                .iter()
                .map(|c| c.id.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let format = format.ok_or_else(|| {
            AudioIOError::malformed(
                "FMT chunk not found in WAV file",
                format!("Found chunks: {}", found()),
                ErrorPosition::new(start as usize + 12),
            )
        })?;
        let data = data.ok_or_else(|| {
            AudioIOError::malformed(
                "DATA chunk not found in WAV file",
                format!("Found chunks: {}", found()),
                ErrorPosition::new(start as usize + 12),
            )
        })?;

        reader.seek(SeekFrom::Start(data.data_start()))?;
        tracing::debug!(format = %format, payload_len = data.logical_size, "opened WAV stream");

        Ok(StreamedWavReader {
            reader,
            chunks,
            format,
            data,
            position: 0,
        })
    }

    /// Chunks discovered while scanning the header, in stream order.
    pub fn chunks(&self) -> &[ChunkDesc] {
        &self.chunks
    }

    /// Location of the `data` chunk
    pub const fn data_chunk(&self) -> &ChunkDesc {
        &self.data
    }

    /// Reset to the beginning of the payload.
    pub fn reset(&mut self) -> AudioIOResult<()> {
        self.reader.seek(SeekFrom::Start(self.data.data_start()))?;
        self.position = 0;
        Ok(())
    }
}

impl<R: ReadSeek> ContainerReader for StreamedWavReader<R> {
    fn format(&self) -> &FormatDescriptor {
        &self.format
    }

    fn read_payload(&mut self, buf: &mut [u8]) -> AudioIOResult<usize> {
        let remaining = self.data.logical_size - self.position;
        let want = (buf.len() as u64).min(remaining) as usize;
        if want == 0 {
            return Ok(0);
        }

        let n = loop {
            match self.reader.read(&mut buf[..want]) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        if n == 0 {
            return Err(AudioIOError::malformed(
                "WAV data chunk is shorter than declared",
                format!(
                    "declared {} bytes, stream ended after {}",
                    self.data.logical_size, self.position
                ),
                ErrorPosition::new((self.data.data_start() + self.position) as usize),
            ));
        }

        self.position += n as u64;
        Ok(n)
    }

    fn payload_len(&self) -> u64 {
        self.data.logical_size
    }

    fn payload_position(&self) -> u64 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        descriptor::CodecTag, error::ErrorKind, traits::ContainerWriter, wav::StreamedWavWriter,
    };
    use std::io::Cursor;

    fn write_wav(format: &FormatDescriptor, payload: &[u8]) -> Vec<u8> {
        let mut buffer = Vec::new();
        {
            let mut writer = StreamedWavWriter::new(Cursor::new(&mut buffer), format).unwrap();
            writer.write_payload(payload).unwrap();
            writer.finalize().unwrap();
        }
        buffer
    }

    fn read_all<R: ReadSeek>(reader: &mut StreamedWavReader<R>, chunk: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; chunk];
        loop {
            let n = reader.read_payload(&mut buf).unwrap();
            if n == 0 {
                return out;
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    #[test]
    fn test_reads_back_written_stream() {
        let format = FormatDescriptor::new_ima_adpcm(44_100, 2, 4).unwrap();
        let payload: Vec<u8> = (0..1500u32).map(|i| (i % 251) as u8).collect();
        let bytes = write_wav(&format, &payload);

        let mut reader = StreamedWavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.format(), &format);
        assert_eq!(reader.payload_len(), 1500);
        assert_eq!(read_all(&mut reader, 333), payload);
        assert_eq!(reader.remaining_payload(), 0);

        let ids: Vec<String> = reader.chunks().iter().map(|c| c.id.to_string()).collect();
        assert_eq!(ids, ["RIFF", "fmt ", "fact", "data"]);
    }

    #[test]
    fn test_reads_hound_output() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in [-3i16, 0, 7, 1000] {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.set_position(0);

        let mut reader = StreamedWavReader::new(cursor).unwrap();
        assert_eq!(reader.format().codec_tag(), CodecTag::Pcm);
        assert_eq!(reader.format().sample_rate(), 8_000);
        let bytes = read_all(&mut reader, 4096);
        let expected: Vec<u8> = [-3i16, 0, 7, 1000]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_skips_unknown_chunks_and_reset() {
        let format = FormatDescriptor::new_pcm(22_050, 1, 8).unwrap();
        let fmt = format.to_fmt_bytes();
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(4 + 8 + 16 + 8 + 3 + 1 + 8 + 2u32).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&fmt);
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&3u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 0]);
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[0x10, 0x20]);

        let mut reader = StreamedWavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(read_all(&mut reader, 1), [0x10, 0x20]);
        reader.reset().unwrap();
        assert_eq!(reader.payload_position(), 0);
        assert_eq!(read_all(&mut reader, 16), [0x10, 0x20]);
    }

    #[test]
    fn test_truncated_data_is_malformed() {
        let format = FormatDescriptor::new_pcm(44_100, 2, 16).unwrap();
        let mut bytes = write_wav(&format, &[0u8; 64]);
        bytes.truncate(44 + 10);

        let mut reader = StreamedWavReader::new(Cursor::new(bytes)).unwrap();
        let mut buf = [0u8; 64];
        assert_eq!(reader.read_payload(&mut buf).unwrap(), 10);
        let err = reader.read_payload(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMessage);
    }

    #[test]
    fn test_rejects_non_wave_input() {
        let err = StreamedWavReader::new(Cursor::new(b"FORM\0\0\0\x04AIFF".to_vec())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMessage);

        let err = StreamedWavReader::new(Cursor::new(b"RIF".to_vec())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMessage);
    }

    #[test]
    fn test_missing_data_chunk() {
        let format = FormatDescriptor::new_pcm(44_100, 1, 16).unwrap();
        let mut bytes = write_wav(&format, &[]);
        bytes.truncate(36);
        let err = StreamedWavReader::new(Cursor::new(bytes)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMessage);
        assert!(err.to_string().contains("DATA chunk not found"));
    }
}
