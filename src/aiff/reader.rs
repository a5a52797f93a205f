//! Streaming AIFF / AIFF-C reader.
//!
//! The reader locates `COMM` and `SSND` (in either order), builds a
//! [`FormatDescriptor`] for the WAVE equivalent of the stored samples and
//! serves the sound data already converted to WAVE byte layout.

use std::{
    fs::File,
    io::{BufReader, SeekFrom},
    path::Path,
};

use crate::{
    ReadSeek,
    aiff::{error::AiffError, extended::sample_rate_from_extended},
    chunks::{
        AIFC_FORM_TYPE, AIFF_FORM_TYPE, COMM_CHUNK, ChunkDesc, ChunkID, FORM_CHUNK, SSND_CHUNK,
        SizeOrder, read_chunk_header, read_exact_at,
    },
    descriptor::{CodecTag, FormatDescriptor},
    error::{AudioIOError, AudioIOResult, ErrorPosition},
    traits::ContainerReader,
};

/// Size of the classic AIFF `COMM` body
const COMM_LEN: u64 = 18;
/// Size of an AIFF-C `COMM` body up to and including the compression type
const COMM_AIFC_LEN: u64 = 22;
/// `offset` and `blockSize` fields at the start of `SSND`
const SSND_HEADER_LEN: u64 = 8;

/// AIFF-C compression types this reader understands
pub mod compression {
    use crate::chunks::ChunkID;

    pub const NONE: ChunkID = ChunkID::new(b"NONE");
    pub const TWOS: ChunkID = ChunkID::new(b"twos");
    pub const SOWT: ChunkID = ChunkID::new(b"sowt");
    pub const RAW: ChunkID = ChunkID::new(b"raw ");
    pub const FL32: ChunkID = ChunkID::new(b"fl32");
    pub const FL32_UPPER: ChunkID = ChunkID::new(b"FL32");
    pub const FL64: ChunkID = ChunkID::new(b"fl64");
    pub const FL64_UPPER: ChunkID = ChunkID::new(b"FL64");
    pub const ALAW: ChunkID = ChunkID::new(b"alaw");
    pub const ALAW_UPPER: ChunkID = ChunkID::new(b"ALAW");
    pub const ULAW: ChunkID = ChunkID::new(b"ulaw");
    pub const ULAW_UPPER: ChunkID = ChunkID::new(b"ULAW");
}

/// How stored bytes become WAVE bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleLayout {
    /// Already in WAVE layout
    Passthrough,
    /// Big-endian samples of the given width, reversed per sample
    SwapBytes(usize),
    /// Signed 8-bit samples, offset to unsigned
    SignedToUnsigned8,
}

impl SampleLayout {
    /// Bytes that must be transformed together
    const fn width(self) -> usize {
        match self {
            SampleLayout::SwapBytes(width) => width,
            SampleLayout::Passthrough | SampleLayout::SignedToUnsigned8 => 1,
        }
    }

    fn apply(self, bytes: &mut [u8]) {
        match self {
            SampleLayout::Passthrough | SampleLayout::SwapBytes(0 | 1) => {}
            SampleLayout::SwapBytes(width) => {
                for sample in bytes.chunks_exact_mut(width) {
                    sample.reverse();
                }
            }
            SampleLayout::SignedToUnsigned8 => {
                for b in bytes.iter_mut() {
                    *b ^= 0x80;
                }
            }
        }
    }
}

/// Parsed `COMM` chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonChunk {
    pub channels: u16,
    pub num_sample_frames: u32,
    pub sample_size: u16,
    pub sample_rate: u32,
    /// AIFF-C compression type; `None` for classic AIFF
    pub compression: Option<ChunkID>,
}

impl CommonChunk {
    /// Parse a `COMM` body. `is_aifc` selects whether the compression type is required.
    pub fn from_bytes(body: &[u8], is_aifc: bool) -> Result<Self, AiffError> {
        let needed = if is_aifc { COMM_AIFC_LEN } else { COMM_LEN } as usize;
        if body.len() < needed {
            return Err(AiffError::invalid_comm(format!(
                "{} bytes, need at least {}",
                body.len(),
                needed
            )));
        }

        let channels = u16::from_be_bytes([body[0], body[1]]);
        let num_sample_frames = u32::from_be_bytes([body[2], body[3], body[4], body[5]]);
        let sample_size = u16::from_be_bytes([body[6], body[7]]);
        let mut rate = [0u8; 10];
        rate.copy_from_slice(&body[8..18]);
        let sample_rate = sample_rate_from_extended(&rate)?;
        let compression = is_aifc.then(|| ChunkID::new(&[body[18], body[19], body[20], body[21]]));

        if channels == 0 {
            return Err(AiffError::invalid_comm("channel count is zero"));
        }
        if sample_size == 0 || sample_size > 64 {
            return Err(AiffError::invalid_comm(format!(
                "sample size {} is outside 1..=64 bits",
                sample_size
            )));
        }

        Ok(CommonChunk {
            channels,
            num_sample_frames,
            sample_size,
            sample_rate,
            compression,
        })
    }

    /// Bytes per stored sample: the sample size rounded up to whole bytes.
    pub const fn container_bytes(&self) -> u16 {
        self.sample_size.div_ceil(8)
    }

    /// WAVE descriptor and byte transform for this chunk.
    pub fn to_wave_format(&self) -> AudioIOResult<(FormatDescriptor, SampleLayout)> {
        use compression::*;

        let bytes = self.container_bytes();
        let bits = bytes * 8;
        let (rate, ch) = (self.sample_rate, self.channels);
        let pcm_layout = |little_endian: bool| match bytes {
            1 => SampleLayout::SignedToUnsigned8,
            _ if little_endian => SampleLayout::Passthrough,
            n => SampleLayout::SwapBytes(n as usize),
        };

        let converted = match self.compression.unwrap_or(NONE) {
            c if c == NONE || c == TWOS => {
                (FormatDescriptor::new_pcm(rate, ch, bits)?, pcm_layout(false))
            }
            c if c == SOWT => (FormatDescriptor::new_pcm(rate, ch, bits)?, pcm_layout(true)),
            c if c == RAW && bytes == 1 => {
                (FormatDescriptor::new_pcm(rate, ch, 8)?, SampleLayout::Passthrough)
            }
            c if c == FL32 || c == FL32_UPPER => (
                FormatDescriptor::new_ieee_float(rate, ch, 32)?,
                SampleLayout::SwapBytes(4),
            ),
            c if c == FL64 || c == FL64_UPPER => (
                FormatDescriptor::new_ieee_float(rate, ch, 64)?,
                SampleLayout::SwapBytes(8),
            ),
            c if c == ALAW || c == ALAW_UPPER => {
                (FormatDescriptor::new_alaw(rate, ch)?, SampleLayout::Passthrough)
            }
            c if c == ULAW || c == ULAW_UPPER => {
                (FormatDescriptor::new_mulaw(rate, ch)?, SampleLayout::Passthrough)
            }
            other => {
                tracing::debug!(compression = %other, "unrecognised AIFF-C compression");
                let block_align = ch.saturating_mul(bytes);
                let descriptor = FormatDescriptor::from_raw_parts(
                    CodecTag::Unknown(0),
                    ch,
                    rate,
                    rate.saturating_mul(block_align as u32),
                    block_align,
                    self.sample_size,
                    Vec::new(),
                )?;
                (descriptor, SampleLayout::Passthrough)
            }
        };
        Ok(converted)
    }
}

/// A streaming AIFF / AIFF-C reader yielding WAVE-layout payload bytes.
#[derive(Debug)]
pub struct StreamedAiffReader<R: ReadSeek> {
    reader: R,
    chunks: Vec<ChunkDesc>,
    form_type: ChunkID,
    common: CommonChunk,
    format: FormatDescriptor,
    layout: SampleLayout,
    /// Absolute offset of the first sound byte
    payload_start: u64,
    payload_len: u64,
    /// Payload bytes already delivered
    position: u64,
    /// Converted bytes of a split sample not yet delivered
    pending: Vec<u8>,
}

impl StreamedAiffReader<BufReader<File>> {
    /// Open the AIFF or AIFF-C file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> AudioIOResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file))
    }
}

impl<R: ReadSeek> StreamedAiffReader<R> {
    /// Parse the FORM header, `COMM` and `SSND`, leaving the stream at the
    /// first sound byte.
    ///
    /// # Errors
    ///
    /// `MalformedMessage` for anything that is not a well-formed AIFF/AIFF-C
    /// stream: wrong magic, missing or short `COMM`/`SSND`, a bad sample rate.
    pub fn new(mut reader: R) -> AudioIOResult<Self> {
        let start = reader.stream_position()?;

        let mut form_header = [0u8; 12];
        read_exact_at(&mut reader, &mut form_header, start, "FORM header")?;
        let form = ChunkID::new(&[form_header[0], form_header[1], form_header[2], form_header[3]]);
        let form_type =
            ChunkID::new(&[form_header[8], form_header[9], form_header[10], form_header[11]]);
        if form != FORM_CHUNK {
            return Err(AiffError::NotAiff(format!("stream starts with {}", form)).into());
        }
        if form_type != AIFF_FORM_TYPE && form_type != AIFC_FORM_TYPE {
            return Err(AiffError::NotAiff(format!("FORM type is {}", form_type)).into());
        }
        let is_aifc = form_type == AIFC_FORM_TYPE;
        let form_size =
            u32::from_be_bytes([form_header[4], form_header[5], form_header[6], form_header[7]]);

        let mut chunks = vec![ChunkDesc::new(form, start, form_size as u64, true)];
        let mut common: Option<CommonChunk> = None;
        let mut sound: Option<(ChunkDesc, u64)> = None;
        let mut offset = start + 12;

        while common.is_none() || sound.is_none() {
            let Some(desc) = read_chunk_header(&mut reader, offset, SizeOrder::BigEndian)? else {
                break;
            };
            tracing::trace!(chunk = %desc, "found AIFF chunk");

            if desc.id == COMM_CHUNK {
                let len = desc.logical_size.min(COMM_AIFC_LEN) as usize;
                let mut body = vec![0u8; len];
                read_exact_at(&mut reader, &mut body, desc.data_start(), "COMM chunk")?;
                common = Some(CommonChunk::from_bytes(&body, is_aifc)?);
            } else if desc.id == SSND_CHUNK {
                let mut header = [0u8; SSND_HEADER_LEN as usize];
                if desc.logical_size < SSND_HEADER_LEN {
                    return Err(AiffError::invalid_sound_data(format!(
                        "{} bytes, need at least {}",
                        desc.logical_size, SSND_HEADER_LEN
                    ))
                    .into());
                }
                read_exact_at(&mut reader, &mut header, desc.data_start(), "SSND header")?;
                let data_offset = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
                if SSND_HEADER_LEN + data_offset as u64 > desc.logical_size {
                    return Err(AiffError::invalid_sound_data(format!(
                        "data offset {} lies beyond the {}-byte chunk",
                        data_offset, desc.logical_size
                    ))
                    .into());
                }
                sound = Some((desc.clone(), data_offset as u64));
            }

            offset = desc.end();
            chunks.push(desc);
            reader.seek(SeekFrom::Start(offset))?;
        }

        let common = common.ok_or(AiffError::MissingChunk("COMM"))?;
        let (ssnd, data_offset) = sound.ok_or(AiffError::MissingChunk("SSND"))?;
        let (format, layout) = common.to_wave_format()?;

        let payload_start = ssnd.data_start() + SSND_HEADER_LEN + data_offset;
        let stored = ssnd.logical_size - SSND_HEADER_LEN - data_offset;
        let payload_len = if format.codec_tag() == CodecTag::Unknown(0) {
            stored
        } else {
            // numSampleFrames is authoritative; SSND may carry trailing bytes
            let declared = common.num_sample_frames as u64 * format.block_align() as u64;
            let len = stored.min(declared);
            len - len % format.block_align() as u64
        };

        reader.seek(SeekFrom::Start(payload_start))?;
        tracing::debug!(
            form_type = %form_type,
            format = %format,
            payload_len,
            "opened AIFF stream"
        );

        Ok(StreamedAiffReader {
            reader,
            chunks,
            form_type,
            common,
            format,
            layout,
            payload_start,
            payload_len,
            position: 0,
            pending: Vec::new(),
        })
    }

    /// `AIFF` or `AIFC`
    pub const fn form_type(&self) -> ChunkID {
        self.form_type
    }

    pub const fn common(&self) -> &CommonChunk {
        &self.common
    }

    pub const fn sample_layout(&self) -> SampleLayout {
        self.layout
    }

    pub fn chunks(&self) -> &[ChunkDesc] {
        &self.chunks
    }

    /// Reset to the beginning of the sound data.
    pub fn reset(&mut self) -> AudioIOResult<()> {
        self.reader.seek(SeekFrom::Start(self.payload_start))?;
        self.position = 0;
        self.pending.clear();
        Ok(())
    }

    fn read_stored(&mut self, buf: &mut [u8]) -> AudioIOResult<()> {
        let offset = self.payload_start + self.position;
        read_exact_at(&mut self.reader, buf, offset, "SSND sound data").map_err(|e| match e {
            AudioIOError::Malformed { .. } => AudioIOError::malformed(
                "AIFF sound data is shorter than declared",
                format!(
                    "declared {} bytes, stream ended after {}",
                    self.payload_len, self.position
                ),
                ErrorPosition::new(offset as usize),
            ),
            other => other,
        })
    }
}

impl<R: ReadSeek> ContainerReader for StreamedAiffReader<R> {
    fn format(&self) -> &FormatDescriptor {
        &self.format
    }

    fn read_payload(&mut self, buf: &mut [u8]) -> AudioIOResult<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if !self.pending.is_empty() {
            let n = buf.len().min(self.pending.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            self.position += n as u64;
            return Ok(n);
        }

        let remaining = self.payload_len - self.position;
        if remaining == 0 {
            return Ok(0);
        }

        let width = self.layout.width();
        if buf.len() >= width {
            let whole = (buf.len() - buf.len() % width) as u64;
            let want = whole.min(remaining) as usize;
            self.read_stored(&mut buf[..want])?;
            self.layout.apply(&mut buf[..want]);
            self.position += want as u64;
            return Ok(want);
        }

        // Caller asked for less than one sample
        let mut sample = vec![0u8; width];
        self.read_stored(&mut sample)?;
        self.layout.apply(&mut sample);
        let n = buf.len();
        buf.copy_from_slice(&sample[..n]);
        self.pending.extend_from_slice(&sample[n..]);
        self.position += n as u64;
        Ok(n)
    }

    fn payload_len(&self) -> u64 {
        self.payload_len
    }

    fn payload_position(&self) -> u64 {
        self.position
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::aiff::extended::u32_to_extended;

    /// Build an AIFF / AIFF-C byte stream.
    pub fn build_aiff(
        channels: u16,
        sample_size: u16,
        sample_rate: u32,
        compression: Option<&[u8; 4]>,
        sound: &[u8],
    ) -> Vec<u8> {
        let frame_bytes = channels as usize * sample_size.div_ceil(8) as usize;
        let frames = (sound.len() / frame_bytes.max(1)) as u32;

        let mut comm = Vec::new();
        comm.extend_from_slice(&channels.to_be_bytes());
        comm.extend_from_slice(&frames.to_be_bytes());
        comm.extend_from_slice(&sample_size.to_be_bytes());
        comm.extend_from_slice(&u32_to_extended(sample_rate));
        if let Some(c) = compression {
            comm.extend_from_slice(c);
            // empty pascal string, padded
            comm.extend_from_slice(&[0, 0]);
        }

        let mut body = Vec::new();
        body.extend_from_slice(if compression.is_some() { b"AIFC" } else { b"AIFF" });
        body.extend_from_slice(b"COMM");
        body.extend_from_slice(&(comm.len() as u32).to_be_bytes());
        body.extend_from_slice(&comm);
        body.extend_from_slice(b"SSND");
        body.extend_from_slice(&(sound.len() as u32 + 8).to_be_bytes());
        body.extend_from_slice(&[0u8; 8]);
        body.extend_from_slice(sound);
        if sound.len() % 2 == 1 {
            body.push(0);
        }

        let mut out = Vec::new();
        out.extend_from_slice(b"FORM");
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend_from_slice(&body);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::{test_support::build_aiff, *};
    use crate::error::ErrorKind;
    use std::io::Cursor;

    fn read_all<R: ReadSeek>(reader: &mut StreamedAiffReader<R>, chunk: usize) -> Vec<u8> {
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
    fn test_16_bit_samples_are_swapped() {
        let sound = [0x12, 0x34, 0xAB, 0xCD, 0x00, 0x01, 0xFF, 0xFE];
        let bytes = build_aiff(2, 16, 44_100, None, &sound);
        let mut reader = StreamedAiffReader::new(Cursor::new(bytes)).unwrap();

        assert_eq!(reader.form_type(), AIFF_FORM_TYPE);
        assert_eq!(
            reader.format(),
            &FormatDescriptor::new_pcm(44_100, 2, 16).unwrap()
        );
        assert_eq!(reader.payload_len(), 8);
        assert_eq!(
            read_all(&mut reader, 4096),
            [0x34, 0x12, 0xCD, 0xAB, 0x01, 0x00, 0xFE, 0xFF]
        );
    }

    #[test]
    fn test_small_reads_split_samples() {
        let sound = [1, 2, 3, 4, 5, 6];
        let bytes = build_aiff(1, 24, 48_000, None, &sound);
        let mut reader = StreamedAiffReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.sample_layout(), SampleLayout::SwapBytes(3));
        assert_eq!(read_all(&mut reader, 1), [3, 2, 1, 6, 5, 4]);

        reader.reset().unwrap();
        assert_eq!(read_all(&mut reader, 4), [3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn test_8_bit_signed_becomes_unsigned() {
        let sound = [0x00, 0x7F, 0x80, 0xFF, 0x01];
        let bytes = build_aiff(1, 8, 8_000, None, &sound);
        let mut reader = StreamedAiffReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.format().bits_per_sample(), 8);
        assert_eq!(read_all(&mut reader, 4096), [0x80, 0xFF, 0x00, 0x7F, 0x81]);
    }

    #[test]
    fn test_odd_bit_depth_rounds_up() {
        let sound = [0x12, 0x30, 0xAB, 0xC0];
        let bytes = build_aiff(1, 12, 22_050, None, &sound);
        let reader = StreamedAiffReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.format().bits_per_sample(), 16);
        assert_eq!(reader.format().block_align(), 2);
    }

    #[test]
    fn test_aifc_compressions() {
        let sound = [0x3F, 0x80, 0x00, 0x00];

        let bytes = build_aiff(1, 32, 44_100, Some(b"fl32"), &sound);
        let mut reader = StreamedAiffReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.form_type(), AIFC_FORM_TYPE);
        assert_eq!(reader.format().codec_tag(), CodecTag::IeeeFloat);
        assert_eq!(read_all(&mut reader, 64), 1.0f32.to_le_bytes());

        let bytes = build_aiff(1, 16, 44_100, Some(b"sowt"), &sound);
        let mut reader = StreamedAiffReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.format().codec_tag(), CodecTag::Pcm);
        assert_eq!(read_all(&mut reader, 64), sound);

        let bytes = build_aiff(1, 8, 8_000, Some(b"ulaw"), &sound);
        let reader = StreamedAiffReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.format().codec_tag(), CodecTag::MuLaw);

        let bytes = build_aiff(1, 16, 8_000, Some(b"ima4"), &sound);
        let mut reader = StreamedAiffReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.format().codec_tag(), CodecTag::Unknown(0));
        assert_eq!(read_all(&mut reader, 64), sound);
    }

    #[test]
    fn test_chunks_in_any_order_with_extra_chunks() {
        let sound = [0x00, 0x10];
        let canonical = build_aiff(1, 16, 8_000, None, &sound);
        // FORM(12) COMM(8+18) SSND(8+8+2)
        let comm = &canonical[12..38];
        let ssnd = &canonical[38..];

        let mut body = b"AIFF".to_vec();
        body.extend_from_slice(b"NAME");
        body.extend_from_slice(&3u32.to_be_bytes());
        body.extend_from_slice(b"abc\0");
        body.extend_from_slice(ssnd);
        body.extend_from_slice(comm);
        let mut bytes = b"FORM".to_vec();
        bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&body);

        let mut reader = StreamedAiffReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(read_all(&mut reader, 4096), [0x10, 0x00]);
        assert_eq!(reader.chunks().len(), 4);
    }

    #[test]
    fn test_short_sound_data_keeps_whole_frames() {
        // 2.5 stereo frames of sound, COMM claims 3
        let sound = [0x00, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00, 0x05];
        let mut bytes = build_aiff(2, 16, 44_100, None, &sound);
        bytes[22..26].copy_from_slice(&3u32.to_be_bytes());

        let mut reader = StreamedAiffReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.format().block_align(), 4);
        assert_eq!(reader.payload_len(), 8);
        assert_eq!(
            read_all(&mut reader, 3),
            [0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00]
        );
    }

    #[test]
    fn test_truncated_sound_data_is_malformed() {
        let sound = [0u8; 100];
        let mut bytes = build_aiff(1, 16, 8_000, None, &sound);
        bytes.truncate(bytes.len() - 50);
        let mut reader = StreamedAiffReader::new(Cursor::new(bytes)).unwrap();
        let mut buf = [0u8; 4096];
        let err = reader.read_payload(&mut buf).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMessage);
    }

    #[test]
    fn test_rejects_missing_chunks_and_wrong_magic() {
        let err = StreamedAiffReader::new(Cursor::new(b"RIFF\0\0\0\x04WAVE".to_vec())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMessage);

        let mut bytes = build_aiff(1, 16, 8_000, None, &[]);
        bytes.truncate(38);
        let err = StreamedAiffReader::new(Cursor::new(bytes)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMessage);
        assert!(err.to_string().contains("SSND"));
    }
}
