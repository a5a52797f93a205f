use core::fmt::{Display, Formatter, Result as FmtResult};

use crate::{
    descriptor::{AdpcmBlockGeometry, BASE_FMT_LEN, CodecTag, EXTENSIBLE_EXTRA_SIZE, FormatDescriptor},
    error::AudioIOResult,
    wav::error::WavError,
};

/// Borrowed view over the body of a `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FmtChunk<'a> {
    bytes: &'a [u8],
}

impl<'a> FmtChunk<'a> {
    /// Primary constructor for FmtChunk
    ///
    /// # Arguments
    ///
    /// * `bytes` - The FMT chunk body: 16 bytes, or 18 + cbSize bytes
    ///
    /// # Returns
    ///
    /// Ok(FmtChunk) if the layout is complete, Err(WavError) otherwise
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, WavError> {
        if bytes.len() < BASE_FMT_LEN || bytes.len() == BASE_FMT_LEN + 1 {
            return Err(WavError::InvalidFmtChunkSize(bytes.len()));
        }
        let chunk = FmtChunk { bytes };
        let needed = chunk.declared_len();
        if bytes.len() < needed {
            return Err(WavError::chunk_parsing(
                "fmt ",
                format!("byte {}", BASE_FMT_LEN),
                format!(
                    "cbSize declares {} extra bytes but only {} follow",
                    chunk.cb_size(),
                    bytes.len() - BASE_FMT_LEN - 2
                ),
            ));
        }
        Ok(chunk)
    }

    /// Constructor that also runs consistency validation.
    pub fn from_bytes_validated(bytes: &'a [u8]) -> Result<Self, WavError> {
        let fmt_chunk = Self::from_bytes(bytes)?;
        fmt_chunk.validate_format_consistency()?;
        Ok(fmt_chunk)
    }

    /// Get the raw bytes of the FMT chunk
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    const fn u16_at(&self, at: usize) -> u16 {
        u16::from_le_bytes([self.bytes[at], self.bytes[at + 1]])
    }

    const fn u32_at(&self, at: usize) -> u32 {
        u32::from_le_bytes([
            self.bytes[at],
            self.bytes[at + 1],
            self.bytes[at + 2],
            self.bytes[at + 3],
        ])
    }

    pub const fn format_code(&self) -> CodecTag {
        CodecTag::const_from(self.u16_at(0))
    }

    pub const fn channels(&self) -> u16 {
        self.u16_at(2)
    }

    pub const fn sample_rate(&self) -> u32 {
        self.u32_at(4)
    }

    /// Number of bytes per second of audio data
    pub const fn byte_rate(&self) -> u32 {
        self.u32_at(8)
    }

    /// Number of bytes per block (all channels)
    pub const fn block_align(&self) -> u16 {
        self.u16_at(12)
    }

    pub const fn bits_per_sample(&self) -> u16 {
        self.u16_at(14)
    }

    /// cbSize, or 0 for a plain 16-byte chunk
    pub const fn cb_size(&self) -> u16 {
        if self.bytes.len() >= BASE_FMT_LEN + 2 {
            self.u16_at(16)
        } else {
            0
        }
    }

    /// Bytes the chunk needs according to its own cbSize
    const fn declared_len(&self) -> usize {
        if self.bytes.len() >= BASE_FMT_LEN + 2 {
            BASE_FMT_LEN + 2 + self.cb_size() as usize
        } else {
            BASE_FMT_LEN
        }
    }

    /// The codec-specific bytes that follow cbSize
    pub fn extra_bytes(&self) -> &'a [u8] {
        if self.bytes.len() >= BASE_FMT_LEN + 2 {
            &self.bytes[BASE_FMT_LEN + 2..self.declared_len()]
        } else {
            &[]
        }
    }

    /// Convenience method to get all FMT chunk fields as a tuple.
    ///
    /// # Returns
    ///
    /// (CodecTag, u16 channels, u32 sample_rate, u32 byte_rate, u16 block_align, u16 bits_per_sample)
    pub const fn fmt_chunk(&self) -> (CodecTag, u16, u32, u32, u16, u16) {
        (
            self.format_code(),
            self.channels(),
            self.sample_rate(),
            self.byte_rate(),
            self.block_align(),
            self.bits_per_sample(),
        )
    }

    /// Validate the consistency of FMT chunk fields
    ///
    /// Checks that:
    /// - channels, sample rate and block align are non-zero
    /// - linear formats: block_align = channels * bytes_per_sample and
    ///   byte_rate = sample_rate * block_align
    /// - ADPCM formats: the stored samples-per-block matches the block geometry
    /// - EXTENSIBLE carries its full 22-byte extension
    pub fn validate_format_consistency(&self) -> Result<(), WavError> {
        let (code, channels, sample_rate, byte_rate, block_align, bits_per_sample) =
            self.fmt_chunk();

        if channels == 0 {
            return Err(WavError::invalid_format("Channels cannot be zero"));
        }
        if sample_rate == 0 {
            return Err(WavError::invalid_format("Sample rate cannot be zero"));
        }
        if block_align == 0 {
            return Err(WavError::invalid_format("Block align cannot be zero"));
        }

        match code {
            CodecTag::Pcm | CodecTag::IeeeFloat | CodecTag::ALaw | CodecTag::MuLaw => {
                self.validate_linear(channels, sample_rate, byte_rate, block_align, bits_per_sample)
            }
            CodecTag::Extensible => {
                if self.extra_bytes().len() < EXTENSIBLE_EXTRA_SIZE as usize {
                    return Err(WavError::invalid_format(format!(
                        "EXTENSIBLE format needs {} extra bytes, found {}",
                        EXTENSIBLE_EXTRA_SIZE,
                        self.extra_bytes().len()
                    )));
                }
                self.validate_linear(channels, sample_rate, byte_rate, block_align, bits_per_sample)
            }
            CodecTag::ImaAdpcm | CodecTag::MsAdpcm => {
                let geometry = if code == CodecTag::ImaAdpcm {
                    AdpcmBlockGeometry::ima(block_align, channels)
                } else {
                    AdpcmBlockGeometry::microsoft(block_align, channels)
                }
                .map_err(|e| WavError::invalid_format(e.to_string()))?;

                let extra = self.extra_bytes();
                if extra.len() < 2 {
                    return Err(WavError::invalid_format(format!(
                        "{} format is missing its samples-per-block field",
                        code
                    )));
                }
                let stored = u16::from_le_bytes([extra[0], extra[1]]);
                if stored != geometry.samples_per_block() {
                    return Err(WavError::invalid_format(format!(
                        "Samples per block {} does not match expected {} for block align {}",
                        stored,
                        geometry.samples_per_block(),
                        block_align
                    )));
                }
                Ok(())
            }
            // Opaque formats: nothing more we can check
            _ => Ok(()),
        }
    }

    fn validate_linear(
        &self,
        channels: u16,
        sample_rate: u32,
        byte_rate: u32,
        block_align: u16,
        bits_per_sample: u16,
    ) -> Result<(), WavError> {
        if bits_per_sample == 0 || !bits_per_sample.is_multiple_of(8) {
            return Err(WavError::invalid_format(format!(
                "Bits per sample {} is not byte-aligned",
                bits_per_sample
            )));
        }

        let bytes_per_sample = (bits_per_sample / 8) as u32;
        let expected_block_align = channels as u32 * bytes_per_sample;
        if block_align as u32 != expected_block_align {
            return Err(WavError::invalid_format(format!(
                "Block align {} does not match expected {} (channels {} * bytes_per_sample {})",
                block_align, expected_block_align, channels, bytes_per_sample
            )));
        }

        let expected_byte_rate = sample_rate as u64 * block_align as u64;
        if byte_rate as u64 != expected_byte_rate {
            return Err(WavError::invalid_format(format!(
                "Byte rate {} does not match expected {} (sample_rate {} * block_align {})",
                byte_rate, expected_byte_rate, sample_rate, block_align
            )));
        }
        Ok(())
    }

    /// Lift the chunk into an owned descriptor.
    pub fn to_descriptor(&self) -> AudioIOResult<FormatDescriptor> {
        let (code, channels, sample_rate, byte_rate, block_align, bits_per_sample) =
            self.fmt_chunk();
        FormatDescriptor::from_raw_parts(
            code,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            self.extra_bytes().to_vec(),
        )
    }
}

impl FormatDescriptor {
    /// Parse and validate a `fmt ` chunk body.
    pub fn from_fmt_bytes(bytes: &[u8]) -> AudioIOResult<Self> {
        FmtChunk::from_bytes_validated(bytes)?.to_descriptor()
    }
}

impl Display for FmtChunk<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let (format, channels, sample_rate, byte_rate, block_align, bits_per_sample) =
            self.fmt_chunk();
        write!(
            f,
            "FmtChunk {{ format: {}, channels: {}, sample_rate: {}, byte_rate: {}, block_align: {}, bits_per_sample: {}, cb_size: {} }}",
            format,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            self.cb_size()
        )
    }
}
