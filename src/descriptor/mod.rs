//! Wave-format descriptors.
//!
//! A [`FormatDescriptor`] is the container-independent description of how a
//! payload is encoded: codec tag, channel count, sample rate, bit depth, block
//! alignment, average byte rate and codec-specific extra parameters. It is
//! validated once at construction and immutable afterwards. Writers serialize
//! it with [`FormatDescriptor::to_fmt_bytes`]; readers normalize whatever their
//! container stores into one.

pub mod adpcm;
pub mod extensible;

use core::fmt::{Display, Formatter, Result as FmtResult};
use std::io::{self, Write};

pub use adpcm::{AdpcmBlockGeometry, AdpcmVariant};
pub use extensible::{EXTENSIBLE_EXTRA_SIZE, ExtendedFormatInfo, default_channel_mask};

use crate::error::{AudioIOError, AudioIOResult};

/// WAV format codes (wFormatTag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecTag {
    /// PCM (uncompressed)
    Pcm,
    /// Microsoft ADPCM
    MsAdpcm,
    /// IEEE Float
    IeeeFloat,
    /// A-law
    ALaw,
    /// Mu-law
    MuLaw,
    /// IMA / DVI ADPCM
    ImaAdpcm,
    /// WAVE_FORMAT_EXTENSIBLE
    Extensible,
    /// Unknown or unsupported format
    Unknown(u16),
}

impl CodecTag {
    /// Canonical numeric WAV format tag
    pub const fn as_u16(self) -> u16 {
        match self {
            CodecTag::Pcm => 0x0001,
            CodecTag::MsAdpcm => 0x0002,
            CodecTag::IeeeFloat => 0x0003,
            CodecTag::ALaw => 0x0006,
            CodecTag::MuLaw => 0x0007,
            CodecTag::ImaAdpcm => 0x0011,
            CodecTag::Extensible => 0xFFFE,
            CodecTag::Unknown(code) => code,
        }
    }

    pub const fn const_from(code: u16) -> Self {
        match code {
            0x0001 => CodecTag::Pcm,
            0x0002 => CodecTag::MsAdpcm,
            0x0003 => CodecTag::IeeeFloat,
            0x0006 => CodecTag::ALaw,
            0x0007 => CodecTag::MuLaw,
            0x0011 => CodecTag::ImaAdpcm,
            0xFFFE => CodecTag::Extensible,
            other => CodecTag::Unknown(other),
        }
    }

    /// Short symbolic name
    pub const fn as_str(self) -> &'static str {
        match self {
            CodecTag::Pcm => "PCM",
            CodecTag::MsAdpcm => "MS_ADPCM",
            CodecTag::IeeeFloat => "IEEE_FLOAT",
            CodecTag::ALaw => "A_LAW",
            CodecTag::MuLaw => "MU_LAW",
            CodecTag::ImaAdpcm => "IMA_ADPCM",
            CodecTag::Extensible => "EXTENSIBLE",
            CodecTag::Unknown(_) => "UNKNOWN",
        }
    }

    /// Human-readable description
    pub const fn description(self) -> &'static str {
        match self {
            CodecTag::Pcm => "Uncompressed PCM",
            CodecTag::MsAdpcm => "Microsoft ADPCM",
            CodecTag::IeeeFloat => "IEEE 32-bit or 64-bit floating point",
            CodecTag::ALaw => "A-law companded PCM",
            CodecTag::MuLaw => "Mu-law companded PCM",
            CodecTag::ImaAdpcm => "IMA/DVI ADPCM",
            CodecTag::Extensible => "WAVE_FORMAT_EXTENSIBLE container",
            CodecTag::Unknown(_) => "Unknown or unsupported WAV format",
        }
    }

    /// True for the block-compressed ADPCM variants
    pub const fn is_adpcm(self) -> bool {
        matches!(self, CodecTag::MsAdpcm | CodecTag::ImaAdpcm)
    }

    /// True if this format uses companding
    pub const fn is_companded(self) -> bool {
        matches!(self, CodecTag::ALaw | CodecTag::MuLaw)
    }

    /// True if this is raw integer PCM
    pub const fn is_pcm(self) -> bool {
        matches!(self, CodecTag::Pcm)
    }
}

impl From<u16> for CodecTag {
    fn from(code: u16) -> Self {
        CodecTag::const_from(code)
    }
}

impl From<CodecTag> for u16 {
    fn from(val: CodecTag) -> Self {
        val.as_u16()
    }
}

impl Display for CodecTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if f.alternate() {
            match self {
                CodecTag::Unknown(code) => {
                    write!(f, "{} (0x{:04X})", self.description(), code)
                }
                other => write!(f, "{}", other.description()),
            }
        } else {
            match self {
                CodecTag::Unknown(code) => write!(f, "UNKNOWN(0x{:04X})", code),
                other => write!(f, "{}", other.as_str()),
            }
        }
    }
}

/// Length of the fixed part of a `fmt ` chunk (everything before cbSize)
pub const BASE_FMT_LEN: usize = 16;

/// Immutable description of a wave stream's encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatDescriptor {
    codec_tag: CodecTag,
    channels: u16,
    sample_rate: u32,
    average_bytes_per_second: u32,
    block_align: u16,
    bits_per_sample: u16,
    extra_params: Vec<u8>,
}

fn validate_rate_and_channels(sample_rate: u32, channels: u16) -> AudioIOResult<()> {
    if channels < 1 {
        return Err(AudioIOError::invalid_parameter(
            "Channel count must be at least 1",
        ));
    }
    if sample_rate == 0 {
        return Err(AudioIOError::invalid_parameter(
            "Sample rate must be positive",
        ));
    }
    Ok(())
}

impl FormatDescriptor {
    /// Uncompressed integer PCM.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if `channels` is zero, `sample_rate` is zero,
    /// `bits_per_sample` is zero or not a multiple of 8, or a derived field
    /// overflows.
    pub fn new_pcm(sample_rate: u32, channels: u16, bits_per_sample: u16) -> AudioIOResult<Self> {
        Self::new_linear(CodecTag::Pcm, sample_rate, channels, bits_per_sample)
    }

    /// IEEE floating point samples (32 or 64 bits).
    pub fn new_ieee_float(
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
    ) -> AudioIOResult<Self> {
        if !matches!(bits_per_sample, 32 | 64) {
            return Err(AudioIOError::invalid_parameter(format!(
                "IEEE float samples must be 32 or 64 bits, got {}",
                bits_per_sample
            )));
        }
        Self::new_linear(CodecTag::IeeeFloat, sample_rate, channels, bits_per_sample)
    }

    /// 8-bit A-law.
    pub fn new_alaw(sample_rate: u32, channels: u16) -> AudioIOResult<Self> {
        Self::new_linear(CodecTag::ALaw, sample_rate, channels, 8)
    }

    /// 8-bit mu-law.
    pub fn new_mulaw(sample_rate: u32, channels: u16) -> AudioIOResult<Self> {
        Self::new_linear(CodecTag::MuLaw, sample_rate, channels, 8)
    }

    fn new_linear(
        codec_tag: CodecTag,
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
    ) -> AudioIOResult<Self> {
        validate_rate_and_channels(sample_rate, channels)?;
        if bits_per_sample == 0 || !bits_per_sample.is_multiple_of(8) {
            return Err(AudioIOError::invalid_parameter(format!(
                "Bits per sample {} is not a positive multiple of 8",
                bits_per_sample
            )));
        }

        let block_align = channels.checked_mul(bits_per_sample / 8).ok_or_else(|| {
            AudioIOError::invalid_parameter(format!(
                "Block align overflows for {} channels of {} bits",
                channels, bits_per_sample
            ))
        })?;
        let average_bytes_per_second = sample_rate
            .checked_mul(block_align as u32)
            .ok_or_else(|| {
                AudioIOError::invalid_parameter(format!(
                    "Byte rate overflows for {} Hz with block align {}",
                    sample_rate, block_align
                ))
            })?;

        Ok(FormatDescriptor {
            codec_tag,
            channels,
            sample_rate,
            average_bytes_per_second,
            block_align,
            bits_per_sample,
            extra_params: Vec::new(),
        })
    }

    /// IMA/DVI ADPCM with the conventional 256 bytes per channel block.
    ///
    /// The block size is fixed first; samples per block and the average byte
    /// rate are derived from it. The two extra bytes hold samples per block.
    /// IMA codes are 4 bits wide, so `bits_per_sample` must be 4.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` if:
    /// - `sample_rate` or `channels` is zero,
    /// - `bits_per_sample` is anything but 4 (8 and 16 included),
    /// - `256 * channels` does not fit the 16-bit block align.
    pub fn new_ima_adpcm(
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
    ) -> AudioIOResult<Self> {
        validate_rate_and_channels(sample_rate, channels)?;
        if bits_per_sample != adpcm::ADPCM_BITS_PER_SAMPLE {
            return Err(AudioIOError::invalid_parameter(format!(
                "IMA ADPCM encodes 4 bits per sample, got {}",
                bits_per_sample
            )));
        }

        let geometry = AdpcmBlockGeometry::ima_standard(channels)?;
        Ok(FormatDescriptor {
            codec_tag: CodecTag::ImaAdpcm,
            channels,
            sample_rate,
            average_bytes_per_second: geometry.average_bytes_per_second(sample_rate)?,
            block_align: geometry.block_align(),
            bits_per_sample,
            extra_params: geometry.samples_per_block().to_le_bytes().to_vec(),
        })
    }

    /// Microsoft ADPCM with the block size conventional for `sample_rate`.
    ///
    /// Extra bytes: samples per block, coefficient count, then the seven
    /// standard coefficient pairs.
    pub fn new_ms_adpcm(sample_rate: u32, channels: u16) -> AudioIOResult<Self> {
        validate_rate_and_channels(sample_rate, channels)?;
        let geometry = AdpcmBlockGeometry::microsoft_standard(sample_rate, channels)?;

        let coefficients = &adpcm::MS_ADPCM_COEFFICIENTS;
        let mut extra_params = Vec::with_capacity(4 + coefficients.len() * 4);
        extra_params.extend_from_slice(&geometry.samples_per_block().to_le_bytes());
        extra_params.extend_from_slice(&(coefficients.len() as u16).to_le_bytes());
        for (c1, c2) in coefficients {
            extra_params.extend_from_slice(&c1.to_le_bytes());
            extra_params.extend_from_slice(&c2.to_le_bytes());
        }

        Ok(FormatDescriptor {
            codec_tag: CodecTag::MsAdpcm,
            channels,
            sample_rate,
            average_bytes_per_second: geometry.average_bytes_per_second(sample_rate)?,
            block_align: geometry.block_align(),
            bits_per_sample: adpcm::ADPCM_BITS_PER_SAMPLE,
            extra_params,
        })
    }

    /// WAVE_FORMAT_EXTENSIBLE wrapping PCM, float or companded samples.
    pub fn new_extensible(
        sample_rate: u32,
        channels: u16,
        bits_per_sample: u16,
        sub_format: CodecTag,
    ) -> AudioIOResult<Self> {
        if !matches!(
            sub_format,
            CodecTag::Pcm | CodecTag::IeeeFloat | CodecTag::ALaw | CodecTag::MuLaw
        ) {
            return Err(AudioIOError::invalid_parameter(format!(
                "{} cannot be carried as an extensible sub-format",
                sub_format
            )));
        }
        let mut descriptor =
            Self::new_linear(CodecTag::Extensible, sample_rate, channels, bits_per_sample)?;
        let info =
            ExtendedFormatInfo::new(bits_per_sample, default_channel_mask(channels), sub_format);
        descriptor.extra_params = info.to_bytes().to_vec();
        Ok(descriptor)
    }

    /// Assemble a descriptor from fields read out of a container header.
    ///
    /// Only structural sanity is checked (non-zero channels, rate and block
    /// align); codec-specific consistency is the caller's concern.
    pub fn from_raw_parts(
        codec_tag: CodecTag,
        channels: u16,
        sample_rate: u32,
        average_bytes_per_second: u32,
        block_align: u16,
        bits_per_sample: u16,
        extra_params: Vec<u8>,
    ) -> AudioIOResult<Self> {
        validate_rate_and_channels(sample_rate, channels)?;
        if block_align == 0 {
            return Err(AudioIOError::invalid_parameter(
                "Block align cannot be zero",
            ));
        }
        if extra_params.len() > u16::MAX as usize {
            return Err(AudioIOError::invalid_parameter(format!(
                "{} extra bytes exceed the 16-bit cbSize field",
                extra_params.len()
            )));
        }
        Ok(FormatDescriptor {
            codec_tag,
            channels,
            sample_rate,
            average_bytes_per_second,
            block_align,
            bits_per_sample,
            extra_params,
        })
    }

    pub const fn codec_tag(&self) -> CodecTag {
        self.codec_tag
    }

    pub const fn channels(&self) -> u16 {
        self.channels
    }

    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub const fn average_bytes_per_second(&self) -> u32 {
        self.average_bytes_per_second
    }

    pub const fn block_align(&self) -> u16 {
        self.block_align
    }

    pub const fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// Number of codec-specific bytes (cbSize)
    pub fn extra_size(&self) -> u16 {
        // bounded by every constructor
        self.extra_params.len() as u16
    }

    pub fn extra_params(&self) -> &[u8] {
        &self.extra_params
    }

    /// Extensible header, if this is WAVE_FORMAT_EXTENSIBLE
    pub fn extended_info(&self) -> Option<ExtendedFormatInfo> {
        match self.codec_tag {
            CodecTag::Extensible => ExtendedFormatInfo::from_bytes(&self.extra_params),
            _ => None,
        }
    }

    /// The tag describing the samples themselves, looking through EXTENSIBLE.
    pub fn effective_codec(&self) -> CodecTag {
        self.extended_info()
            .map(|info| info.sub_format_code())
            .unwrap_or(self.codec_tag)
    }

    /// Samples per block as stored in the extra parameters of ADPCM formats
    pub fn samples_per_block(&self) -> Option<u16> {
        if !self.codec_tag.is_adpcm() {
            return None;
        }
        let bytes = self.extra_params.get(0..2)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Block geometry derived from `block_align`, for ADPCM formats
    pub fn adpcm_geometry(&self) -> Option<AdpcmBlockGeometry> {
        match self.codec_tag {
            CodecTag::ImaAdpcm => AdpcmBlockGeometry::ima(self.block_align, self.channels).ok(),
            CodecTag::MsAdpcm => {
                AdpcmBlockGeometry::microsoft(self.block_align, self.channels).ok()
            }
            _ => None,
        }
    }

    /// Number of sample frames carried by `payload_len` bytes in this format.
    pub fn frames_in_payload(&self, payload_len: u64) -> u64 {
        match self.adpcm_geometry() {
            Some(geometry) => geometry.frames_in(payload_len),
            None => payload_len / self.block_align as u64,
        }
    }

    /// Length in bytes of the serialized `fmt ` chunk body
    pub fn fmt_chunk_len(&self) -> usize {
        if self.extra_params.is_empty() {
            BASE_FMT_LEN
        } else {
            BASE_FMT_LEN + 2 + self.extra_params.len()
        }
    }

    /// Serialize to the exact `fmt ` chunk body (little-endian).
    ///
    /// The 16 base bytes are always present; `cbSize` and the extra
    /// parameters follow only when there are extra parameters.
    pub fn to_fmt_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.fmt_chunk_len());
        out.extend_from_slice(&self.codec_tag.as_u16().to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.sample_rate.to_le_bytes());
        out.extend_from_slice(&self.average_bytes_per_second.to_le_bytes());
        out.extend_from_slice(&self.block_align.to_le_bytes());
        out.extend_from_slice(&self.bits_per_sample.to_le_bytes());
        if !self.extra_params.is_empty() {
            out.extend_from_slice(&self.extra_size().to_le_bytes());
            out.extend_from_slice(&self.extra_params);
        }
        out
    }

    /// Write the `fmt ` chunk body to `writer`.
    pub fn write_fmt<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_fmt_bytes())
    }
}

impl Display for FormatDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if !f.alternate() {
            return write!(
                f,
                "{} | {} Hz, {} ch, {}-bit, block {}",
                self.codec_tag,
                self.sample_rate,
                self.channels,
                self.bits_per_sample,
                self.block_align
            );
        }

        writeln!(f, "Format Descriptor:")?;
        writeln!(f, "├─ Codec: {:#}", self.codec_tag)?;
        writeln!(f, "├─ Sample Rate: {} Hz", self.sample_rate)?;
        writeln!(f, "├─ Channels: {}", self.channels)?;
        writeln!(f, "├─ Bits per Sample: {}-bit", self.bits_per_sample)?;
        writeln!(f, "├─ Block Align: {} bytes", self.block_align)?;
        if let Some(samples) = self.samples_per_block() {
            writeln!(f, "├─ Samples per Block: {}", samples)?;
        }
        writeln!(f, "├─ Byte Rate: {} bytes/s", self.average_bytes_per_second)?;
        write!(f, "└─ Extra Size: {} bytes", self.extra_size())
    }
}
