//! Block geometry for ADPCM wave formats.
//!
//! ADPCM payloads are made of fixed-size blocks. Every per-block quantity
//! (samples per block, average byte rate, frames in a payload) is derived from
//! `block_align` and the channel count, so the block size has to be chosen
//! first and everything else computed from it.
//!
//! IMA/DVI blocks start with a 4-byte header per channel that carries one
//! initial sample; every remaining byte carries two 4-bit samples. Microsoft
//! ADPCM blocks start with a 7-byte header per channel that carries two initial
//! samples.

use core::fmt::{Display, Formatter, Result as FmtResult};

use crate::error::{AudioIOError, AudioIOResult};

/// Standard IMA block size contribution per channel (256 bytes × channels)
pub const IMA_BLOCK_BYTES_PER_CHANNEL: u16 = 256;
/// IMA block header size per channel
pub const IMA_HEADER_BYTES_PER_CHANNEL: u16 = 4;
/// Microsoft ADPCM block header size per channel
pub const MS_ADPCM_HEADER_BYTES_PER_CHANNEL: u16 = 7;
/// Bits per encoded ADPCM sample
pub const ADPCM_BITS_PER_SAMPLE: u16 = 4;

/// The seven predictor coefficient pairs every Microsoft ADPCM stream declares.
pub const MS_ADPCM_COEFFICIENTS: [(i16, i16); 7] = [
    (256, 0),
    (512, -256),
    (0, 0),
    (192, 64),
    (240, 0),
    (460, -208),
    (392, -232),
];

/// Which ADPCM block layout the geometry describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdpcmVariant {
    /// IMA / DVI ADPCM (`WAVE_FORMAT_DVI_ADPCM`)
    Ima,
    /// Microsoft ADPCM (`WAVE_FORMAT_ADPCM`)
    Microsoft,
}

impl AdpcmVariant {
    const fn header_bytes_per_channel(self) -> u32 {
        match self {
            AdpcmVariant::Ima => IMA_HEADER_BYTES_PER_CHANNEL as u32,
            AdpcmVariant::Microsoft => MS_ADPCM_HEADER_BYTES_PER_CHANNEL as u32,
        }
    }

    /// Samples carried by the block header of one channel
    const fn header_samples(self) -> u32 {
        match self {
            AdpcmVariant::Ima => 1,
            AdpcmVariant::Microsoft => 2,
        }
    }

    /// Samples decodable from `len` bytes of a block, or 0 if the header is incomplete.
    const fn samples_in_block_bytes(self, len: u32, channels: u32) -> u32 {
        let header = self.header_bytes_per_channel() * channels;
        if len < header {
            return 0;
        }
        // Two nibbles per byte, shared between channels.
        ((len - header) * 2) / channels + self.header_samples()
    }
}

/// IMA samples per block: `((block_align - 4*channels) * 2) / channels + 1`.
///
/// Returns `None` when `channels` is zero or the block cannot hold the
/// per-channel headers.
pub const fn ima_samples_per_block(block_align: u16, channels: u16) -> Option<u32> {
    if channels == 0 || (block_align as u32) < IMA_HEADER_BYTES_PER_CHANNEL as u32 * channels as u32
    {
        return None;
    }
    Some(AdpcmVariant::Ima.samples_in_block_bytes(block_align as u32, channels as u32))
}

/// Microsoft ADPCM samples per block: `((block_align - 7*channels) * 8) / (4 * channels) + 2`.
pub const fn ms_adpcm_samples_per_block(block_align: u16, channels: u16) -> Option<u32> {
    if channels == 0
        || (block_align as u32) < MS_ADPCM_HEADER_BYTES_PER_CHANNEL as u32 * channels as u32
    {
        return None;
    }
    Some(AdpcmVariant::Microsoft.samples_in_block_bytes(block_align as u32, channels as u32))
}

/// Derived block geometry of an ADPCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdpcmBlockGeometry {
    variant: AdpcmVariant,
    channels: u16,
    block_align: u16,
    samples_per_block: u16,
}

impl AdpcmBlockGeometry {
    /// IMA geometry for an explicit block size.
    pub fn ima(block_align: u16, channels: u16) -> AudioIOResult<Self> {
        let samples = ima_samples_per_block(block_align, channels).ok_or_else(|| {
            AudioIOError::invalid_parameter(format!(
                "IMA ADPCM block of {} bytes cannot hold {} channel header(s)",
                block_align, channels
            ))
        })?;
        Self::build(AdpcmVariant::Ima, block_align, channels, samples)
    }

    /// IMA geometry using the conventional block size of 256 bytes per channel.
    pub fn ima_standard(channels: u16) -> AudioIOResult<Self> {
        let block_align = IMA_BLOCK_BYTES_PER_CHANNEL
            .checked_mul(channels)
            .ok_or_else(|| {
                AudioIOError::invalid_parameter(format!(
                    "IMA ADPCM block align overflows for {} channels",
                    channels
                ))
            })?;
        Self::ima(block_align, channels)
    }

    /// Microsoft ADPCM geometry for an explicit block size.
    pub fn microsoft(block_align: u16, channels: u16) -> AudioIOResult<Self> {
        let samples = ms_adpcm_samples_per_block(block_align, channels).ok_or_else(|| {
            AudioIOError::invalid_parameter(format!(
                "MS ADPCM block of {} bytes cannot hold {} channel header(s)",
                block_align, channels
            ))
        })?;
        Self::build(AdpcmVariant::Microsoft, block_align, channels, samples)
    }

    /// Microsoft ADPCM geometry using the block size conventionally paired
    /// with `sample_rate`: 256, 512 or 1024 bytes per channel.
    pub fn microsoft_standard(sample_rate: u32, channels: u16) -> AudioIOResult<Self> {
        let per_channel: u16 = match sample_rate {
            0..=11_025 => 256,
            11_026..=22_050 => 512,
            _ => 1024,
        };
        let block_align = per_channel.checked_mul(channels).ok_or_else(|| {
            AudioIOError::invalid_parameter(format!(
                "MS ADPCM block align overflows for {} channels",
                channels
            ))
        })?;
        Self::microsoft(block_align, channels)
    }

    fn build(
        variant: AdpcmVariant,
        block_align: u16,
        channels: u16,
        samples: u32,
    ) -> AudioIOResult<Self> {
        let samples_per_block = u16::try_from(samples).map_err(|_| {
            AudioIOError::invalid_parameter(format!(
                "{} samples per block does not fit the 16-bit header field",
                samples
            ))
        })?;
        Ok(AdpcmBlockGeometry {
            variant,
            channels,
            block_align,
            samples_per_block,
        })
    }

    pub const fn variant(&self) -> AdpcmVariant {
        self.variant
    }

    pub const fn channels(&self) -> u16 {
        self.channels
    }

    pub const fn block_align(&self) -> u16 {
        self.block_align
    }

    pub const fn samples_per_block(&self) -> u16 {
        self.samples_per_block
    }

    /// `sample_rate * block_align / samples_per_block`, truncated toward zero.
    pub fn average_bytes_per_second(&self, sample_rate: u32) -> AudioIOResult<u32> {
        let avg =
            sample_rate as u64 * self.block_align as u64 / self.samples_per_block as u64;
        u32::try_from(avg).map_err(|_| {
            AudioIOError::invalid_parameter(format!(
                "Average byte rate {} overflows 32 bits",
                avg
            ))
        })
    }

    /// Number of sample frames held by `payload_len` bytes of ADPCM data,
    /// counting the decodable part of a trailing partial block.
    pub const fn frames_in(&self, payload_len: u64) -> u64 {
        let block = self.block_align as u64;
        let full_blocks = payload_len / block;
        let tail = (payload_len % block) as u32;
        full_blocks * self.samples_per_block as u64
            + self
                .variant
                .samples_in_block_bytes(tail, self.channels as u32) as u64
    }
}

impl Display for AdpcmBlockGeometry {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{:?} ADPCM: {} ch, {} bytes/block, {} samples/block",
            self.variant, self.channels, self.block_align, self.samples_per_block
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_ima_standard_stereo() {
        let geometry = AdpcmBlockGeometry::ima_standard(2).unwrap();
        assert_eq!(geometry.block_align(), 512);
        assert_eq!(geometry.samples_per_block(), 505);
        assert_eq!(
            geometry.average_bytes_per_second(44_100).unwrap(),
            44_100 * 512 / 505
        );
    }

    #[test]
    fn test_ima_formula_holds_for_all_channel_counts() {
        for channels in 1u16..=255 {
            let geometry = AdpcmBlockGeometry::ima_standard(channels).unwrap();
            let block_align = geometry.block_align() as u32;
            let ch = channels as u32;
            assert_eq!(block_align, 256 * ch);
            assert_eq!(
                geometry.samples_per_block() as u32,
                ((block_align - 4 * ch) * 2) / ch + 1,
                "channels = {}",
                channels
            );
        }
    }

    #[test]
    fn test_ima_standard_rejects_overflowing_channel_count() {
        let err = AdpcmBlockGeometry::ima_standard(256).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
        assert!(AdpcmBlockGeometry::ima_standard(0).is_err());
    }

    #[test]
    fn test_ima_block_too_small_for_headers() {
        assert_eq!(ima_samples_per_block(7, 2), None);
        assert_eq!(ima_samples_per_block(8, 2), Some(1));
    }

    #[test]
    fn test_average_bytes_per_second_truncates() {
        let geometry = AdpcmBlockGeometry::ima_standard(1).unwrap();
        // 8000 * 256 / 505 = 4055.44...
        assert_eq!(geometry.average_bytes_per_second(8_000).unwrap(), 4055);
    }

    #[test]
    fn test_microsoft_standard_block_sizes() {
        let low = AdpcmBlockGeometry::microsoft_standard(8_000, 1).unwrap();
        assert_eq!(low.block_align(), 256);
        assert_eq!(low.samples_per_block(), 500);

        let cd = AdpcmBlockGeometry::microsoft_standard(44_100, 2).unwrap();
        assert_eq!(cd.block_align(), 2048);
        assert_eq!(cd.samples_per_block(), ((2048 - 14) * 8 / 8 + 2) as u16);
    }

    #[test]
    fn test_frames_in_counts_partial_blocks() {
        let geometry = AdpcmBlockGeometry::ima_standard(1).unwrap();
        assert_eq!(geometry.frames_in(0), 0);
        assert_eq!(geometry.frames_in(256 * 3), 505 * 3);
        // 3 header bytes is not enough to decode anything
        assert_eq!(geometry.frames_in(256 + 3), 505);
        // header + 10 data bytes = 1 + 20 samples
        assert_eq!(geometry.frames_in(256 + 14), 505 + 21);
    }
}
