use crate::descriptor::CodecTag;

/// Size of the `WAVE_FORMAT_EXTENSIBLE` extension (cbSize)
pub const EXTENSIBLE_EXTRA_SIZE: u16 = 22;

/// Extended format information for WAVE_FORMAT_EXTENSIBLE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtendedFormatInfo {
    /// Valid bits per sample (may be less than container size)
    pub valid_bits_per_sample: u16,
    /// Channel mask indicating speaker positions
    pub channel_mask: u32,
    /// Sub-format GUID (first 16 bits indicate actual format)
    pub sub_format: [u8; 16],
}

impl ExtendedFormatInfo {
    /// Canonical GUID tail for WAV sub-formats
    pub const WAV_SUBFORMAT_GUID_TAIL: [u8; 14] = [
        0x00, 0x00, 0x10, 0x00, 0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71, 0x00, 0x00,
    ];

    /// Build the extension for a standard sub-format tag.
    pub const fn new(valid_bits_per_sample: u16, channel_mask: u32, sub_format: CodecTag) -> Self {
        let tag = sub_format.as_u16().to_le_bytes();
        let mut guid = [0u8; 16];
        guid[0] = tag[0];
        guid[1] = tag[1];
        let mut i = 0;
        while i < Self::WAV_SUBFORMAT_GUID_TAIL.len() {
            guid[i + 2] = Self::WAV_SUBFORMAT_GUID_TAIL[i];
            i += 1;
        }
        ExtendedFormatInfo {
            valid_bits_per_sample,
            channel_mask,
            sub_format: guid,
        }
    }

    /// Parse the 22-byte extension that follows `cbSize`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let bytes: &[u8; 22] = bytes.get(..22)?.try_into().ok()?;
        let mut sub_format = [0u8; 16];
        sub_format.copy_from_slice(&bytes[6..22]);
        Some(ExtendedFormatInfo {
            valid_bits_per_sample: u16::from_le_bytes([bytes[0], bytes[1]]),
            channel_mask: u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]),
            sub_format,
        })
    }

    pub fn to_bytes(&self) -> [u8; 22] {
        let mut out = [0u8; 22];
        out[0..2].copy_from_slice(&self.valid_bits_per_sample.to_le_bytes());
        out[2..6].copy_from_slice(&self.channel_mask.to_le_bytes());
        out[6..22].copy_from_slice(&self.sub_format);
        out
    }

    /// Format tag carried in the first two bytes of the sub-format GUID
    pub const fn sub_format_code(&self) -> CodecTag {
        CodecTag::const_from(u16::from_le_bytes([self.sub_format[0], self.sub_format[1]]))
    }

    /// True if the sub-format GUID matches the WAV extensible schema
    pub fn is_standard_wav_subformat(&self) -> bool {
        self.sub_format[2..] == Self::WAV_SUBFORMAT_GUID_TAIL
    }
}

/// Windows standard speaker position mask for a channel count.
pub const fn default_channel_mask(channels: u16) -> u32 {
    match channels {
        1 => 0x4,   // SPEAKER_FRONT_CENTER
        2 => 0x3,   // SPEAKER_FRONT_LEFT | SPEAKER_FRONT_RIGHT
        3 => 0x7,   // FRONT_LEFT | FRONT_RIGHT | FRONT_CENTER
        4 => 0x33,  // FRONT_LEFT | FRONT_RIGHT | BACK_LEFT | BACK_RIGHT
        5 => 0x37,  // 4.0 + FRONT_CENTER
        6 => 0x3F,  // 5.0 + LFE (5.1)
        7 => 0x13F, // 5.1 + BACK_CENTER
        8 => 0x63F, // 5.1 + SIDE_LEFT | SIDE_RIGHT (7.1)
        n if n < 32 => (1u32 << n) - 1,
        _ => 0xFFFF_FFFF,
    }
}
