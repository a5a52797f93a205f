//! IEEE 754 80-bit extended precision numbers, as used for the AIFF sample rate.
//!
//! Layout: sign (1 bit) | biased exponent (15 bits) | significand (64 bits,
//! explicit integer bit). For normal numbers
//! `value = (-1)^sign × significand × 2^(exponent − 16383 − 63)`.

use crate::aiff::error::AiffError;

const EXPONENT_BIAS: i32 = 16383;

/// Decode an 80-bit extended float. `None` for infinity and NaN.
pub fn extended_to_f64(bytes: &[u8; 10]) -> Option<f64> {
    let sign_exp = u16::from_be_bytes([bytes[0], bytes[1]]);
    let mut significand = [0u8; 8];
    significand.copy_from_slice(&bytes[2..10]);
    let significand = u64::from_be_bytes(significand);

    let negative = sign_exp & 0x8000 != 0;
    let exponent = (sign_exp & 0x7FFF) as i32;

    if exponent == 0x7FFF {
        return None;
    }
    if significand == 0 {
        return Some(0.0);
    }

    // Denormals use the same scale as exponent 1
    let exponent = exponent.max(1);
    let magnitude = significand as f64 * 2f64.powi(exponent - EXPONENT_BIAS - 63);
    Some(if negative { -magnitude } else { magnitude })
}

/// Encode an integer exactly as an 80-bit extended float.
pub fn u32_to_extended(value: u32) -> [u8; 10] {
    let mut out = [0u8; 10];
    if value == 0 {
        return out;
    }
    let shift = (value as u64).leading_zeros();
    let significand = (value as u64) << shift;
    let exponent = (EXPONENT_BIAS + 63 - shift as i32) as u16;
    out[0..2].copy_from_slice(&exponent.to_be_bytes());
    out[2..10].copy_from_slice(&significand.to_be_bytes());
    out
}

/// Decode an AIFF sample rate, rounding to the nearest integer Hz.
///
/// Rejects NaN, infinities, and rates that are not positive or do not fit
/// 32 bits.
pub fn sample_rate_from_extended(bytes: &[u8; 10]) -> Result<u32, AiffError> {
    let rate = extended_to_f64(bytes)
        .ok_or_else(|| AiffError::InvalidSampleRate("infinity or NaN".to_string()))?;
    let rounded = rate.round();
    if !(1.0..=u32::MAX as f64).contains(&rounded) {
        return Err(AiffError::InvalidSampleRate(format!(
            "{} Hz is out of range",
            rate
        )));
    }
    Ok(rounded as u32)
}
