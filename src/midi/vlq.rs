//! Standard MIDI File variable-length quantities.
//!
//! Big-endian groups of 7 bits; every byte except the last has its high bit
//! set. Four bytes carry at most 28 bits.

use crate::midi::error::MidiError;

/// Largest value a 4-byte VLQ can carry
pub const MAX_VLQ: u32 = 0x0FFF_FFFF;
/// Longest legal encoding
pub const MAX_VLQ_LEN: usize = 4;

/// Number of bytes `value` occupies when encoded.
pub const fn vlq_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        _ => 4,
    }
}

/// Append the VLQ encoding of `value` to `out`, returning the bytes written.
pub fn encode_vlq(value: u32, out: &mut Vec<u8>) -> Result<usize, MidiError> {
    if value > MAX_VLQ {
        return Err(MidiError::DeltaTimeTooLarge(value));
    }
    let len = vlq_len(value);
    for i in (0..len).rev() {
        let group = ((value >> (7 * i)) & 0x7F) as u8;
        out.push(if i == 0 { group } else { group | 0x80 });
    }
    Ok(len)
}

/// Decode a VLQ at the start of `bytes`, returning the value and bytes consumed.
///
/// `offset` is only used for error positions.
pub fn decode_vlq(bytes: &[u8], offset: usize) -> Result<(u32, usize), MidiError> {
    let mut value = 0u32;
    for (i, &byte) in bytes.iter().enumerate() {
        if i == MAX_VLQ_LEN {
            return Err(MidiError::VlqTooLong(offset));
        }
        value = (value << 7) | (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    if bytes.len() >= MAX_VLQ_LEN {
        Err(MidiError::VlqTooLong(offset))
    } else {
        Err(MidiError::UnterminatedVlq(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(value: u32) -> Vec<u8> {
        let mut out = Vec::new();
        encode_vlq(value, &mut out).unwrap();
        out
    }

    #[test]
    fn test_reference_encodings() {
        // Values from the Standard MIDI File specification
        let cases: [(u32, &[u8]); 10] = [
            (0x00, &[0x00]),
            (0x40, &[0x40]),
            (0x7F, &[0x7F]),
            (0x80, &[0x81, 0x00]),
            (0x2000, &[0xC0, 0x00]),
            (0x3FFF, &[0xFF, 0x7F]),
            (0x4000, &[0x81, 0x80, 0x00]),
            (0x1F_FFFF, &[0xFF, 0xFF, 0x7F]),
            (0x20_0000, &[0x81, 0x80, 0x80, 0x00]),
            (0x0FFF_FFFF, &[0xFF, 0xFF, 0xFF, 0x7F]),
        ];
        for (value, bytes) in cases {
            assert_eq!(encoded(value), bytes, "value 0x{:X}", value);
            assert_eq!(decode_vlq(bytes, 0).unwrap(), (value, bytes.len()));
            assert_eq!(vlq_len(value), bytes.len());
        }
    }

    #[test]
    fn test_decode_stops_at_terminator() {
        assert_eq!(decode_vlq(&[0x81, 0x00, 0x90, 0x40], 0).unwrap(), (0x80, 2));
    }

    #[test]
    fn test_encode_rejects_oversized_values() {
        let mut out = Vec::new();
        let err = encode_vlq(0x1000_0000, &mut out).unwrap_err();
        assert_eq!(err, MidiError::DeltaTimeTooLarge(0x1000_0000));
        assert!(out.is_empty());
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode_vlq(&[], 3), Err(MidiError::UnterminatedVlq(3)));
        assert_eq!(decode_vlq(&[0x81, 0x80], 0), Err(MidiError::UnterminatedVlq(0)));
        assert_eq!(
            decode_vlq(&[0x81, 0x80, 0x80, 0x80, 0x00], 0),
            Err(MidiError::VlqTooLong(0))
        );
        assert_eq!(
            decode_vlq(&[0xFF, 0xFF, 0xFF, 0xFF], 0),
            Err(MidiError::VlqTooLong(0))
        );
    }
}
