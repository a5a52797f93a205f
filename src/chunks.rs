//! FourCC chunk identifiers and chunk descriptors shared by the RIFF, AIFF and
//! Standard MIDI File containers.
//!
//! All three containers use the same `id + u32 size + body` framing. They only
//! differ in the byte order of the size field (little-endian for RIFF,
//! big-endian for AIFF and SMF) and in whether odd bodies are padded.

use core::fmt::{Display, Formatter, Result as FmtResult};
use std::io::{self, Read};

use crate::error::{AudioIOError, AudioIOResult, ErrorPosition};

/// FourCC chunk identifier wrapper -- does not own the data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChunkID {
    pub id: [u8; 4],
}

impl AsRef<[u8]> for ChunkID {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.id
    }
}

impl Display for ChunkID {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match core::str::from_utf8(&self.id) {
            Ok(s) if s.chars().all(|c| c.is_ascii_graphic() || c == ' ') => write!(f, "{}", s),
            _ => write!(
                f,
                "0x{:02X}{:02X}{:02X}{:02X}",
                self.id[0], self.id[1], self.id[2], self.id[3]
            ),
        }
    }
}

impl From<&[u8; 4]> for ChunkID {
    fn from(value: &[u8; 4]) -> Self {
        ChunkID { id: *value }
    }
}

impl From<[u8; 4]> for ChunkID {
    fn from(value: [u8; 4]) -> Self {
        ChunkID { id: value }
    }
}

impl ChunkID {
    #[inline]
    pub const fn new(id: &[u8; 4]) -> Self {
        ChunkID { id: *id }
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.id
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.id).ok()
    }
}

/// Lightweight description of a chunk discovered while scanning a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDesc {
    pub id: ChunkID,
    /// Absolute offset of the chunk header in the stream
    pub offset: u64,
    /// Logical size of the chunk data (excluding header and padding)
    pub logical_size: u64,
    /// Total size including header and padding (for stream positioning)
    pub total_size: u64,
}

impl ChunkDesc {
    /// Describe a chunk whose header starts at `offset`, padding odd bodies when `padded`.
    pub const fn new(id: ChunkID, offset: u64, logical_size: u64, padded: bool) -> Self {
        let pad = if padded { logical_size & 1 } else { 0 };
        ChunkDesc {
            id,
            offset,
            logical_size,
            total_size: CHUNK_HEADER_LEN + logical_size + pad,
        }
    }

    /// Returns the logical size of the chunk data (excluding header and padding)
    #[inline]
    pub const fn len(&self) -> u64 {
        self.logical_size
    }

    /// Returns true if the chunk has no logical data
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.logical_size == 0
    }

    /// Absolute offset of the first body byte
    #[inline]
    pub const fn data_start(&self) -> u64 {
        self.offset + CHUNK_HEADER_LEN
    }

    /// Absolute offset of the next chunk header
    #[inline]
    pub const fn end(&self) -> u64 {
        self.offset + self.total_size
    }
}

impl Display for ChunkDesc {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Chunk ID: {}, Offset: {}, Logical Size: {}, Total Size: {}",
            self.id, self.offset, self.logical_size, self.total_size
        )
    }
}

/// Size of a chunk header (`id` + `u32` size)
pub const CHUNK_HEADER_LEN: u64 = 8;

// RIFF / WAVE
pub const RIFF_CHUNK: ChunkID = ChunkID::new(b"RIFF");
pub const WAVE_CHUNK: ChunkID = ChunkID::new(b"WAVE");
pub const FMT_CHUNK: ChunkID = ChunkID::new(b"fmt ");
pub const DATA_CHUNK: ChunkID = ChunkID::new(b"data");
pub const FACT_CHUNK: ChunkID = ChunkID::new(b"fact");
pub const LIST_CHUNK: ChunkID = ChunkID::new(b"LIST");

// IFF / AIFF
pub const FORM_CHUNK: ChunkID = ChunkID::new(b"FORM");
pub const AIFF_FORM_TYPE: ChunkID = ChunkID::new(b"AIFF");
pub const AIFC_FORM_TYPE: ChunkID = ChunkID::new(b"AIFC");
pub const COMM_CHUNK: ChunkID = ChunkID::new(b"COMM");
pub const SSND_CHUNK: ChunkID = ChunkID::new(b"SSND");

// Standard MIDI File
pub const MTHD_CHUNK: ChunkID = ChunkID::new(b"MThd");
pub const MTRK_CHUNK: ChunkID = ChunkID::new(b"MTrk");

/// Byte order of a container's chunk size fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeOrder {
    /// RIFF
    LittleEndian,
    /// IFF / AIFF / SMF
    BigEndian,
}

/// `read_exact`, with a short read reported as malformed data.
pub(crate) fn read_exact_at<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    offset: u64,
    what: &str,
) -> AudioIOResult<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => AudioIOError::malformed(
            format!("Unexpected end of stream reading {}", what),
            format!("needed {} bytes", buf.len()),
            ErrorPosition::new(offset as usize),
        ),
        _ => AudioIOError::Io(e),
    })
}

/// Read the chunk header at `offset`, or `None` at a clean end of stream.
///
/// The reader must already be positioned at `offset`. Odd bodies are padded
/// (both RIFF and IFF pad to even offsets).
pub(crate) fn read_chunk_header<R: Read>(
    reader: &mut R,
    offset: u64,
    order: SizeOrder,
) -> AudioIOResult<Option<ChunkDesc>> {
    let mut header = [0u8; CHUNK_HEADER_LEN as usize];
    let mut filled = 0;
    while filled < header.len() {
        match reader.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    match filled {
        0 => Ok(None),
        8 => {
            let id = ChunkID::new(&[header[0], header[1], header[2], header[3]]);
            let size_bytes = [header[4], header[5], header[6], header[7]];
            let size = match order {
                SizeOrder::LittleEndian => u32::from_le_bytes(size_bytes),
                SizeOrder::BigEndian => u32::from_be_bytes(size_bytes),
            };
            Ok(Some(ChunkDesc::new(id, offset, size as u64, true)))
        }
        n => Err(AudioIOError::malformed(
            "Truncated chunk header",
            format!("found {} of 8 bytes", n),
            ErrorPosition::new(offset as usize),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_desc_pads_odd_bodies() {
        let desc = ChunkDesc::new(DATA_CHUNK, 36, 3, true);
        assert_eq!(desc.data_start(), 44);
        assert_eq!(desc.total_size, 12);
        assert_eq!(desc.end(), 48);

        let unpadded = ChunkDesc::new(MTRK_CHUNK, 14, 3, false);
        assert_eq!(unpadded.total_size, 11);
    }

    #[test]
    fn test_read_chunk_header_byte_orders() {
        let bytes = [b'S', b'S', b'N', b'D', 0, 0, 1, 2];
        let desc = read_chunk_header(&mut &bytes[..], 12, SizeOrder::BigEndian)
            .unwrap()
            .unwrap();
        assert_eq!(desc.id, SSND_CHUNK);
        assert_eq!(desc.logical_size, 0x0102);
        assert_eq!(desc.data_start(), 20);

        let desc = read_chunk_header(&mut &bytes[..], 0, SizeOrder::LittleEndian)
            .unwrap()
            .unwrap();
        assert_eq!(desc.logical_size, 0x0201_0000);
    }

    #[test]
    fn test_read_chunk_header_end_and_truncation() {
        let empty: &[u8] = &[];
        assert!(
            read_chunk_header(&mut &empty[..], 0, SizeOrder::LittleEndian)
                .unwrap()
                .is_none()
        );
        let short: &[u8] = b"dat";
        let err = read_chunk_header(&mut &short[..], 40, SizeOrder::LittleEndian).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedMessage);
    }

    #[test]
    fn test_chunk_id_display_falls_back_to_hex() {
        assert_eq!(FMT_CHUNK.to_string(), "fmt ");
        assert_eq!(ChunkID::new(&[0, 1, 2, 0xFF]).to_string(), "0x000102FF");
    }
}
