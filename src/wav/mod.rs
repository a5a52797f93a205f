//! RIFF/WAVE container support.
//!
//! [`StreamedWavWriter`] is the destination side of a conversion and
//! [`StreamedWavReader`] the source side for WAVE → WAVE re-containering.
//! The `fmt ` chunk body is parsed by [`fmt::FmtChunk`] and produced by
//! [`FormatDescriptor::to_fmt_bytes`](crate::descriptor::FormatDescriptor::to_fmt_bytes).

pub mod error;
pub mod fmt;
pub mod streaming;
pub mod streaming_writer;

pub use fmt::FmtChunk;
pub use streaming::StreamedWavReader;
pub use streaming_writer::StreamedWavWriter;
