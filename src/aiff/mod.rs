//! AIFF and AIFF-C source support.
//!
//! Only reading is provided: AIFF is a conversion source, WAVE the
//! destination.

pub mod error;
pub mod extended;
pub mod reader;

pub use reader::{CommonChunk, SampleLayout, StreamedAiffReader};
