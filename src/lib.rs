// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)] // Duplicate match arms
#![allow(clippy::result_large_err)] // Allow large error types for comprehensive error handling
#![allow(clippy::missing_const_for_fn)] // Functions may need mutations in the future
#![allow(clippy::collapsible_if)] // Sometimes clearer to have separate conditions
#![allow(clippy::missing_panics_doc)] // Panics are converted to proper errors where needed
#![allow(clippy::needless_borrows_for_generic_args)] // Sometimes clearer with explicit borrows
#![allow(clippy::if_same_then_else)] // Similar blocks may diverge in the future
#![allow(clippy::unnecessary_cast)] // Explicit casts for clarity
#![allow(clippy::identity_op)] // Explicit operations for clarity

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::box_collection)] // Warns on boxed `Vec`, `String`, etc.
#![warn(clippy::vec_box)] // Avoids using `Vec<Box<T>>` when unnecessary
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`
#![warn(clippy::panic)] // Avoids using `panic!` in production code

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_safety_doc)] // Docs for `unsafe` functions
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![allow(clippy::too_many_arguments)] // Allow functions with many parameters (very few and far between)


//! Binary audio and MIDI container layer.
//!
//! - [`descriptor::FormatDescriptor`]: validated wave-format values (PCM,
//!   IEEE float, A-law/µ-law, IMA and Microsoft ADPCM, Extensible) and their
//!   `fmt ` chunk bytes.
//! - [`pipeline::ContainerStreamPipeline`]: copies a container payload from a
//!   [`ContainerReader`] to a [`ContainerWriter`] through a fixed buffer.
//! - [`wav`] and [`aiff`]: streaming readers and the WAVE writer.
//! - [`midi`]: channel voice events, VLQ delta times and `MTrk` chunks.
//!
//! # Example
//!
//! ```no_run
//! use audio_container_io::{convert_directory, convert_to_wav, types::ConvertOptions};
//!
//! convert_to_wav("take1.aiff", "take1.wav")?;
//!
//! let report = convert_directory("sessions", &ConvertOptions::default().with_recursive(true))?;
//! for failure in &report.failed {
//!     eprintln!("{}: {}", failure.source.display(), failure.error);
//! }
//! # Ok::<(), audio_container_io::AudioIOError>(())
//! ```

pub mod chunks;
pub mod descriptor;
pub mod error;
pub mod pipeline;
pub mod traits;
pub mod types;

#[cfg(feature = "wav")]
pub mod wav;

#[cfg(feature = "wav")]
pub use crate::wav::{StreamedWavReader, StreamedWavWriter};

#[cfg(feature = "aiff")]
pub mod aiff;

#[cfg(feature = "aiff")]
pub use crate::aiff::StreamedAiffReader;

#[cfg(feature = "midi")]
pub mod midi;

#[cfg(feature = "wav")]
pub mod convert;

#[cfg(feature = "wav")]
pub use crate::convert::{
    BatchReport, convert_directory, convert_to_wav, convert_to_wav_with_options, open_source,
};

use std::io::{Read, Seek};

pub use crate::{
    descriptor::{CodecTag, FormatDescriptor},
    error::{AudioIOError, AudioIOResult, ErrorKind},
    pipeline::{ContainerStreamPipeline, ConversionSummary},
    traits::{ContainerReader, ContainerWriter},
    types::{ConvertOptions, FileType},
};

/// Convenience trait for types that implement both Read and Seek
pub trait ReadSeek: Read + Seek {}

impl<RS: Read + Seek> ReadSeek for RS where RS: Read + Seek {}

// Public API

/// Get the payload format of an audio container.
///
/// Only the header is parsed.
///
/// # Example
///
/// ```no_run
/// let format = audio_container_io::info("take1.aiff")?;
/// println!("{:#}", format);
/// # Ok::<(), audio_container_io::AudioIOError>(())
/// ```
#[cfg(feature = "wav")]
pub fn info<P: AsRef<std::path::Path>>(fp: P) -> AudioIOResult<FormatDescriptor> {
    let source = open_source(fp)?;
    Ok(source.format().clone())
}
