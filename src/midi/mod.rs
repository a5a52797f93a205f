//! MIDI channel voice events.
//!
//! Events are encoded as `VLQ(delta) status data...` as found inside Standard
//! MIDI File track chunks, or packed into a `u32` for short-message APIs.

pub mod codec;
pub mod error;
pub mod event;
pub mod track;
pub mod vlq;

pub use codec::{as_packed_u32, decode, encode, encode_into, from_packed_u32};
pub use error::MidiError;
pub use event::{MidiMessage, MidiTimedEvent, PITCH_WHEEL_CENTER};
pub use track::{DecodedTrack, decode_track, encode_track};
pub use vlq::{decode_vlq, encode_vlq};
