//! `MTrk` track chunks.
//!
//! A track chunk is `"MTrk" <u32 BE length> <events>`, where the events end
//! with the mandatory end-of-track meta event `FF 2F 00`. Only channel voice
//! messages are modelled; meta and system exclusive events are skipped on
//! decode, and their delta times are folded into the next channel event so
//! absolute timing is preserved.

use crate::{
    chunks::{CHUNK_HEADER_LEN, MTRK_CHUNK},
    midi::{
        codec::{decode_message_data, encode_short_message},
        error::MidiError,
        event::{MidiMessage, MidiTimedEvent},
        vlq::{decode_vlq, encode_vlq},
    },
};

const META_EVENT: u8 = 0xFF;
const META_END_OF_TRACK: u8 = 0x2F;
const SYSEX_START: u8 = 0xF0;
const SYSEX_ESCAPE: u8 = 0xF7;

/// End-of-track meta event with a zero delta time
pub const END_OF_TRACK: [u8; 4] = [0x00, META_EVENT, META_END_OF_TRACK, 0x00];

/// Channel events of a decoded track plus what was skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedTrack {
    pub events: Vec<MidiTimedEvent>,
    /// Meta and sysex events that were skipped
    pub skipped_events: usize,
    /// Ticks between the last channel event and end-of-track
    pub trailing_delta: u32,
}

/// Encode `events` as a complete `MTrk` chunk, end-of-track included.
///
/// Every status byte is written out (no running status).
pub fn encode_track(events: &[MidiTimedEvent]) -> Result<Vec<u8>, MidiError> {
    let mut out = Vec::with_capacity(CHUNK_HEADER_LEN as usize + events.len() * 4 + 4);
    out.extend_from_slice(MTRK_CHUNK.as_bytes());
    out.extend_from_slice(&[0; 4]);

    for event in events {
        event.validate()?;
        encode_vlq(event.delta_time, &mut out)?;
        encode_short_message(event, &mut out);
    }
    out.extend_from_slice(&END_OF_TRACK);

    let body_len = out.len() - CHUNK_HEADER_LEN as usize;
    let body_len = u32::try_from(body_len)
        .map_err(|_| MidiError::invalid_track(format!("{} bytes exceed u32", body_len)))?;
    out[4..8].copy_from_slice(&body_len.to_be_bytes());
    Ok(out)
}

/// Decode a complete `MTrk` chunk from the start of `bytes`.
///
/// # Returns
///
/// The decoded track and the number of bytes the chunk occupied.
///
/// # Errors
///
/// `MalformedMessage` if the header is wrong, the body is shorter than
/// declared, an event is malformed, running status is used before any
/// status byte, or the body ends without an end-of-track event.
pub fn decode_track(bytes: &[u8]) -> Result<(DecodedTrack, usize), MidiError> {
    let header_len = CHUNK_HEADER_LEN as usize;
    let header = bytes.get(..header_len).ok_or(MidiError::Truncated {
        needed: header_len,
        available: bytes.len(),
    })?;
    if header[..4] != *MTRK_CHUNK.as_bytes() {
        return Err(MidiError::invalid_track(format!(
            "chunk id {:?} is not MTrk",
            String::from_utf8_lossy(&header[..4])
        )));
    }
    let body_len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;
    let body = bytes
        .get(header_len..header_len + body_len)
        .ok_or(MidiError::Truncated {
            needed: header_len + body_len,
            available: bytes.len(),
        })?;

    let mut track = DecodedTrack::default();
    let mut pos = 0usize;
    let mut running_status: Option<u8> = None;
    let mut pending_delta = 0u32;

    while pos < body.len() {
        let abs = header_len + pos;
        let (delta, used) = decode_vlq(&body[pos..], abs)?;
        pos += used;
        pending_delta = pending_delta.saturating_add(delta);

        let first = *body.get(pos).ok_or(MidiError::Truncated {
            needed: header_len + pos + 1,
            available: header_len + body.len(),
        })?;

        match first {
            META_EVENT => {
                let meta_type = *body.get(pos + 1).ok_or(MidiError::Truncated {
                    needed: header_len + pos + 2,
                    available: header_len + body.len(),
                })?;
                let (len, vlq_used) = decode_vlq(&body[pos + 2..], header_len + pos + 2)?;
                let end = pos + 2 + vlq_used + len as usize;
                if end > body.len() {
                    return Err(MidiError::Truncated {
                        needed: header_len + end,
                        available: header_len + body.len(),
                    });
                }
                pos = end;
                if meta_type == META_END_OF_TRACK {
                    track.trailing_delta = pending_delta;
                    return Ok((track, header_len + body_len));
                }
                track.skipped_events += 1;
                running_status = None;
            }
            SYSEX_START | SYSEX_ESCAPE => {
                let (len, vlq_used) = decode_vlq(&body[pos + 1..], header_len + pos + 1)?;
                let end = pos + 1 + vlq_used + len as usize;
                if end > body.len() {
                    return Err(MidiError::Truncated {
                        needed: header_len + end,
                        available: header_len + body.len(),
                    });
                }
                pos = end;
                track.skipped_events += 1;
                running_status = None;
            }
            _ => {
                let status = if first & 0x80 != 0 {
                    pos += 1;
                    first
                } else {
                    running_status.ok_or(MidiError::InvalidStatus {
                        status: first,
                        offset: header_len + pos,
                    })?
                };
                let data_len =
                    MidiMessage::data_len_for_status(status).ok_or(MidiError::InvalidStatus {
                        status,
                        offset: header_len + pos - 1,
                    })?;
                let (message, used) =
                    decode_message_data(status, &body[pos..], header_len + pos, data_len)?;
                pos += used;
                running_status = Some(status);

                track.events.push(MidiTimedEvent {
                    delta_time: pending_delta,
                    channel: (status & 0x0F) + 1,
                    message,
                });
                pending_delta = 0;
            }
        }
    }

    Err(MidiError::invalid_track("missing end-of-track event"))
}
