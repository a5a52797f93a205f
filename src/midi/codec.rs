//! Timed channel events ⇄ bytes.
//!
//! Wire layout of one event: `VLQ(delta_time) status data1 [data2]`.

use crate::midi::{
    error::MidiError,
    event::{MidiMessage, MidiTimedEvent},
    vlq::{MAX_VLQ_LEN, decode_vlq, encode_vlq},
};

/// Longest encoded event: 4-byte VLQ, status and two data bytes
pub const MAX_EVENT_LEN: usize = MAX_VLQ_LEN + 3;

/// Encode `event` into a new buffer.
///
/// # Errors
///
/// `InvalidParameter` for an out-of-range channel, data byte, pitch or delta time.
pub fn encode(event: &MidiTimedEvent) -> Result<Vec<u8>, MidiError> {
    let mut out = Vec::with_capacity(MAX_EVENT_LEN);
    encode_into(event, &mut out)?;
    Ok(out)
}

/// Append the encoding of `event` to `out`, returning the bytes written.
///
/// Nothing is appended when validation fails.
pub fn encode_into(event: &MidiTimedEvent, out: &mut Vec<u8>) -> Result<usize, MidiError> {
    event.validate()?;
    let start = out.len();
    encode_vlq(event.delta_time, out)?;
    encode_short_message(event, out);
    Ok(out.len() - start)
}

/// Status and data bytes of an already validated event
pub(crate) fn encode_short_message(event: &MidiTimedEvent, out: &mut Vec<u8>) {
    let (data1, data2) = event.message.raw_data();
    out.push(event.status());
    out.push(data1);
    if event.message.data_len() == 2 {
        out.push(data2);
    }
}

/// Decode one event from the start of `bytes`.
///
/// # Returns
///
/// The event and the number of bytes it occupied.
///
/// # Errors
///
/// `MalformedMessage` if the delta time is unterminated or too long, the
/// status byte is not a channel voice status, a data byte has its high bit
/// set, or `bytes` ends before the message does. Never reads past `bytes`.
pub fn decode(bytes: &[u8]) -> Result<(MidiTimedEvent, usize), MidiError> {
    let (delta_time, vlq_len) = decode_vlq(bytes, 0)?;
    let status = *bytes.get(vlq_len).ok_or(MidiError::Truncated {
        needed: vlq_len + 1,
        available: bytes.len(),
    })?;
    let data_len = MidiMessage::data_len_for_status(status).ok_or(MidiError::InvalidStatus {
        status,
        offset: vlq_len,
    })?;
    let (message, used) = decode_message_data(status, &bytes[vlq_len + 1..], vlq_len + 1, data_len)?;
    let event = MidiTimedEvent {
        delta_time,
        channel: (status & 0x0F) + 1,
        message,
    };
    Ok((event, vlq_len + 1 + used))
}

/// Decode the data bytes following `status`. `offset` is the absolute
/// position of `data` for error reporting.
pub(crate) fn decode_message_data(
    status: u8,
    data: &[u8],
    offset: usize,
    data_len: usize,
) -> Result<(MidiMessage, usize), MidiError> {
    let data_bytes = data.get(..data_len).ok_or(MidiError::Truncated {
        needed: offset + data_len,
        available: offset + data.len(),
    })?;
    for (i, &byte) in data_bytes.iter().enumerate() {
        if byte & 0x80 != 0 {
            return Err(MidiError::InvalidDataByte {
                byte,
                offset: offset + i,
            });
        }
    }
    let data1 = data_bytes[0];
    let data2 = data_bytes.get(1).copied().unwrap_or(0);
    let message = MidiMessage::from_parts(status, data1, data2).ok_or(MidiError::InvalidStatus {
        status,
        offset: offset.saturating_sub(1),
    })?;
    Ok((message, data_len))
}

/// Pack the short message as `status | data1 << 8 | data2 << 16`.
///
/// The byte order matches [`encode`] (minus the delta time). Total: fields are
/// masked to their wire widths rather than validated.
pub const fn as_packed_u32(event: &MidiTimedEvent) -> u32 {
    let (data1, data2) = event.message.raw_data();
    let data2 = if event.message.data_len() == 2 {
        data2 & 0x7F
    } else {
        0
    };
    event.status() as u32 | ((data1 & 0x7F) as u32) << 8 | (data2 as u32) << 16
}

/// Inverse of [`as_packed_u32`]; the delta time is 0.
pub fn from_packed_u32(raw: u32) -> Result<MidiTimedEvent, MidiError> {
    let [status, data1, data2, _] = raw.to_le_bytes();
    let data_len =
        MidiMessage::data_len_for_status(status).ok_or(MidiError::InvalidStatus { status, offset: 0 })?;
    let (message, _) = decode_message_data(status, &[data1, data2][..data_len], 1, data_len)?;
    Ok(MidiTimedEvent {
        delta_time: 0,
        channel: (status & 0x0F) + 1,
        message,
    })
}
