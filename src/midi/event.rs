use core::fmt::{Display, Formatter, Result as FmtResult};

use crate::midi::{error::MidiError, vlq::MAX_VLQ};

/// Centre position of the pitch wheel (no bend)
pub const PITCH_WHEEL_CENTER: u16 = 0x2000;
/// Largest 14-bit value
pub const MAX_14_BIT: u16 = 0x3FFF;
/// Largest 7-bit data value
pub const MAX_7_BIT: u8 = 0x7F;

/// Channel voice message kinds and their payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MidiMessage {
    NoteOff { note: u8, velocity: u8 },
    NoteOn { note: u8, velocity: u8 },
    /// Polyphonic key pressure
    KeyAfterTouch { note: u8, pressure: u8 },
    ControlChange { controller: u8, value: u8 },
    /// Program change
    PatchChange { patch: u8 },
    ChannelAfterTouch { pressure: u8 },
    /// 14-bit pitch bend, [`PITCH_WHEEL_CENTER`] is no bend
    PitchWheel { pitch: u16 },
}

impl MidiMessage {
    /// Upper nibble of the status byte
    pub const fn command(&self) -> u8 {
        match self {
            MidiMessage::NoteOff { .. } => 0x80,
            MidiMessage::NoteOn { .. } => 0x90,
            MidiMessage::KeyAfterTouch { .. } => 0xA0,
            MidiMessage::ControlChange { .. } => 0xB0,
            MidiMessage::PatchChange { .. } => 0xC0,
            MidiMessage::ChannelAfterTouch { .. } => 0xD0,
            MidiMessage::PitchWheel { .. } => 0xE0,
        }
    }

    /// Number of data bytes following the status byte for a command nibble.
    ///
    /// `None` if `status` is not a channel voice status (0x80..=0xEF).
    pub const fn data_len_for_status(status: u8) -> Option<usize> {
        match status & 0xF0 {
            0x80 | 0x90 | 0xA0 | 0xB0 | 0xE0 => Some(2),
            0xC0 | 0xD0 => Some(1),
            _ => None,
        }
    }

    /// Number of data bytes this message carries
    pub const fn data_len(&self) -> usize {
        match self {
            MidiMessage::PatchChange { .. } | MidiMessage::ChannelAfterTouch { .. } => 1,
            _ => 2,
        }
    }

    /// Data bytes, unmasked. The second byte is 0 for one-byte messages.
    ///
    /// 14-bit values are split low 7 bits first.
    pub const fn raw_data(&self) -> (u8, u8) {
        match *self {
            MidiMessage::NoteOff { note, velocity } | MidiMessage::NoteOn { note, velocity } => {
                (note, velocity)
            }
            MidiMessage::KeyAfterTouch { note, pressure } => (note, pressure),
            MidiMessage::ControlChange { controller, value } => (controller, value),
            MidiMessage::PatchChange { patch } => (patch, 0),
            MidiMessage::ChannelAfterTouch { pressure } => (pressure, 0),
            MidiMessage::PitchWheel { pitch } => ((pitch & 0x7F) as u8, ((pitch >> 7) & 0x7F) as u8),
        }
    }

    /// Rebuild a message from a status byte and its (already 7-bit) data bytes.
    pub const fn from_parts(status: u8, data1: u8, data2: u8) -> Option<Self> {
        let message = match status & 0xF0 {
            0x80 => MidiMessage::NoteOff {
                note: data1,
                velocity: data2,
            },
            0x90 => MidiMessage::NoteOn {
                note: data1,
                velocity: data2,
            },
            0xA0 => MidiMessage::KeyAfterTouch {
                note: data1,
                pressure: data2,
            },
            0xB0 => MidiMessage::ControlChange {
                controller: data1,
                value: data2,
            },
            0xC0 => MidiMessage::PatchChange { patch: data1 },
            0xD0 => MidiMessage::ChannelAfterTouch { pressure: data1 },
            0xE0 => MidiMessage::PitchWheel {
                pitch: ((data2 as u16) << 7) | data1 as u16,
            },
            _ => return None,
        };
        Some(message)
    }

    fn validate(&self) -> Result<(), MidiError> {
        let check = |field: &'static str, value: u8| {
            if value > MAX_7_BIT {
                Err(MidiError::ValueOutOfRange {
                    field,
                    value: value as u32,
                    max: MAX_7_BIT as u32,
                })
            } else {
                Ok(())
            }
        };
        match *self {
            MidiMessage::NoteOff { note, velocity } | MidiMessage::NoteOn { note, velocity } => {
                check("note", note)?;
                check("velocity", velocity)
            }
            MidiMessage::KeyAfterTouch { note, pressure } => {
                check("note", note)?;
                check("pressure", pressure)
            }
            MidiMessage::ControlChange { controller, value } => {
                check("controller", controller)?;
                check("value", value)
            }
            MidiMessage::PatchChange { patch } => check("patch", patch),
            MidiMessage::ChannelAfterTouch { pressure } => check("pressure", pressure),
            MidiMessage::PitchWheel { pitch } => {
                if pitch > MAX_14_BIT {
                    Err(MidiError::ValueOutOfRange {
                        field: "pitch",
                        value: pitch as u32,
                        max: MAX_14_BIT as u32,
                    })
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl Display for MidiMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            MidiMessage::NoteOff { note, velocity } => {
                write!(f, "NoteOff note={} velocity={}", note, velocity)
            }
            MidiMessage::NoteOn { note, velocity } => {
                write!(f, "NoteOn note={} velocity={}", note, velocity)
            }
            MidiMessage::KeyAfterTouch { note, pressure } => {
                write!(f, "KeyAfterTouch note={} pressure={}", note, pressure)
            }
            MidiMessage::ControlChange { controller, value } => {
                write!(f, "ControlChange controller={} value={}", controller, value)
            }
            MidiMessage::PatchChange { patch } => write!(f, "PatchChange patch={}", patch),
            MidiMessage::ChannelAfterTouch { pressure } => {
                write!(f, "ChannelAfterTouch pressure={}", pressure)
            }
            MidiMessage::PitchWheel { pitch } => write!(f, "PitchWheel pitch=0x{:04X}", pitch),
        }
    }
}

/// A channel voice message with its delta time.
///
/// `channel` is 1-based (1..=16), as shown on instruments and sequencers; the
/// wire status byte carries `channel - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MidiTimedEvent {
    /// Ticks since the previous event
    pub delta_time: u32,
    pub channel: u8,
    pub message: MidiMessage,
}

impl MidiTimedEvent {
    /// Build a validated event.
    pub fn new(delta_time: u32, channel: u8, message: MidiMessage) -> Result<Self, MidiError> {
        let event = MidiTimedEvent {
            delta_time,
            channel,
            message,
        };
        event.validate()?;
        Ok(event)
    }

    /// Pitch wheel event
    pub fn pitch_wheel(delta_time: u32, channel: u8, pitch: u16) -> Result<Self, MidiError> {
        Self::new(delta_time, channel, MidiMessage::PitchWheel { pitch })
    }

    /// Pitch wheel event at the centre position
    pub fn pitch_wheel_center(delta_time: u32, channel: u8) -> Result<Self, MidiError> {
        Self::pitch_wheel(delta_time, channel, PITCH_WHEEL_CENTER)
    }

    /// Check every field against its wire range.
    pub fn validate(&self) -> Result<(), MidiError> {
        if !(1..=16).contains(&self.channel) {
            return Err(MidiError::InvalidChannel(self.channel));
        }
        if self.delta_time > MAX_VLQ {
            return Err(MidiError::DeltaTimeTooLarge(self.delta_time));
        }
        self.message.validate()
    }

    /// Status byte: command nibble and zero-based channel.
    ///
    /// Total: an out-of-range channel is masked to 4 bits.
    pub const fn status(&self) -> u8 {
        self.message.command() | (self.channel.wrapping_sub(1) & 0x0F)
    }
}

impl Display for MidiTimedEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "+{} ch{} {}",
            self.delta_time, self.channel, self.message
        )
    }
}
