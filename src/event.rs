//! Track events, channel messages and their codecs.

use crate::{
    meta::MetaEvent,
    prelude::*,
    registry::BytesFormat,
    settings::{InvalidChannelEventParameterValuePolicy, ReadingSettings, SilentNoteOnPolicy},
    system::{SysExEvent, SystemCommon, SystemRealTime},
};
use std::borrow::Cow;

/// A single event of a track chunk.
///
/// Consists of a delta time (in MIDI ticks relative to the previous event of the same track
/// chunk) and the actual event.
///
/// The derived `PartialEq` compares both; use [`content_eq`](#method.content_eq) to ignore the
/// delta time.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct Event {
    /// How many MIDI ticks after the previous event should this event fire.
    pub delta_time: u64,
    /// The type of event along with event-specific data.
    pub kind: EventKind,
}
impl Event {
    #[inline]
    pub fn new(delta_time: u64, kind: impl Into<EventKind>) -> Event {
        Event {
            delta_time,
            kind: kind.into(),
        }
    }

    /// Compare the events ignoring their delta times.
    #[inline]
    pub fn content_eq(&self, other: &Event) -> bool {
        self.kind == other.kind
    }
}

/// The different kinds of events and their associated data.
///
/// It notably does *not* include the timing of the event; the `Event` struct is responsible
/// for this.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum EventKind {
    /// A message associated to a MIDI channel carrying musical data.
    ///
    /// Usually, the bulk of MIDI data is these kind of messages.
    Channel {
        /// The MIDI channel that this event is associated with.
        channel: u4,
        /// The MIDI message type and associated data.
        message: ChannelMessage,
    },
    /// A meta event, giving extra information for correct playback, like tempo, song name,
    /// lyrics, etc...
    Meta(MetaEvent),
    /// A System Exclusive message or an escape sequence, carrying arbitrary data.
    SysEx(SysExEvent),
    /// A System Common message.
    ///
    /// These can be read from track chunks but are never written into them.
    SystemCommon(SystemCommon),
    /// A one-byte System Real-Time message.
    ///
    /// These can be read from track chunks but are never written into them.
    SystemRealTime(SystemRealTime),
}
impl EventKind {
    /// Shorthand for a channel event.
    #[inline]
    pub fn channel(channel: u4, message: ChannelMessage) -> EventKind {
        EventKind::Channel { channel, message }
    }

    /// The status byte this event is written with in a track chunk.
    ///
    /// Note that System Reset shares `0xFF` with meta events, and can only be told apart from
    /// them in the device byte format.
    pub fn status_byte(&self) -> u8 {
        match self {
            EventKind::Channel { channel, message } => {
                message.status_nibble() << 4 | channel.as_int()
            }
            EventKind::Meta(_) => 0xFF,
            EventKind::SysEx(sysex) => sysex.kind.status_byte(),
            EventKind::SystemCommon(common) => common.status_byte(),
            EventKind::SystemRealTime(realtime) => realtime.status_byte(),
        }
    }

    #[inline]
    pub fn is_channel(&self) -> bool {
        matches!(self, EventKind::Channel { .. })
    }

    #[inline]
    pub fn is_end_of_track(&self) -> bool {
        matches!(self, EventKind::Meta(MetaEvent::EndOfTrack))
    }

    /// The amount of bytes this event takes after its status byte.
    ///
    /// For meta events this includes the type byte and the length prefix, for system exclusive
    /// events in the file format the length prefix.
    pub fn content_size(&self, encoding: TextEncoding, format: BytesFormat) -> usize {
        match self {
            EventKind::Channel { message, .. } => message.data_len(),
            EventKind::Meta(meta) => {
                let len = meta.data_size(encoding);
                1 + vlq_len(len as u64) + len
            }
            EventKind::SysEx(sysex) => sysex.content_size(format),
            EventKind::SystemCommon(common) => common.data_len(),
            EventKind::SystemRealTime(_) => 0,
        }
    }

    /// Write everything after the status byte.
    pub(crate) fn write_content<W: Write>(
        &self,
        out: &mut W,
        encoding: TextEncoding,
        format: BytesFormat,
    ) -> WriteResult<W> {
        match self {
            EventKind::Channel { message, .. } => message.write(out),
            EventKind::Meta(meta) => match format {
                BytesFormat::File => meta.write(out, encoding),
                BytesFormat::Device => Err(W::invalid_input(
                    "meta events only exist in midi files",
                )),
            },
            EventKind::SysEx(sysex) => sysex.write_content(out, format),
            EventKind::SystemCommon(common) => common.write(out),
            EventKind::SystemRealTime(_) => Ok(()),
        }
    }

    /// Apply the transformations requested by the writing settings to a single event.
    pub(crate) fn prepare_for_write(&self, settings: &WritingSettings) -> Cow<'_, EventKind> {
        match self {
            EventKind::Channel {
                channel,
                message: ChannelMessage::NoteOff { key, .. },
            } if settings.note_off_as_silent_note_on => Cow::Owned(EventKind::Channel {
                channel: *channel,
                message: ChannelMessage::NoteOn {
                    key: *key,
                    vel: u7::new(0),
                },
            }),
            _ => Cow::Borrowed(self),
        }
    }
}
impl From<MetaEvent> for EventKind {
    fn from(meta: MetaEvent) -> EventKind {
        EventKind::Meta(meta)
    }
}
impl From<SysExEvent> for EventKind {
    fn from(sysex: SysExEvent) -> EventKind {
        EventKind::SysEx(sysex)
    }
}
impl From<SystemCommon> for EventKind {
    fn from(common: SystemCommon) -> EventKind {
        EventKind::SystemCommon(common)
    }
}
impl From<SystemRealTime> for EventKind {
    fn from(realtime: SystemRealTime) -> EventKind {
        EventKind::SystemRealTime(realtime)
    }
}

/// Represents a MIDI message associated to a channel.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum ChannelMessage {
    /// Stop playing a note.
    NoteOff {
        /// The MIDI key to stop playing.
        key: u7,
        /// The velocity with which to stop playing it.
        vel: u7,
    },
    /// Start playing a note.
    NoteOn {
        /// The key to start playing.
        key: u7,
        /// The velocity (strength) with which to press it.
        ///
        /// Note that by convention a `NoteOn` message with a velocity of 0 is equivalent to a
        /// `NoteOff`.
        vel: u7,
    },
    /// Modify the velocity of a note after it has been played.
    Aftertouch {
        /// The key for which to modify its velocity.
        key: u7,
        /// The new velocity for the key.
        vel: u7,
    },
    /// Modify the value of a MIDI controller.
    Controller {
        /// The controller to modify.
        ///
        /// See the MIDI standard for the meaning of each index.
        controller: u7,
        /// The value to set it to.
        value: u7,
    },
    /// Change the program (also known as instrument) for a channel.
    ProgramChange {
        /// The new program (instrument) to use for the channel.
        program: u7,
    },
    /// Change the note velocity of a whole channel at once, without starting new notes.
    ChannelAftertouch {
        /// The new velocity for all notes currently playing in the channel.
        vel: u7,
    },
    /// Set the pitch bend value for the entire channel.
    PitchBend {
        /// The new pitch-bend value.
        bend: PitchBend,
    },
}
impl ChannelMessage {
    /// Channel messages have a known length.
    pub(crate) fn msg_length(status: u8) -> usize {
        const LENGTH_BY_STATUS: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 2, 2, 2, 2, 1, 1, 2, 0];
        LENGTH_BY_STATUS[(status >> 4) as usize] as usize
    }

    /// Read the data bytes of a channel message whose status byte was already consumed.
    pub(crate) fn read(
        status: u8,
        reader: &mut MidiReader,
        settings: &ReadingSettings,
    ) -> Result<(u4, ChannelMessage)> {
        let mut data = [u7::new(0); 2];
        for byte in data.iter_mut().take(Self::msg_length(status)) {
            let pos = reader.position();
            *byte = check_data_byte(
                status,
                reader.read_byte()?,
                settings.invalid_channel_event_parameter_value_policy,
            )
            .map_err(|kind| Error::at(kind, pos as u64))?;
        }
        let channel = u4::from(status);
        let msg = match status >> 4 {
            0x8 => ChannelMessage::NoteOff {
                key: data[0],
                vel: data[1],
            },
            0x9 if data[1] == 0
                && settings.silent_note_on_policy == SilentNoteOnPolicy::NoteOff =>
            {
                ChannelMessage::NoteOff {
                    key: data[0],
                    vel: data[1],
                }
            }
            0x9 => ChannelMessage::NoteOn {
                key: data[0],
                vel: data[1],
            },
            0xA => ChannelMessage::Aftertouch {
                key: data[0],
                vel: data[1],
            },
            0xB => ChannelMessage::Controller {
                controller: data[0],
                value: data[1],
            },
            0xC => ChannelMessage::ProgramChange { program: data[0] },
            0xD => ChannelMessage::ChannelAftertouch { vel: data[0] },
            0xE => {
                //Note the little-endian order, contrasting with the default big-endian order of
                //Standard Midi Files
                let lsb = data[0].as_int() as u16;
                let msb = data[1].as_int() as u16;
                ChannelMessage::PitchBend {
                    bend: PitchBend(u14::from(msb << 7 | lsb)),
                }
            }
            _ => bail!(Error::at(
                ErrorKind::UnknownStatus(status),
                reader.position() as u64
            )),
        };
        Ok((channel, msg))
    }

    /// Get the raw status nibble for this channel message type.
    pub(crate) fn status_nibble(&self) -> u8 {
        match self {
            ChannelMessage::NoteOff { .. } => 0x8,
            ChannelMessage::NoteOn { .. } => 0x9,
            ChannelMessage::Aftertouch { .. } => 0xA,
            ChannelMessage::Controller { .. } => 0xB,
            ChannelMessage::ProgramChange { .. } => 0xC,
            ChannelMessage::ChannelAftertouch { .. } => 0xD,
            ChannelMessage::PitchBend { .. } => 0xE,
        }
    }

    /// The amount of data bytes following the status byte.
    #[inline]
    pub fn data_len(&self) -> usize {
        Self::msg_length(self.status_nibble() << 4)
    }

    /// Write the data part of this message, not including the status.
    pub(crate) fn write<W: Write>(&self, out: &mut W) -> WriteResult<W> {
        match self {
            ChannelMessage::NoteOff { key, vel }
            | ChannelMessage::NoteOn { key, vel }
            | ChannelMessage::Aftertouch { key, vel } => {
                out.write_all(&[key.as_int(), vel.as_int()])
            }
            ChannelMessage::Controller { controller, value } => {
                out.write_all(&[controller.as_int(), value.as_int()])
            }
            ChannelMessage::ProgramChange { program } => out.write_byte(program.as_int()),
            ChannelMessage::ChannelAftertouch { vel } => out.write_byte(vel.as_int()),
            ChannelMessage::PitchBend { bend } => {
                let raw = bend.0.as_int();
                out.write_all(&[(raw & 0x7F) as u8, (raw >> 7) as u8])
            }
        }
    }
}

/// Validate a channel event data byte.
fn check_data_byte(
    status: u8,
    byte: u8,
    policy: InvalidChannelEventParameterValuePolicy,
) -> StdResult<u7, ErrorKind> {
    if let Some(data) = u7::try_from(byte) {
        return Ok(data);
    }
    match policy {
        InvalidChannelEventParameterValuePolicy::Abort => {
            Err(ErrorKind::InvalidChannelEventParameterValue {
                status,
                value: byte,
            })
        }
        InvalidChannelEventParameterValuePolicy::ReadValid => {
            log::warn!("masking channel event parameter {} to 7 bits", byte);
            Ok(u7::from_int_lossy(byte))
        }
        InvalidChannelEventParameterValuePolicy::SnapToLimits => {
            log::warn!("clamping channel event parameter {} to 127", byte);
            Ok(u7::from_int_saturating(byte))
        }
    }
}

/// The value of a pitch bend, represented as 14 bits.
///
/// A value of `0x0000` indicates full bend downwards.
/// A value of `0x2000` indicates no bend.
/// A value of `0x3FFF` indicates full bend upwards.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct PitchBend(pub u14);
impl PitchBend {
    /// The minimum value of `0x0000`, indicating full bend downwards.
    #[inline]
    pub const fn min_raw_value() -> PitchBend {
        PitchBend(u14::new(0x0000))
    }

    /// The middle value of `0x2000`, indicating no bend.
    #[inline]
    pub const fn mid_raw_value() -> PitchBend {
        PitchBend(u14::new(0x2000))
    }

    /// The maximum value of `0x3FFF`, indicating full bend upwards.
    #[inline]
    pub const fn max_raw_value() -> PitchBend {
        PitchBend(u14::new(0x3FFF))
    }

    /// Create a `PitchBend` value from an int in the range `[-0x2000, 0x1FFF]`.
    ///
    /// Integers outside this range will be clamped.
    #[inline]
    pub fn from_int(int: i16) -> PitchBend {
        PitchBend(u14::new((int.clamp(-0x2000, 0x1FFF) + 0x2000) as u16))
    }

    /// Returns an int in the range `[-0x2000, 0x1FFF]`.
    #[inline]
    pub fn as_int(self) -> i16 {
        self.0.as_int() as i16 - 0x2000
    }

    /// Returns an `f32` in the range `[-1.0, 1.0)`.
    #[inline]
    pub fn as_f32(self) -> f32 {
        self.as_int() as f32 * (1.0 / 0x2000 as f32)
    }
}
impl Default for PitchBend {
    fn default() -> PitchBend {
        PitchBend::mid_raw_value()
    }
}
