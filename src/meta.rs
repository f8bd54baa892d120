//! Meta events: non-musical information stored in track chunks, such as tempo, time signature
//! or lyrics.

use crate::{
    prelude::*,
    primitive::{u2, Fps, SmpteTime},
    settings::{
        InvalidMetaEventParameterValuePolicy, NotEnoughBytesPolicy, ReadingSettings,
        ZeroLengthDataPolicy,
    },
};

/// The meta event type bytes defined by the SMF standard.
pub mod meta_type {
    pub const SEQUENCE_NUMBER: u8 = 0x00;
    pub const TEXT: u8 = 0x01;
    pub const COPYRIGHT_NOTICE: u8 = 0x02;
    pub const SEQUENCE_TRACK_NAME: u8 = 0x03;
    pub const INSTRUMENT_NAME: u8 = 0x04;
    pub const LYRIC: u8 = 0x05;
    pub const MARKER: u8 = 0x06;
    pub const CUE_POINT: u8 = 0x07;
    pub const PROGRAM_NAME: u8 = 0x08;
    pub const DEVICE_NAME: u8 = 0x09;
    pub const CHANNEL_PREFIX: u8 = 0x20;
    pub const PORT_PREFIX: u8 = 0x21;
    pub const END_OF_TRACK: u8 = 0x2F;
    pub const SET_TEMPO: u8 = 0x51;
    pub const SMPTE_OFFSET: u8 = 0x54;
    pub const TIME_SIGNATURE: u8 = 0x58;
    pub const KEY_SIGNATURE: u8 = 0x59;
    pub const SEQUENCER_SPECIFIC: u8 = 0x7F;
}

/// A meta event, as defined by the SMF standard.
///
/// On the wire every meta event is `0xFF`, a type byte, a variable-length payload length and
/// the payload itself.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub enum MetaEvent {
    /// For `Format::Sequential` MIDI file types, `SequenceNumber` can be empty, and defaults to
    /// the track index.
    SequenceNumber(Option<u16>),
    /// One of the text events, which all share the same layout.
    Text {
        kind: TextKind,
        /// `None` if the payload was empty and zero-length data is read as null.
        text: Option<String>,
    },
    /// The MIDI channel the following events are intended for.
    ChannelPrefix(u8),
    /// The MIDI port the track is intended to be played on.
    PortPrefix(u8),
    /// Obligatory at track end.
    EndOfTrack,
    SetTempo(SetTempo),
    /// The SMPTE time at which the track is supposed to start.
    SmpteOffset(SmpteTime),
    TimeSignature(TimeSignature),
    KeySignature(KeySignature),
    /// Arbitrary data intended for the sequencer.
    SequencerSpecific(Option<Vec<u8>>),
    /// A meta event with an unknown type byte, or a known one with a payload too short for its
    /// layout.
    ///
    /// Kept verbatim so that it is written back unchanged.
    Unknown {
        status_byte: u8,
        data: Option<Vec<u8>>,
    },
}
impl MetaEvent {
    /// Shorthand for a text event.
    pub fn text(kind: TextKind, text: impl Into<String>) -> MetaEvent {
        MetaEvent::Text {
            kind,
            text: Some(text.into()),
        }
    }

    /// The type byte that follows `0xFF`.
    pub fn type_byte(&self) -> u8 {
        use self::meta_type::*;
        match self {
            MetaEvent::SequenceNumber(_) => SEQUENCE_NUMBER,
            MetaEvent::Text { kind, .. } => kind.type_byte(),
            MetaEvent::ChannelPrefix(_) => CHANNEL_PREFIX,
            MetaEvent::PortPrefix(_) => PORT_PREFIX,
            MetaEvent::EndOfTrack => END_OF_TRACK,
            MetaEvent::SetTempo(_) => SET_TEMPO,
            MetaEvent::SmpteOffset(_) => SMPTE_OFFSET,
            MetaEvent::TimeSignature(_) => TIME_SIGNATURE,
            MetaEvent::KeySignature(_) => KEY_SIGNATURE,
            MetaEvent::SequencerSpecific(_) => SEQUENCER_SPECIFIC,
            MetaEvent::Unknown { status_byte, .. } => *status_byte,
        }
    }

    /// The length of the payload.
    pub fn data_size(&self, encoding: TextEncoding) -> usize {
        match self {
            MetaEvent::SequenceNumber(num) => num.map_or(0, |_| 2),
            MetaEvent::Text { text, .. } => text.as_deref().map_or(0, |t| encoding.encoded_len(t)),
            MetaEvent::ChannelPrefix(_) | MetaEvent::PortPrefix(_) => 1,
            MetaEvent::EndOfTrack => 0,
            MetaEvent::SetTempo(_) => 3,
            MetaEvent::SmpteOffset(_) => 5,
            MetaEvent::TimeSignature(_) => 4,
            MetaEvent::KeySignature(_) => 2,
            MetaEvent::SequencerSpecific(data) | MetaEvent::Unknown { data, .. } => {
                data.as_ref().map_or(0, Vec::len)
            }
        }
    }

    /// Read the type byte, length and payload. The `0xFF` status byte was already consumed.
    pub(crate) fn read(reader: &mut MidiReader, settings: &ReadingSettings) -> Result<MetaEvent> {
        let type_byte = reader
            .read_byte()
            .context("failed to read meta event type")?;
        let size = reader
            .read_vlq_number()
            .context("failed to read meta event length")? as usize;
        let start = reader.position();
        let meta = Self::read_data(type_byte, size, reader, settings)?;
        let consumed = reader.position() - start;
        if consumed < size {
            reader.skip(size - consumed);
        }
        Ok(meta)
    }

    fn read_data(
        type_byte: u8,
        size: usize,
        reader: &mut MidiReader,
        settings: &ReadingSettings,
    ) -> Result<MetaEvent> {
        use self::meta_type::*;
        let policy = settings.invalid_meta_event_parameter_value_policy;
        Ok(match type_byte {
            SEQUENCE_NUMBER if size == 0 => MetaEvent::SequenceNumber(None),
            SEQUENCE_NUMBER if size >= 2 => MetaEvent::SequenceNumber(Some(reader.read_word()?)),
            0x01..=0x09 => {
                let kind = TextKind::from_type_byte(type_byte)
                    .ok_or(ErrorKind::UnknownStatus(type_byte))?;
                let text = read_payload(reader, settings, size)?
                    .map(|bytes| settings.text_encoding.decode(bytes));
                MetaEvent::Text { kind, text }
            }
            CHANNEL_PREFIX if size >= 1 => MetaEvent::ChannelPrefix(reader.read_byte()?),
            PORT_PREFIX if size >= 1 => MetaEvent::PortPrefix(reader.read_byte()?),
            END_OF_TRACK => MetaEvent::EndOfTrack,
            SET_TEMPO if size >= 3 => MetaEvent::SetTempo(SetTempo(reader.read_3byte_dword()?)),
            SMPTE_OFFSET if size >= 5 => MetaEvent::SmpteOffset(read_smpte(reader, policy)?),
            TIME_SIGNATURE if size >= 2 => {
                MetaEvent::TimeSignature(TimeSignature::read(reader, size, policy)?)
            }
            KEY_SIGNATURE if size >= 2 => {
                MetaEvent::KeySignature(KeySignature::read(reader, policy)?)
            }
            SEQUENCER_SPECIFIC => MetaEvent::SequencerSpecific(
                read_payload(reader, settings, size)?.map(<[u8]>::to_vec),
            ),
            _ => MetaEvent::Unknown {
                status_byte: type_byte,
                data: read_payload(reader, settings, size)?.map(<[u8]>::to_vec),
            },
        })
    }

    /// Write the type byte, length and payload, but not the `0xFF` status byte.
    pub(crate) fn write<W: Write>(&self, out: &mut W, encoding: TextEncoding) -> WriteResult<W> {
        let type_byte = self.type_byte();
        let write_msg = |out: &mut W, data: &[u8]| -> WriteResult<W> {
            out.write_byte(type_byte)?;
            out.write_vlq(data.len() as u64)?;
            out.write_all(data)
        };
        match self {
            MetaEvent::SequenceNumber(None) | MetaEvent::EndOfTrack => write_msg(out, &[]),
            MetaEvent::SequenceNumber(Some(num)) => write_msg(out, &num.to_be_bytes()),
            MetaEvent::Text { text, .. } => {
                write_msg(out, &encoding.encode(text.as_deref().unwrap_or_default()))
            }
            MetaEvent::ChannelPrefix(byte) | MetaEvent::PortPrefix(byte) => {
                write_msg(out, &[*byte])
            }
            MetaEvent::SetTempo(tempo) => {
                out.write_byte(type_byte)?;
                out.write_vlq(3)?;
                out.write_3byte_dword(tempo.0)
            }
            MetaEvent::SmpteOffset(smpte) => write_msg(out, &smpte.encode()),
            MetaEvent::TimeSignature(sig) => write_msg(out, &sig.encode()),
            MetaEvent::KeySignature(sig) => {
                out.write_byte(type_byte)?;
                out.write_vlq(2)?;
                out.write_sbyte(sig.key())?;
                out.write_byte(sig.scale())
            }
            MetaEvent::SequencerSpecific(data) | MetaEvent::Unknown { data, .. } => {
                write_msg(out, data.as_deref().unwrap_or_default())
            }
        }
    }
}

/// Read a variable-size payload, honoring the zero-length and not-enough-bytes policies.
pub(crate) fn read_payload<'a>(
    reader: &mut MidiReader<'a>,
    settings: &ReadingSettings,
    size: usize,
) -> Result<Option<&'a [u8]>> {
    if size == 0 {
        return Ok(match settings.zero_length_data_policy {
            ZeroLengthDataPolicy::ReadAsEmpty => Some(&[][..]),
            ZeroLengthDataPolicy::ReadAsNull => None,
        });
    }
    if size > reader.remaining() {
        match settings.not_enough_bytes_policy {
            NotEnoughBytesPolicy::Abort => return reader.read_exact(size).map(Some),
            NotEnoughBytesPolicy::ReadAvailable => {
                log::warn!(
                    "payload declares {} bytes but only {} are available",
                    size,
                    reader.remaining()
                );
            }
        }
    }
    Ok(Some(reader.read_bytes(size)))
}

/// Apply the meta parameter policy to a value that must be inside `min..=max`.
fn check_meta_param(
    meta_type: u8,
    parameter: &'static str,
    value: i64,
    min: i64,
    max: i64,
    policy: InvalidMetaEventParameterValuePolicy,
) -> StdResult<i64, ErrorKind> {
    if (min..=max).contains(&value) {
        return Ok(value);
    }
    match policy {
        InvalidMetaEventParameterValuePolicy::Abort => {
            Err(ErrorKind::InvalidMetaEventParameterValue {
                meta_type,
                parameter,
                value,
            })
        }
        InvalidMetaEventParameterValuePolicy::SnapToLimits => {
            log::warn!("snapping meta event {} {} into {}..={}", parameter, value, min, max);
            Ok(value.clamp(min, max))
        }
    }
}

fn read_smpte(
    reader: &mut MidiReader,
    policy: InvalidMetaEventParameterValuePolicy,
) -> Result<SmpteTime> {
    let pos = reader.position() as u64;
    let data = reader.read_exact(5)?;
    let check = |parameter, value: u8, max: u8| {
        check_meta_param(
            meta_type::SMPTE_OFFSET,
            parameter,
            value as i64,
            0,
            max as i64,
            policy,
        )
        .map(|value| value as u8)
        .map_err(|kind| Error::at(kind, pos))
    };
    let fps = Fps::from_code(u2::from(bit_range(data[0], 5..7)));
    let hour = check("hours", bit_range(data[0], 0..5), SmpteTime::MAX_HOUR)?;
    let minute = check("minutes", data[1], SmpteTime::MAX_MINUTE)?;
    let second = check("seconds", data[2], SmpteTime::MAX_SECOND)?;
    let frame = check("frames", data[3], fps.max_frame())?;
    let subframe = check("subframes", data[4], SmpteTime::MAX_SUBFRAME)?;
    SmpteTime::new(hour, minute, second, frame, subframe, fps).ok_or_else(|| {
        Error::at(
            ErrorKind::InvalidMetaEventParameterValue {
                meta_type: meta_type::SMPTE_OFFSET,
                parameter: "time",
                value: data[0] as i64,
            },
            pos,
        )
    })
}

/// The flavors of text event. They share the same layout and only differ in their type byte.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum TextKind {
    /// Arbitrary text associated to an instant.
    Text,
    /// A copyright notice.
    CopyrightNotice,
    /// The name of the sequence or of the track.
    SequenceTrackName,
    /// The name of the current instrument.
    InstrumentName,
    /// Arbitrary lyric information associated to an instant.
    Lyric,
    /// Arbitrary marker text associated to an instant.
    Marker,
    /// Arbitrary cue point text associated to an instant.
    CuePoint,
    /// The name of the current program.
    ProgramName,
    /// Name of the device that this track was intended to be played with.
    DeviceName,
}
impl TextKind {
    pub fn from_type_byte(type_byte: u8) -> Option<TextKind> {
        use self::meta_type::*;
        Some(match type_byte {
            TEXT => TextKind::Text,
            COPYRIGHT_NOTICE => TextKind::CopyrightNotice,
            SEQUENCE_TRACK_NAME => TextKind::SequenceTrackName,
            INSTRUMENT_NAME => TextKind::InstrumentName,
            LYRIC => TextKind::Lyric,
            MARKER => TextKind::Marker,
            CUE_POINT => TextKind::CuePoint,
            PROGRAM_NAME => TextKind::ProgramName,
            DEVICE_NAME => TextKind::DeviceName,
            _ => return None,
        })
    }

    pub fn type_byte(self) -> u8 {
        use self::meta_type::*;
        match self {
            TextKind::Text => TEXT,
            TextKind::CopyrightNotice => COPYRIGHT_NOTICE,
            TextKind::SequenceTrackName => SEQUENCE_TRACK_NAME,
            TextKind::InstrumentName => INSTRUMENT_NAME,
            TextKind::Lyric => LYRIC,
            TextKind::Marker => MARKER,
            TextKind::CuePoint => CUE_POINT,
            TextKind::ProgramName => PROGRAM_NAME,
            TextKind::DeviceName => DEVICE_NAME,
        }
    }
}

/// Amount of microseconds per quarter note, as a 24-bit integer.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct SetTempo(u24);
impl SetTempo {
    /// 500000 microseconds per quarter note, that is, 120 beats per minute.
    pub const DEFAULT: SetTempo = SetTempo(u24::new(500_000));

    /// Fails if the value does not fit in 24 bits.
    pub fn new(microseconds_per_quarter_note: u32) -> Result<SetTempo> {
        u24::try_from(microseconds_per_quarter_note)
            .map(SetTempo)
            .ok_or_else(|| {
                ErrorKind::InvalidValue {
                    name: "microseconds per quarter note",
                    value: microseconds_per_quarter_note as i64,
                }
                .into()
            })
    }

    #[inline]
    pub fn microseconds_per_quarter_note(self) -> u32 {
        self.0.as_int()
    }

    /// Fails, leaving the tempo untouched, if the value does not fit in 24 bits.
    pub fn set_microseconds_per_quarter_note(&mut self, value: u32) -> Result<()> {
        *self = SetTempo::new(value)?;
        Ok(())
    }

    #[inline]
    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }
}
impl Default for SetTempo {
    fn default() -> SetTempo {
        Self::DEFAULT
    }
}

/// A time signature, such as 3/4 or 6/8.
///
/// The denominator is stored as the actual note value (2, 4, 8...) and written as its power of
/// two.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct TimeSignature {
    pub numerator: u8,
    denominator: u8,
    /// MIDI clocks per metronome click.
    pub clocks_per_click: u8,
    /// Notated 32nd notes per MIDI quarter note.
    pub thirty_second_notes_per_beat: u8,
}
impl TimeSignature {
    /// 4/4, 24 clocks per click and 8 32nd notes per beat.
    pub const DEFAULT: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
        clocks_per_click: 24,
        thirty_second_notes_per_beat: 8,
    };

    /// Fails if `denominator` is not a power of two.
    pub fn new(
        numerator: u8,
        denominator: u8,
        clocks_per_click: u8,
        thirty_second_notes_per_beat: u8,
    ) -> Result<TimeSignature> {
        let mut sig = TimeSignature {
            numerator,
            clocks_per_click,
            thirty_second_notes_per_beat,
            ..Self::DEFAULT
        };
        sig.set_denominator(denominator)?;
        Ok(sig)
    }

    #[inline]
    pub fn denominator(&self) -> u8 {
        self.denominator
    }

    /// Fails, leaving the signature untouched, if `denominator` is not a power of two.
    pub fn set_denominator(&mut self, denominator: u8) -> Result<()> {
        ensure!(
            denominator.is_power_of_two(),
            ErrorKind::InvalidValue {
                name: "time signature denominator",
                value: denominator as i64,
            }
        );
        self.denominator = denominator;
        Ok(())
    }

    #[inline]
    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    /// Clocks per click and 32nd notes per beat are only present in payloads of 4 or more bytes.
    fn read(
        reader: &mut MidiReader,
        size: usize,
        policy: InvalidMetaEventParameterValuePolicy,
    ) -> Result<TimeSignature> {
        let numerator = reader.read_byte()?;
        let pos = reader.position() as u64;
        let exponent = check_meta_param(
            meta_type::TIME_SIGNATURE,
            "denominator",
            reader.read_byte()? as i64,
            0,
            7,
            policy,
        )
        .map_err(|kind| Error::at(kind, pos))?;
        let mut sig = TimeSignature {
            numerator,
            denominator: 1 << exponent,
            ..Self::DEFAULT
        };
        if size >= 4 {
            sig.clocks_per_click = reader.read_byte()?;
            sig.thirty_second_notes_per_beat = reader.read_byte()?;
        }
        Ok(sig)
    }

    fn encode(&self) -> [u8; 4] {
        [
            self.numerator,
            self.denominator.trailing_zeros() as u8,
            self.clocks_per_click,
            self.thirty_second_notes_per_beat,
        ]
    }
}
impl Default for TimeSignature {
    fn default() -> TimeSignature {
        Self::DEFAULT
    }
}

/// A key signature.
///
/// `key` is the amount of flats (negative) or sharps (positive), `scale` is 0 for major and 1
/// for minor.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Default)]
pub struct KeySignature {
    key: i8,
    scale: u8,
}
impl KeySignature {
    pub const MIN_KEY: i8 = -7;
    pub const MAX_KEY: i8 = 7;
    pub const MAX_SCALE: u8 = 1;

    /// C major.
    pub const DEFAULT: KeySignature = KeySignature { key: 0, scale: 0 };

    pub fn new(key: i8, scale: u8) -> Result<KeySignature> {
        let mut sig = Self::DEFAULT;
        sig.set_key(key)?;
        sig.set_scale(scale)?;
        Ok(sig)
    }

    #[inline]
    pub fn key(&self) -> i8 {
        self.key
    }

    #[inline]
    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn set_key(&mut self, key: i8) -> Result<()> {
        ensure!(
            (Self::MIN_KEY..=Self::MAX_KEY).contains(&key),
            ErrorKind::InvalidValue {
                name: "key signature key",
                value: key as i64,
            }
        );
        self.key = key;
        Ok(())
    }

    pub fn set_scale(&mut self, scale: u8) -> Result<()> {
        ensure!(
            scale <= Self::MAX_SCALE,
            ErrorKind::InvalidValue {
                name: "key signature scale",
                value: scale as i64,
            }
        );
        self.scale = scale;
        Ok(())
    }

    #[inline]
    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }

    fn read(
        reader: &mut MidiReader,
        policy: InvalidMetaEventParameterValuePolicy,
    ) -> Result<KeySignature> {
        let pos = reader.position() as u64;
        let key = reader.read_sbyte()?;
        let scale = reader.read_byte()?;
        let check = |parameter, value: i64, min: i64, max: i64| {
            check_meta_param(meta_type::KEY_SIGNATURE, parameter, value, min, max, policy)
                .map_err(|kind| Error::at(kind, pos))
        };
        Ok(KeySignature {
            key: check(
                "key",
                key as i64,
                Self::MIN_KEY as i64,
                Self::MAX_KEY as i64,
            )? as i8,
            scale: check("scale", scale as i64, 0, Self::MAX_SCALE as i64)? as u8,
        })
    }
}
