//! System exclusive, system common and system real-time events.

use crate::{
    meta::read_payload,
    prelude::*,
    primitive::u3,
    registry::BytesFormat,
    settings::{InvalidSystemCommonEventParameterValuePolicy, ReadingSettings},
};

/// Terminates system exclusive messages in the device byte format.
const END_OF_EXCLUSIVE: u8 = 0xF7;

/// Whether a system exclusive event starts a message or continues/escapes one.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum SysExKind {
    /// `0xF0`: a complete system exclusive message, or the first packet of a divided one.
    Normal,
    /// `0xF7`: a continuation packet, or an escape sequence carrying arbitrary bytes.
    Escape,
}
impl SysExKind {
    #[inline]
    pub fn status_byte(self) -> u8 {
        match self {
            SysExKind::Normal => 0xF0,
            SysExKind::Escape => 0xF7,
        }
    }
}

/// A system exclusive event.
///
/// In track chunks the payload is prefixed by its length. In the device byte format a normal
/// message runs up to and including its `0xF7` terminator, which is kept in `data`.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct SysExEvent {
    pub kind: SysExKind,
    /// `None` if the payload was empty and zero-length data is read as null.
    pub data: Option<Vec<u8>>,
}
impl SysExEvent {
    pub fn new(kind: SysExKind, data: impl Into<Vec<u8>>) -> SysExEvent {
        SysExEvent {
            kind,
            data: Some(data.into()),
        }
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        self.data.as_deref().unwrap_or_default()
    }

    /// Whether the device format needs to append a terminator to the payload.
    fn needs_terminator(&self) -> bool {
        self.kind == SysExKind::Normal && self.data().last() != Some(&END_OF_EXCLUSIVE)
    }

    /// The amount of bytes after the status byte.
    pub fn content_size(&self, format: BytesFormat) -> usize {
        let len = self.data().len();
        match format {
            BytesFormat::File => vlq_len(len as u64) + len,
            BytesFormat::Device => len + self.needs_terminator() as usize,
        }
    }

    /// Read everything after the status byte.
    pub(crate) fn read(
        kind: SysExKind,
        reader: &mut MidiReader,
        settings: &ReadingSettings,
        format: BytesFormat,
    ) -> Result<SysExEvent> {
        let data = match format {
            BytesFormat::File => {
                let len = reader
                    .read_vlq_number()
                    .context("failed to read sysex length")?;
                read_payload(reader, settings, len as usize)?
            }
            BytesFormat::Device => {
                let unread = reader.unread();
                let len = match kind {
                    SysExKind::Normal => unread
                        .iter()
                        .position(|&b| b == END_OF_EXCLUSIVE)
                        .map_or(unread.len(), |end| end + 1),
                    SysExKind::Escape => unread
                        .iter()
                        .position(|&b| bit_range(b, 7..8) != 0)
                        .unwrap_or(unread.len()),
                };
                read_payload(reader, settings, len)?
            }
        };
        Ok(SysExEvent {
            kind,
            data: data.map(<[u8]>::to_vec),
        })
    }

    pub(crate) fn write_content<W: Write>(
        &self,
        out: &mut W,
        format: BytesFormat,
    ) -> WriteResult<W> {
        let data = self.data();
        match format {
            BytesFormat::File => {
                out.write_vlq(data.len() as u64)?;
                out.write_all(data)
            }
            BytesFormat::Device => {
                out.write_all(data)?;
                if self.needs_terminator() {
                    out.write_byte(END_OF_EXCLUSIVE)?;
                }
                Ok(())
            }
        }
    }
}

/// The eight message types of a MIDI Time Code quarter frame.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum MtcComponent {
    FramesLow,
    FramesHigh,
    SecondsLow,
    SecondsHigh,
    MinutesLow,
    MinutesHigh,
    HoursLow,
    /// Also carries the frame rate.
    HoursHigh,
}
impl MtcComponent {
    pub fn from_code(code: u3) -> MtcComponent {
        match code.as_int() {
            0 => MtcComponent::FramesLow,
            1 => MtcComponent::FramesHigh,
            2 => MtcComponent::SecondsLow,
            3 => MtcComponent::SecondsHigh,
            4 => MtcComponent::MinutesLow,
            5 => MtcComponent::MinutesHigh,
            6 => MtcComponent::HoursLow,
            _ => MtcComponent::HoursHigh,
        }
    }

    pub fn as_code(self) -> u3 {
        u3::new(self as u8)
    }
}

/// A System Common message, as defined by the MIDI standard.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum SystemCommon {
    /// A MIDI Time Code quarter frame.
    MidiTimeCode { component: MtcComponent, value: u4 },
    /// Set the song position, in MIDI beats (1 beat = 6 MIDI clocks) since the song start.
    SongPositionPointer(u14),
    /// Select a given song index.
    SongSelect(u7),
    /// Request the device to tune itself.
    TuneRequest,
}
impl SystemCommon {
    pub fn status_byte(&self) -> u8 {
        match self {
            SystemCommon::MidiTimeCode { .. } => 0xF1,
            SystemCommon::SongPositionPointer(_) => 0xF2,
            SystemCommon::SongSelect(_) => 0xF3,
            SystemCommon::TuneRequest => 0xF6,
        }
    }

    /// The amount of data bytes following the status byte.
    pub fn data_len(&self) -> usize {
        match self {
            SystemCommon::MidiTimeCode { .. } | SystemCommon::SongSelect(_) => 1,
            SystemCommon::SongPositionPointer(_) => 2,
            SystemCommon::TuneRequest => 0,
        }
    }

    pub(crate) fn read(
        status: u8,
        reader: &mut MidiReader,
        settings: &ReadingSettings,
    ) -> Result<SystemCommon> {
        let policy = settings.invalid_system_common_event_parameter_value_policy;
        Ok(match status {
            0xF1 => {
                let data = read_data_byte(status, reader, policy)?.as_int();
                SystemCommon::MidiTimeCode {
                    component: MtcComponent::from_code(u3::from(data >> 4)),
                    value: u4::from(data),
                }
            }
            0xF2 => {
                let lsb = read_data_byte(status, reader, policy)?.as_int() as u16;
                let msb = read_data_byte(status, reader, policy)?.as_int() as u16;
                SystemCommon::SongPositionPointer(u14::from(msb << 7 | lsb))
            }
            0xF3 => SystemCommon::SongSelect(read_data_byte(status, reader, policy)?),
            0xF6 => SystemCommon::TuneRequest,
            _ => bail!(ErrorKind::UnknownStatus(status)),
        })
    }

    pub(crate) fn write<W: Write>(&self, out: &mut W) -> WriteResult<W> {
        match self {
            SystemCommon::MidiTimeCode { component, value } => {
                out.write_byte(component.as_code().as_int() << 4 | value.as_int())
            }
            SystemCommon::SongPositionPointer(pos) => {
                let raw = pos.as_int();
                out.write_all(&[(raw & 0x7F) as u8, (raw >> 7) as u8])
            }
            SystemCommon::SongSelect(song) => out.write_byte(song.as_int()),
            SystemCommon::TuneRequest => Ok(()),
        }
    }
}

fn read_data_byte(
    status: u8,
    reader: &mut MidiReader,
    policy: InvalidSystemCommonEventParameterValuePolicy,
) -> Result<u7> {
    let pos = reader.position() as u64;
    let byte = reader.read_byte()?;
    if let Some(data) = u7::try_from(byte) {
        return Ok(data);
    }
    match policy {
        InvalidSystemCommonEventParameterValuePolicy::Abort => bail!(Error::at(
            ErrorKind::InvalidSystemCommonEventParameterValue {
                status,
                value: byte,
            },
            pos
        )),
        InvalidSystemCommonEventParameterValuePolicy::SnapToLimits => {
            log::warn!("clamping system common parameter {} to 127", byte);
            Ok(u7::max_value())
        }
    }
}

/// A one-byte System Real-Time message, used for synchronization.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum SystemRealTime {
    /// Sent 24 times per quarter note while playing.
    TimingClock,
    Start,
    Continue,
    Stop,
    /// Sent every 300ms or less by devices that want to signal they are alive.
    ActiveSensing,
    /// Reset the receiver to its power-on state.
    ///
    /// Only exists in the device byte format, since `0xFF` introduces meta events in files.
    Reset,
}
impl SystemRealTime {
    pub fn status_byte(self) -> u8 {
        match self {
            SystemRealTime::TimingClock => 0xF8,
            SystemRealTime::Start => 0xFA,
            SystemRealTime::Continue => 0xFB,
            SystemRealTime::Stop => 0xFC,
            SystemRealTime::ActiveSensing => 0xFE,
            SystemRealTime::Reset => 0xFF,
        }
    }
}
