//! Maps status bytes to the codec that reads the event they introduce.
//!
//! The mapping is a pair of immutable 256-entry tables, one per byte format, computed at compile
//! time.

use crate::{
    event::{ChannelMessage, EventKind},
    meta::MetaEvent,
    prelude::*,
    settings::ReadingSettings,
    system::{SysExEvent, SysExKind, SystemCommon, SystemRealTime},
};

/// The framing of events outside of their delta times.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum BytesFormat {
    /// Events as stored in track chunks: `0xFF` introduces meta events and system exclusive
    /// payloads are length-prefixed.
    File,
    /// Events as sent over the wire to MIDI devices: `0xFF` is System Reset and system
    /// exclusive messages run until their `0xF7` terminator.
    Device,
}
impl Default for BytesFormat {
    fn default() -> BytesFormat {
        BytesFormat::File
    }
}

/// The reader responsible for an event class.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Codec {
    /// Selected by the high nibble of the status byte.
    Channel,
    /// Selected by the type byte following the status byte.
    Meta,
    SysEx(SysExKind),
    Common,
    RealTime(SystemRealTime),
}

const fn build_table(format: BytesFormat) -> [Option<Codec>; 256] {
    let mut table = [None; 256];
    let mut status = 0x80;
    while status < 0xF0 {
        table[status] = Some(Codec::Channel);
        status += 1;
    }
    table[0xF0] = Some(Codec::SysEx(SysExKind::Normal));
    table[0xF7] = Some(Codec::SysEx(SysExKind::Escape));
    table[0xF1] = Some(Codec::Common);
    table[0xF2] = Some(Codec::Common);
    table[0xF3] = Some(Codec::Common);
    table[0xF6] = Some(Codec::Common);
    table[0xF8] = Some(Codec::RealTime(SystemRealTime::TimingClock));
    table[0xFA] = Some(Codec::RealTime(SystemRealTime::Start));
    table[0xFB] = Some(Codec::RealTime(SystemRealTime::Continue));
    table[0xFC] = Some(Codec::RealTime(SystemRealTime::Stop));
    table[0xFE] = Some(Codec::RealTime(SystemRealTime::ActiveSensing));
    table[0xFF] = match format {
        BytesFormat::File => Some(Codec::Meta),
        BytesFormat::Device => Some(Codec::RealTime(SystemRealTime::Reset)),
    };
    table
}

static FILE_CODECS: [Option<Codec>; 256] = build_table(BytesFormat::File);
static DEVICE_CODECS: [Option<Codec>; 256] = build_table(BytesFormat::Device);

/// Look up the codec for a status byte.
///
/// Returns `None` for data bytes and for the undefined `0xF4`, `0xF5`, `0xF9` and `0xFD`.
#[inline]
pub fn resolve(status: u8, format: BytesFormat) -> Option<Codec> {
    match format {
        BytesFormat::File => FILE_CODECS[status as usize],
        BytesFormat::Device => DEVICE_CODECS[status as usize],
    }
}

/// Read the event introduced by `status`, which was already consumed.
pub(crate) fn read_event_kind(
    status: u8,
    reader: &mut MidiReader,
    settings: &ReadingSettings,
    format: BytesFormat,
) -> Result<EventKind> {
    let codec = resolve(status, format).ok_or_else(|| {
        Error::at(
            ErrorKind::UnknownStatus(status),
            reader.position().saturating_sub(1) as u64,
        )
    })?;
    Ok(match codec {
        Codec::Channel => {
            let (channel, message) = ChannelMessage::read(status, reader, settings)?;
            EventKind::Channel { channel, message }
        }
        Codec::Meta => EventKind::Meta(MetaEvent::read(reader, settings)?),
        Codec::SysEx(kind) => EventKind::SysEx(SysExEvent::read(kind, reader, settings, format)?),
        Codec::Common => EventKind::SystemCommon(SystemCommon::read(status, reader, settings)?),
        Codec::RealTime(realtime) => EventKind::SystemRealTime(realtime),
    })
}

/// Read a status byte, falling back to the running status when a data byte is found in its
/// place, and then the event it introduces.
///
/// Channel events become the new running status. Any other event clears it.
pub(crate) fn read_with_running_status(
    reader: &mut MidiReader,
    running_status: &mut Option<u8>,
    settings: &ReadingSettings,
    format: BytesFormat,
) -> Result<EventKind> {
    let pos = reader.position();
    let mut status = reader.read_byte()?;
    if status < 0x80 {
        status = running_status
            .ok_or_else(|| Error::at(ErrorKind::UnexpectedRunningStatus, pos as u64))?;
        reader.rewind(1);
    }
    let kind = read_event_kind(status, reader, settings, format)?;
    *running_status = if kind.is_channel() { Some(status) } else { None };
    Ok(kind)
}

/// Write an event, with or without its status byte.
pub(crate) fn write_event<W: Write>(
    kind: &EventKind,
    out: &mut W,
    encoding: TextEncoding,
    format: BytesFormat,
    write_status: bool,
) -> WriteResult<W> {
    if write_status {
        out.write_byte(kind.status_byte())?;
    }
    kind.write_content(out, encoding, format)
}

/// The amount of bytes `write_event` produces.
pub(crate) fn event_size(
    kind: &EventKind,
    encoding: TextEncoding,
    format: BytesFormat,
    write_status: bool,
) -> usize {
    write_status as usize + kind.content_size(encoding, format)
}
