//! Conversion of single events and event sequences to and from raw bytes, outside of any chunk.
//!
//! Useful to exchange events with MIDI devices (using [`BytesFormat::Device`]) or to inspect
//! the bytes an event is stored as in a track chunk (using [`BytesFormat::File`]).
//!
//! [`BytesFormat::Device`]: ../enum.BytesFormat.html#variant.Device
//! [`BytesFormat::File`]: ../enum.BytesFormat.html#variant.File

use crate::{
    event::{Event, EventKind},
    prelude::*,
    registry::{self, BytesFormat},
    settings::ReadingSettings,
    track::WriterState,
};

/// Decode a single event, including its status byte.
///
/// Trailing bytes after the event are ignored.
pub fn decode(raw: &[u8], settings: &ReadingSettings, format: BytesFormat) -> Result<EventKind> {
    let mut reader = MidiReader::new(raw);
    let mut running_status = None;
    registry::read_with_running_status(&mut reader, &mut running_status, settings, format)
}

/// Decode a sequence of events, honoring running status.
///
/// If `with_delta_times` is set, every event is preceded by its delta time. Otherwise delta
/// times are 0.
pub fn decode_all(
    raw: &[u8],
    settings: &ReadingSettings,
    format: BytesFormat,
    with_delta_times: bool,
) -> Result<Vec<Event>> {
    let mut reader = MidiReader::new(raw);
    let mut running_status = None;
    let mut events = Vec::new();
    while !reader.end_reached() {
        let delta_time = if with_delta_times {
            reader
                .read_vlq_long_number()
                .context("failed to read delta time")?
        } else {
            0
        };
        let kind =
            registry::read_with_running_status(&mut reader, &mut running_status, settings, format)
                .context("failed to read event")?;
        events.push(Event { delta_time, kind });
    }
    Ok(events)
}

/// Encode a single event, always including its status byte.
pub fn encode(
    kind: &EventKind,
    settings: &WritingSettings,
    format: BytesFormat,
) -> StdResult<Vec<u8>, &'static str> {
    let kind = kind.prepare_for_write(settings);
    let mut out = Vec::with_capacity(registry::event_size(
        &kind,
        settings.text_encoding,
        format,
        true,
    ));
    registry::write_event(&kind, &mut out, settings.text_encoding, format, true)?;
    Ok(out)
}

/// Encode a sequence of events, omitting repeated status bytes if the settings ask for running
/// status.
///
/// Unlike track chunks, no event is dropped and no End Of Track event is appended.
pub fn encode_all(
    events: &[Event],
    settings: &WritingSettings,
    format: BytesFormat,
    with_delta_times: bool,
) -> StdResult<Vec<u8>, &'static str> {
    let mut state = WriterState::new(settings);
    let mut out = Vec::new();
    for event in events {
        if with_delta_times {
            out.write_vlq(event.delta_time)?;
        }
        let kind = event.kind.prepare_for_write(settings);
        let write_status = state.status_needed(&kind);
        registry::write_event(&kind, &mut out, settings.text_encoding, format, write_status)?;
    }
    Ok(out)
}
