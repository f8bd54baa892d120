//! Track chunks and the event stream processors that read and write them.

use crate::{
    chunk::TRACK_ID,
    event::{Event, EventKind},
    meta::MetaEvent,
    prelude::*,
    registry::{self, BytesFormat},
    settings::{
        EndOfTrackStoringPolicy, InvalidChunkSizePolicy, MissedEndOfTrackPolicy,
        NotEnoughBytesPolicy, ReadingSettings,
    },
};
use std::{borrow::Cow, convert::Infallible, mem};

/// Appended to every track chunk on write, regardless of the events it holds.
static END_OF_TRACK: EventKind = EventKind::Meta(MetaEvent::EndOfTrack);

/// The content of an `MTrk` chunk.
///
/// The End Of Track event is managed automatically: it is dropped from `events` on read
/// (unless stored by the reading settings) and always written last, even if `events` holds
/// one elsewhere.
#[derive(Clone, PartialEq, Eq, Debug, Default, Hash)]
pub struct TrackChunk {
    pub events: Vec<Event>,
}
impl TrackChunk {
    #[inline]
    pub fn new(events: Vec<Event>) -> TrackChunk {
        TrackChunk { events }
    }

    /// Read `size` bytes worth of events.
    pub(crate) fn read(
        reader: &mut MidiReader,
        size: u32,
        settings: &ReadingSettings,
    ) -> Result<TrackChunk> {
        let end = reader.position().saturating_add(size as usize);
        let mut state = TrackReader::new();
        let mut events = Vec::with_capacity((size as usize).min(reader.remaining()) / 3);
        while let Some(event) = state.next_event(reader, end, settings)? {
            events.push(event);
        }
        state.finish(settings)?;
        Ok(TrackChunk { events })
    }

    /// Exactly the amount of bytes `write_content` produces with the same settings.
    pub fn content_size(&self, settings: &WritingSettings) -> usize {
        let mut size = 0;
        let result: StdResult<(), Infallible> =
            self.process(settings, |delta, kind, write_status| {
                size += vlq_len(delta)
                    + registry::event_size(
                        kind,
                        settings.text_encoding,
                        BytesFormat::File,
                        write_status,
                    );
                Ok(())
            });
        match result {
            Ok(()) => size,
            Err(never) => match never {},
        }
    }

    pub(crate) fn write_content<W: Write>(
        &self,
        out: &mut W,
        settings: &WritingSettings,
    ) -> WriteResult<W> {
        self.process(settings, |delta, kind, write_status| {
            out.write_vlq(delta)?;
            registry::write_event(
                kind,
                out,
                settings.text_encoding,
                BytesFormat::File,
                write_status,
            )
        })
    }

    /// Run the events through the writer state, handing every event that should be written to
    /// `emit` along with its final delta time and whether its status byte is needed.
    fn process<E>(
        &self,
        settings: &WritingSettings,
        mut emit: impl FnMut(u64, &EventKind, bool) -> StdResult<(), E>,
    ) -> StdResult<(), E> {
        let mut state = WriterState::new(settings);
        for event in &self.events {
            if let Some((delta, kind, write_status)) = state.accept(event) {
                emit(delta, &kind, write_status)?;
            }
        }
        let (delta, end) = state.finish();
        emit(delta, end, true)
    }
}
impl From<Vec<Event>> for TrackChunk {
    fn from(events: Vec<Event>) -> TrackChunk {
        TrackChunk { events }
    }
}

/// The state of a track chunk being read: the running status and whether the track is over.
///
/// Shared by the eager reader and by [`EventIter`](struct.EventIter.html).
#[derive(Clone, Debug, Default)]
pub(crate) struct TrackReader {
    running_status: Option<u8>,
    end_of_track_seen: bool,
    finished: bool,
}
impl TrackReader {
    pub(crate) fn new() -> TrackReader {
        TrackReader::default()
    }

    /// Read the next event of the track, or `None` once the track is over.
    ///
    /// `end` is the offset where the track chunk is declared to end.
    pub(crate) fn next_event(
        &mut self,
        reader: &mut MidiReader,
        end: usize,
        settings: &ReadingSettings,
    ) -> Result<Option<Event>> {
        if self.finished || reader.position() >= end || reader.end_reached() {
            self.finished = true;
            return Ok(None);
        }
        let event = match self.read_event(reader, settings) {
            Ok(event) => event,
            Err(err)
                if matches!(err.root_cause().kind(), ErrorKind::NotEnoughBytes { .. })
                    && settings.not_enough_bytes_policy == NotEnoughBytesPolicy::ReadAvailable =>
            {
                log::warn!("track chunk ends with a truncated event: {}", err);
                reader.set_position(reader.len());
                self.finished = true;
                return Ok(None);
            }
            Err(err) => {
                self.finished = true;
                return Err(err);
            }
        };
        if event.kind.is_end_of_track() {
            self.end_of_track_seen = true;
            self.finished = true;
            return Ok(match settings.end_of_track_storing_policy {
                EndOfTrackStoringPolicy::Store => Some(event),
                EndOfTrackStoringPolicy::Discard => None,
            });
        }
        Ok(Some(event))
    }

    fn read_event(&mut self, reader: &mut MidiReader, settings: &ReadingSettings) -> Result<Event> {
        let delta_time = match reader.read_vlq_long_number() {
            Ok(delta) => delta,
            Err(err) if err.kind() == ErrorKind::InvalidVlq => {
                log::warn!("delta time is too wide, reading as 0");
                0
            }
            Err(err) => return Err(err).context("failed to read delta time"),
        };
        let kind = registry::read_with_running_status(
            reader,
            &mut self.running_status,
            settings,
            BytesFormat::File,
        )
        .context("failed to read event")?;
        Ok(Event { delta_time, kind })
    }

    /// Apply the missing End Of Track policy once the track is over.
    pub(crate) fn finish(&self, settings: &ReadingSettings) -> Result<()> {
        if self.end_of_track_seen {
            return Ok(());
        }
        match settings.missed_end_of_track_policy {
            MissedEndOfTrackPolicy::Abort => bail!(ErrorKind::MissedEndOfTrack),
            MissedEndOfTrackPolicy::Ignore => {
                log::debug!("track chunk has no end of track event");
                Ok(())
            }
        }
    }
}

/// The state of a track chunk being written.
///
/// Decides which events are dropped, folds the delta times of source End Of Track events into
/// the next written event and tracks the running status.
pub(crate) struct WriterState<'s> {
    settings: &'s WritingSettings,
    running_status: Option<u8>,
    pending_delta: u64,
    skip_default_tempo: bool,
    skip_default_key_signature: bool,
    skip_default_time_signature: bool,
}
impl<'s> WriterState<'s> {
    pub(crate) fn new(settings: &'s WritingSettings) -> WriterState<'s> {
        WriterState {
            settings,
            running_status: None,
            pending_delta: 0,
            skip_default_tempo: settings.delete_default_set_tempo,
            skip_default_key_signature: settings.delete_default_key_signature,
            skip_default_time_signature: settings.delete_default_time_signature,
        }
    }

    /// Returns the delta time, the event as it should be written and whether its status byte is
    /// needed, or `None` if the event is dropped.
    pub(crate) fn accept<'e>(
        &mut self,
        event: &'e Event,
    ) -> Option<(u64, Cow<'e, EventKind>, bool)> {
        if event.kind.is_end_of_track() {
            self.pending_delta = self.pending_delta.saturating_add(event.delta_time);
            return None;
        }
        if self.should_drop(&event.kind) {
            return None;
        }
        let kind = event.kind.prepare_for_write(self.settings);
        let delta = event
            .delta_time
            .saturating_add(mem::take(&mut self.pending_delta));
        let write_status = self.status_needed(&kind);
        Some((delta, kind, write_status))
    }

    fn should_drop(&mut self, kind: &EventKind) -> bool {
        match kind {
            EventKind::SystemCommon(_) | EventKind::SystemRealTime(_) => true,
            EventKind::Meta(MetaEvent::Unknown { .. }) => self.settings.delete_unknown_meta_events,
            EventKind::Meta(MetaEvent::SetTempo(tempo)) => {
                skip_default(&mut self.skip_default_tempo, tempo.is_default())
            }
            EventKind::Meta(MetaEvent::KeySignature(sig)) => {
                skip_default(&mut self.skip_default_key_signature, sig.is_default())
            }
            EventKind::Meta(MetaEvent::TimeSignature(sig)) => {
                skip_default(&mut self.skip_default_time_signature, sig.is_default())
            }
            _ => false,
        }
    }

    /// Update the running status with an event about to be written, and return whether its
    /// status byte has to be written.
    pub(crate) fn status_needed(&mut self, kind: &EventKind) -> bool {
        if kind.is_channel() {
            let status = kind.status_byte();
            let needed = !self.settings.use_running_status || self.running_status != Some(status);
            self.running_status = Some(status);
            needed
        } else {
            self.running_status = None;
            true
        }
    }

    /// The trailing End Of Track event, carrying the delta times of the source End Of Track
    /// events since the last written event.
    pub(crate) fn finish(self) -> (u64, &'static EventKind) {
        (self.pending_delta, &END_OF_TRACK)
    }
}

/// Default-valued events are dropped until the first non-default one of the same kind.
fn skip_default(skipping: &mut bool, is_default: bool) -> bool {
    if *skipping && !is_default {
        *skipping = false;
    }
    *skipping
}

/// An iterator over the events of a single track chunk, decoding them on demand.
///
/// Yields an error at most once, after which it is exhausted.
#[derive(Clone, Debug)]
pub struct EventIter<'a> {
    reader: MidiReader<'a>,
    state: TrackReader,
    settings: &'a ReadingSettings,
    done: bool,
}
impl<'a> EventIter<'a> {
    /// Iterate over the raw content of a track chunk, without its id and size.
    pub fn new(raw: &'a [u8], settings: &'a ReadingSettings) -> EventIter<'a> {
        EventIter {
            reader: MidiReader::new(raw),
            state: TrackReader::new(),
            settings,
            done: false,
        }
    }

    /// The bytes that have not been decoded yet.
    #[inline]
    pub fn unread(&self) -> &'a [u8] {
        self.reader.unread()
    }

    /// The current running status of the track.
    #[inline]
    pub fn running_status(&self) -> Option<u8> {
        self.state.running_status
    }

    /// Decode the remaining events into a track chunk.
    pub fn collect_track(self) -> Result<TrackChunk> {
        self.collect::<Result<Vec<_>>>().map(TrackChunk::new)
    }

    /// Bytes left over after the track is over are subject to the chunk size policy.
    fn check_size(&self) -> Result<()> {
        if self.reader.end_reached() {
            return Ok(());
        }
        match self.settings.invalid_chunk_size_policy {
            InvalidChunkSizePolicy::Abort => bail!(ErrorKind::InvalidChunkSize {
                id: TRACK_ID,
                expected: self.reader.len() as u32,
                actual: self.reader.position() as u64,
            }),
            InvalidChunkSizePolicy::Ignore => {
                log::warn!(
                    "ignoring {} bytes after the end of the track",
                    self.reader.remaining()
                );
                Ok(())
            }
        }
    }
}
impl<'a> Iterator for EventIter<'a> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Result<Event>> {
        if self.done {
            return None;
        }
        let end = self.reader.len();
        match self.state.next_event(&mut self.reader, end, self.settings) {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                self.state
                    .finish(self.settings)
                    .and_then(|()| self.check_size())
                    .err()
                    .map(Err)
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
