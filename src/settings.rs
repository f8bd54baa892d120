//! Policies that decide how reading reacts to non-compliant input, and options that control how
//! events are written.
//!
//! Every read and write entry point takes its settings by reference. There is no global state.

use std::borrow::Cow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! policy {
    {
        $(#[$attr:meta])*
        $name:ident {
            $( $(#[$vattr:meta])* $variant:ident ),* $(,)?
        } default $default:ident
    } => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub enum $name {
            $( $(#[$vattr])* $variant, )*
        }
        impl Default for $name {
            #[inline]
            fn default() -> $name {
                $name::$default
            }
        }
    };
}

policy! {
    /// What to do when the header chunk declares a file format other than 0, 1 or 2.
    UnknownFileFormatPolicy {
        /// Fail with `ErrorKind::UnknownFileFormat`.
        Abort,
        /// Treat the file as format 1.
        SnapToDefault,
    } default SnapToDefault
}

policy! {
    /// What to do when the bytes consumed by a chunk differ from its declared length.
    InvalidChunkSizePolicy {
        /// Fail with `ErrorKind::InvalidChunkSize`.
        Abort,
        /// Skip the unread rest of the chunk, if any, and continue.
        Ignore,
    } default Abort
}

policy! {
    /// What to do when a track chunk has no End Of Track event.
    MissedEndOfTrackPolicy {
        /// Fail with `ErrorKind::MissedEndOfTrack`.
        Abort,
        /// Accept the events read so far.
        Ignore,
    } default Ignore
}

policy! {
    /// Whether the End Of Track event of a track chunk is kept in its event list.
    ///
    /// It is always written back regardless.
    EndOfTrackStoringPolicy {
        Store,
        Discard,
    } default Discard
}

policy! {
    /// What to do when the input ends in the middle of a value.
    NotEnoughBytesPolicy {
        /// Fail with `ErrorKind::NotEnoughBytes`.
        Abort,
        /// Keep everything read up to that point, including partially read payloads.
        ReadAvailable,
    } default Abort
}

policy! {
    /// How to represent the payload of a text, sequencer specific, unknown meta or system
    /// exclusive event whose length is zero.
    ZeroLengthDataPolicy {
        /// `Some` of an empty string or byte vector.
        ReadAsEmpty,
        /// `None`.
        ReadAsNull,
    } default ReadAsEmpty
}

policy! {
    /// What to do with chunks other than `MThd` and `MTrk`.
    UnknownChunkIdPolicy {
        /// Keep the chunk as an `UnknownChunk`.
        ReadAsUnknownChunk,
        /// Drop the chunk.
        Skip,
        /// Fail with `ErrorKind::UnknownChunkId`.
        Abort,
    } default ReadAsUnknownChunk
}

policy! {
    /// What to do with track chunks beyond the amount declared in the header chunk.
    ExtraTrackChunkPolicy {
        Read,
        Skip,
    } default Read
}

policy! {
    /// What to do when the amount of track chunks differs from the header's count.
    UnexpectedTrackChunksCountPolicy {
        Ignore,
        /// Fail with `ErrorKind::UnexpectedTrackChunksCount`.
        Abort,
    } default Ignore
}

policy! {
    /// What to do when a file does not start with a header chunk.
    NoHeaderChunkPolicy {
        /// Fail with `ErrorKind::NoHeaderChunk`.
        Abort,
        /// Read the chunks anyway, with a default format and time division.
        Ignore,
    } default Abort
}

policy! {
    /// What to do with channel event data bytes that have their top bit set.
    InvalidChannelEventParameterValuePolicy {
        /// Fail with `ErrorKind::InvalidChannelEventParameterValue`.
        Abort,
        /// Keep the bottom 7 bits.
        ReadValid,
        /// Clamp to 127.
        SnapToLimits,
    } default Abort
}

policy! {
    /// What to do with out-of-range meta event fields.
    InvalidMetaEventParameterValuePolicy {
        /// Fail with `ErrorKind::InvalidMetaEventParameterValue`.
        Abort,
        /// Clamp to the nearest valid value.
        SnapToLimits,
    } default Abort
}

policy! {
    /// What to do with out-of-range system common event data.
    InvalidSystemCommonEventParameterValuePolicy {
        /// Fail with `ErrorKind::InvalidSystemCommonEventParameterValue`.
        Abort,
        /// Clamp to the nearest valid value.
        SnapToLimits,
    } default Abort
}

policy! {
    /// How to read Note On events with a velocity of zero.
    SilentNoteOnPolicy {
        /// Read them as Note Off events with a velocity of zero.
        NoteOff,
        /// Keep them as Note On events.
        NoteOn,
    } default NoteOn
}

policy! {
    /// The encoding of text meta events.
    ///
    /// The SMF standard mandates ASCII, but files in the wild use all kinds of encodings.
    TextEncoding {
        /// Every byte maps to the code point of the same value, so any input round-trips
        /// unchanged. Characters above `U+00FF` are written as `?`.
        Latin1,
        /// Invalid sequences are replaced with `U+FFFD` when reading.
        Utf8,
    } default Latin1
}
impl TextEncoding {
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    pub fn encode(self, text: &str) -> Cow<'_, [u8]> {
        match self {
            TextEncoding::Latin1 if text.is_ascii() => Cow::Borrowed(text.as_bytes()),
            TextEncoding::Latin1 => Cow::Owned(
                text.chars()
                    .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                    .collect(),
            ),
            TextEncoding::Utf8 => Cow::Borrowed(text.as_bytes()),
        }
    }

    /// The amount of bytes `encode` produces for the given text.
    pub fn encoded_len(self, text: &str) -> usize {
        match self {
            TextEncoding::Latin1 => text.chars().count(),
            TextEncoding::Utf8 => text.len(),
        }
    }
}

/// Settings for reading MIDI files and events.
///
/// The defaults are lenient about common defects (missing End Of Track, unknown format codes)
/// and strict about everything that would lose data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReadingSettings {
    pub unknown_file_format_policy: UnknownFileFormatPolicy,
    pub invalid_chunk_size_policy: InvalidChunkSizePolicy,
    pub missed_end_of_track_policy: MissedEndOfTrackPolicy,
    pub end_of_track_storing_policy: EndOfTrackStoringPolicy,
    pub not_enough_bytes_policy: NotEnoughBytesPolicy,
    pub zero_length_data_policy: ZeroLengthDataPolicy,
    pub unknown_chunk_id_policy: UnknownChunkIdPolicy,
    pub extra_track_chunk_policy: ExtraTrackChunkPolicy,
    pub unexpected_track_chunks_count_policy: UnexpectedTrackChunksCountPolicy,
    pub no_header_chunk_policy: NoHeaderChunkPolicy,
    pub invalid_channel_event_parameter_value_policy: InvalidChannelEventParameterValuePolicy,
    pub invalid_meta_event_parameter_value_policy: InvalidMetaEventParameterValuePolicy,
    pub invalid_system_common_event_parameter_value_policy:
        InvalidSystemCommonEventParameterValuePolicy,
    pub silent_note_on_policy: SilentNoteOnPolicy,
    pub text_encoding: TextEncoding,
}
impl ReadingSettings {
    /// Settings that abort on every recoverable defect.
    pub fn strict() -> ReadingSettings {
        ReadingSettings {
            unknown_file_format_policy: UnknownFileFormatPolicy::Abort,
            invalid_chunk_size_policy: InvalidChunkSizePolicy::Abort,
            missed_end_of_track_policy: MissedEndOfTrackPolicy::Abort,
            not_enough_bytes_policy: NotEnoughBytesPolicy::Abort,
            unknown_chunk_id_policy: UnknownChunkIdPolicy::Abort,
            unexpected_track_chunks_count_policy: UnexpectedTrackChunksCountPolicy::Abort,
            no_header_chunk_policy: NoHeaderChunkPolicy::Abort,
            invalid_channel_event_parameter_value_policy:
                InvalidChannelEventParameterValuePolicy::Abort,
            invalid_meta_event_parameter_value_policy: InvalidMetaEventParameterValuePolicy::Abort,
            invalid_system_common_event_parameter_value_policy:
                InvalidSystemCommonEventParameterValuePolicy::Abort,
            ..ReadingSettings::default()
        }
    }

    /// Settings that recover from every defect they can.
    pub fn lenient() -> ReadingSettings {
        ReadingSettings {
            unknown_file_format_policy: UnknownFileFormatPolicy::SnapToDefault,
            invalid_chunk_size_policy: InvalidChunkSizePolicy::Ignore,
            missed_end_of_track_policy: MissedEndOfTrackPolicy::Ignore,
            not_enough_bytes_policy: NotEnoughBytesPolicy::ReadAvailable,
            unknown_chunk_id_policy: UnknownChunkIdPolicy::ReadAsUnknownChunk,
            unexpected_track_chunks_count_policy: UnexpectedTrackChunksCountPolicy::Ignore,
            no_header_chunk_policy: NoHeaderChunkPolicy::Ignore,
            invalid_channel_event_parameter_value_policy:
                InvalidChannelEventParameterValuePolicy::ReadValid,
            invalid_meta_event_parameter_value_policy:
                InvalidMetaEventParameterValuePolicy::SnapToLimits,
            invalid_system_common_event_parameter_value_policy:
                InvalidSystemCommonEventParameterValuePolicy::SnapToLimits,
            ..ReadingSettings::default()
        }
    }
}

/// Settings for writing MIDI files and events.
///
/// By default every event is written exactly as it is, except for End Of Track events, which
/// are always moved to the end of their track chunk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WritingSettings {
    /// Omit the status byte of channel events that share it with the previous channel event.
    pub use_running_status: bool,
    /// Write Note Off events as Note On events with a velocity of zero.
    ///
    /// Combined with `use_running_status` this usually makes note-heavy tracks much smaller.
    pub note_off_as_silent_note_on: bool,
    pub delete_unknown_meta_events: bool,
    /// Drop Set Tempo events of 500000 µs per quarter note at the start of each track chunk.
    pub delete_default_set_tempo: bool,
    /// Drop C major Key Signature events at the start of each track chunk.
    pub delete_default_key_signature: bool,
    /// Drop 4/4 Time Signature events at the start of each track chunk.
    pub delete_default_time_signature: bool,
    /// Do not write chunks other than `MThd` and `MTrk`.
    pub delete_unknown_chunks: bool,
    pub text_encoding: TextEncoding,
}
impl WritingSettings {
    /// Settings that apply every size optimization.
    pub fn compact() -> WritingSettings {
        WritingSettings {
            use_running_status: true,
            note_off_as_silent_note_on: true,
            delete_unknown_meta_events: true,
            delete_default_set_tempo: true,
            delete_default_key_signature: true,
            delete_default_time_signature: true,
            delete_unknown_chunks: true,
            text_encoding: TextEncoding::default(),
        }
    }
}
