//! # Overview
//!
//! `smf_codec` reads and writes Standard Midi Files (SMF) byte for byte: chunks,
//! variable-length quantities, running status, delta times and every event type a track chunk
//! can hold.
//!
//! Files are read into owned data, so the raw bytes can be dropped right after parsing:
//!
//! ```rust
//! use smf_codec::{
//!     num::{u4, u7},
//!     ChannelMessage, Event, EventKind, Format, Smf, Timing, TrackChunk, WritingSettings,
//! };
//!
//! let mut smf = Smf::new(Format::SingleTrack, Timing::default());
//! let note = |vel| ChannelMessage::NoteOn { key: u7::new(60), vel: u7::new(vel) };
//! smf.chunks.push(
//!     TrackChunk::new(vec![
//!         Event::new(0, EventKind::channel(u4::new(0), note(100))),
//!         Event::new(96, EventKind::channel(u4::new(0), note(0))),
//!     ])
//!     .into(),
//! );
//!
//! let bytes = smf.to_bytes(&WritingSettings::default()).unwrap();
//! assert_eq!(Smf::parse(&bytes).unwrap(), smf);
//! ```
//!
//! # Reading and writing settings
//!
//! Real-world files often break the SMF standard in small ways. How the reader reacts to each
//! kind of defect is decided by a policy in [`ReadingSettings`](struct.ReadingSettings.html),
//! ranging from aborting with an [`Error`](struct.Error.html) to silently recovering.
//! Recoveries are reported through the `log` crate.
//!
//! [`WritingSettings`](struct.WritingSettings.html) controls the optional size optimizations
//! applied on write: running status, silent Note On events, and removal of redundant or
//! unknown events.
//!
//! # About features
//!
//! - `parallel` (enabled by default): encode the chunks of a file concurrently through `rayon`.
//! - `serde`: derive `Serialize` and `Deserialize` for the settings.
//!
//! # Lazy reading
//!
//! [`parse_lazy`](fn.parse_lazy.html) reads the header only, and returns an iterator of track
//! iterators that decode events on demand.
//!
//! # Raw MIDI messages
//!
//! The [`convert`](convert/index.html) module encodes and decodes events outside of track
//! chunks, either in the file byte format or in the format MIDI devices send over the wire.

macro_rules! bail {
    ($err:expr) => {{
        return Err($err.into());
    }};
}
macro_rules! ensure {
    ($cond:expr, $err:expr) => {{
        if !$cond {
            bail!($err)
        }
    }};
}

/// All of the errors this crate produces.
mod error;

mod prelude {
    pub(crate) use crate::{
        error::{Error, ErrorKind, Result, ResultExt, StdResult},
        io::{Write, WriteResult},
        primitive::{u14, u24, u4, u7, vlq_len, MidiReader},
        settings::{TextEncoding, WritingSettings},
    };
    pub(crate) use core::{fmt, ops};

    pub(crate) fn bit_range<T>(val: T, range: ops::Range<u32>) -> T
    where
        T: From<u8>
            + ops::Shr<u32, Output = T>
            + ops::Shl<u32, Output = T>
            + ops::Not<Output = T>
            + ops::BitAnd<Output = T>,
    {
        let mask = !((!T::from(0)) << (range.end - range.start));
        (val >> range.start) & mask
    }
}

mod chunk;
pub mod convert;
mod event;
pub mod io;
mod meta;
mod primitive;
pub mod registry;
mod riff;
mod settings;
mod smf;
mod system;
mod track;

pub use crate::{
    chunk::{Chunk, HeaderChunk, UnknownChunk, HEADER_ID, TRACK_ID},
    error::{Error, ErrorKind, Result},
    event::{ChannelMessage, Event, EventKind, PitchBend},
    meta::{meta_type, KeySignature, MetaEvent, SetTempo, TextKind, TimeSignature},
    primitive::{
        vlq_len, Format, Fps, MidiReader, SmpteTime, Timing, VLQ_LONG_MAX_BYTES, VLQ_MAX_BYTES,
        VLQ_MAX_VALUE,
    },
    registry::BytesFormat,
    settings::{
        EndOfTrackStoringPolicy, ExtraTrackChunkPolicy, InvalidChannelEventParameterValuePolicy,
        InvalidChunkSizePolicy, InvalidMetaEventParameterValuePolicy,
        InvalidSystemCommonEventParameterValuePolicy, MissedEndOfTrackPolicy, NoHeaderChunkPolicy,
        NotEnoughBytesPolicy, ReadingSettings, SilentNoteOnPolicy, TextEncoding,
        UnexpectedTrackChunksCountPolicy, UnknownChunkIdPolicy, UnknownFileFormatPolicy,
        WritingSettings, ZeroLengthDataPolicy,
    },
    smf::{parse_lazy, Smf, TrackIter},
    system::{MtcComponent, SysExEvent, SysExKind, SystemCommon, SystemRealTime},
    track::{EventIter, TrackChunk},
};

/// Exotically-sized integers used by the MIDI standard.
pub mod num {
    pub use crate::primitive::{u14, u15, u2, u24, u3, u4, u7};
}

#[cfg(test)]
mod test;
