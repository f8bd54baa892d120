//! The chunk layer: a 4-byte id, a 32-bit big-endian length and the chunk content.

use crate::{
    prelude::*,
    primitive::Timing,
    settings::{
        InvalidChunkSizePolicy, NotEnoughBytesPolicy, ReadingSettings, UnknownChunkIdPolicy,
        UnknownFileFormatPolicy,
    },
    track::TrackChunk,
};

pub const HEADER_ID: [u8; 4] = *b"MThd";
pub const TRACK_ID: [u8; 4] = *b"MTrk";

/// The length of the id and the size fields that precede every chunk.
pub const CHUNK_PREFIX_LEN: usize = 8;

/// The content of an `MThd` chunk, always 6 bytes long.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct HeaderChunk {
    /// The raw format word. Only 0, 1 and 2 are defined.
    pub file_format: u16,
    /// The amount of track chunks the file declares.
    pub track_count: u16,
    pub timing: Timing,
}
impl HeaderChunk {
    pub const CONTENT_SIZE: usize = 6;

    pub(crate) fn read(reader: &mut MidiReader, settings: &ReadingSettings) -> Result<HeaderChunk> {
        let pos = reader.position() as u64;
        let mut file_format = reader.read_word().context("failed to read file format")?;
        if file_format > 2 {
            match settings.unknown_file_format_policy {
                UnknownFileFormatPolicy::Abort => {
                    bail!(Error::at(ErrorKind::UnknownFileFormat(file_format), pos))
                }
                UnknownFileFormatPolicy::SnapToDefault => {
                    log::warn!("unknown file format {}, reading as format 1", file_format);
                    file_format = 1;
                }
            }
        }
        let track_count = reader.read_word().context("failed to read track count")?;
        let pos = reader.position() as u64;
        let timing = Timing::from_raw(reader.read_word().context("failed to read time division")?)
            .map_err(|err| err.with_position(pos))?;
        Ok(HeaderChunk {
            file_format,
            track_count,
            timing,
        })
    }

    pub(crate) fn write_content<W: Write>(&self, out: &mut W) -> WriteResult<W> {
        out.write_word(self.file_format)?;
        out.write_word(self.track_count)?;
        out.write_word(self.timing.as_raw())
    }
}
impl Default for HeaderChunk {
    /// Format 1, no tracks and 96 ticks per quarter note.
    fn default() -> HeaderChunk {
        HeaderChunk {
            file_format: 1,
            track_count: 0,
            timing: Timing::default(),
        }
    }
}

/// A chunk with an id other than `MThd` or `MTrk`, kept verbatim.
#[derive(Clone, PartialEq, Eq, Debug, Hash)]
pub struct UnknownChunk {
    id: [u8; 4],
    pub data: Vec<u8>,
}
impl UnknownChunk {
    /// Fails if `id` is not exactly 4 bytes long.
    pub fn new(id: &[u8], data: impl Into<Vec<u8>>) -> Result<UnknownChunk> {
        let id = <[u8; 4]>::try_from(id).map_err(|_| ErrorKind::InvalidChunkId(id.len()))?;
        Ok(UnknownChunk {
            id,
            data: data.into(),
        })
    }

    #[inline]
    pub fn id(&self) -> [u8; 4] {
        self.id
    }
}

/// A chunk of a Standard Midi File.
#[derive(PartialEq, Eq, Debug)]
pub enum Chunk {
    Header(HeaderChunk),
    Track(TrackChunk),
    Unknown(UnknownChunk),
}
impl Chunk {
    pub fn id(&self) -> [u8; 4] {
        match self {
            Chunk::Header(_) => HEADER_ID,
            Chunk::Track(_) => TRACK_ID,
            Chunk::Unknown(unknown) => unknown.id,
        }
    }

    /// Deep copy of a track or unknown chunk.
    ///
    /// Header chunks describe the file they were read from, so copying them is refused.
    pub fn try_clone(&self) -> Result<Chunk> {
        match self {
            Chunk::Header(_) => bail!(ErrorKind::HeaderChunkClone),
            Chunk::Track(track) => Ok(Chunk::Track(track.clone())),
            Chunk::Unknown(unknown) => Ok(Chunk::Unknown(unknown.clone())),
        }
    }

    /// The length written in the size field of this chunk.
    pub fn content_size(&self, settings: &WritingSettings) -> usize {
        match self {
            Chunk::Header(_) => HeaderChunk::CONTENT_SIZE,
            Chunk::Track(track) => track.content_size(settings),
            Chunk::Unknown(unknown) => unknown.data.len(),
        }
    }

    /// Read a chunk, including its id and size.
    ///
    /// Returns `Ok(None)` if the chunk was skipped, or if the input ended in the middle of the
    /// chunk prefix and the settings allow it.
    pub fn read(reader: &mut MidiReader, settings: &ReadingSettings) -> Result<Option<Chunk>> {
        if reader.remaining() < CHUNK_PREFIX_LEN
            && settings.not_enough_bytes_policy == NotEnoughBytesPolicy::ReadAvailable
        {
            log::warn!("ignoring {} trailing bytes", reader.remaining());
            reader.skip(reader.remaining());
            return Ok(None);
        }
        let (id, size) = read_prefix(reader)?;
        let start = reader.position();
        let chunk = match id {
            HEADER_ID => Some(Chunk::Header(
                HeaderChunk::read(reader, settings).context("failed to read header chunk")?,
            )),
            TRACK_ID => Some(Chunk::Track(
                TrackChunk::read(reader, size, settings).context("failed to read track chunk")?,
            )),
            _ => match settings.unknown_chunk_id_policy {
                UnknownChunkIdPolicy::ReadAsUnknownChunk => {
                    let data = match settings.not_enough_bytes_policy {
                        NotEnoughBytesPolicy::Abort => reader.read_exact(size as usize)?,
                        NotEnoughBytesPolicy::ReadAvailable => reader.read_bytes(size as usize),
                    };
                    Some(Chunk::Unknown(UnknownChunk {
                        id,
                        data: data.to_vec(),
                    }))
                }
                UnknownChunkIdPolicy::Skip => {
                    log::debug!("skipping chunk \"{}\"", id.escape_ascii());
                    reader.skip(size as usize);
                    None
                }
                UnknownChunkIdPolicy::Abort => bail!(Error::at(
                    ErrorKind::UnknownChunkId(id),
                    (start - CHUNK_PREFIX_LEN) as u64
                )),
            },
        };
        check_size(reader, id, size, start, settings)?;
        Ok(chunk)
    }

    /// Write the id, size and content of this chunk.
    pub fn write<W: Write>(&self, out: &mut W, settings: &WritingSettings) -> WriteResult<W> {
        let size = u32::try_from(self.content_size(settings))
            .map_err(|_| W::invalid_input("chunk content exceeds 4 GiB"))?;
        out.write_all(&self.id())?;
        out.write_dword(size)?;
        match self {
            Chunk::Header(header) => header.write_content(out),
            Chunk::Track(track) => track.write_content(out, settings),
            Chunk::Unknown(unknown) => out.write_all(&unknown.data),
        }
    }
}
impl From<HeaderChunk> for Chunk {
    fn from(header: HeaderChunk) -> Chunk {
        Chunk::Header(header)
    }
}
impl From<TrackChunk> for Chunk {
    fn from(track: TrackChunk) -> Chunk {
        Chunk::Track(track)
    }
}
impl From<UnknownChunk> for Chunk {
    fn from(unknown: UnknownChunk) -> Chunk {
        Chunk::Unknown(unknown)
    }
}

/// Read the id and declared content size of a chunk.
pub(crate) fn read_prefix(reader: &mut MidiReader) -> Result<([u8; 4], u32)> {
    let mut id = [0; 4];
    id.copy_from_slice(reader.read_exact(4).context("failed to read chunk id")?);
    let size = reader.read_dword().context("failed to read chunk size")?;
    Ok((id, size))
}

/// Compare the bytes consumed by a chunk with its declared size and apply the size policy.
fn check_size(
    reader: &mut MidiReader,
    id: [u8; 4],
    size: u32,
    start: usize,
    settings: &ReadingSettings,
) -> Result<()> {
    let size = size as usize;
    let consumed = reader.position() - start;
    if consumed == size {
        return Ok(());
    }
    if consumed < size
        && reader.end_reached()
        && settings.not_enough_bytes_policy == NotEnoughBytesPolicy::ReadAvailable
    {
        log::warn!(
            "chunk \"{}\" is truncated: {} of {} bytes available",
            id.escape_ascii(),
            consumed,
            size
        );
        return Ok(());
    }
    match settings.invalid_chunk_size_policy {
        InvalidChunkSizePolicy::Abort => bail!(Error::at(
            ErrorKind::InvalidChunkSize {
                id,
                expected: size as u32,
                actual: consumed as u64,
            },
            (start - CHUNK_PREFIX_LEN) as u64
        )),
        InvalidChunkSizePolicy::Ignore => {
            log::warn!(
                "chunk \"{}\" declares {} bytes but {} were read",
                id.escape_ascii(),
                size,
                consumed
            );
            if consumed < size {
                reader.skip(size - consumed);
            }
            Ok(())
        }
    }
}
