//! Specific to the SMF packaging of MIDI streams.

use crate::{
    chunk::{self, Chunk, HeaderChunk, CHUNK_PREFIX_LEN, HEADER_ID, TRACK_ID},
    io::IoWrap,
    prelude::*,
    primitive::{Format, Timing},
    riff,
    settings::{
        ExtraTrackChunkPolicy, NoHeaderChunkPolicy, NotEnoughBytesPolicy, ReadingSettings,
        UnexpectedTrackChunksCountPolicy,
    },
    track::{EventIter, TrackChunk},
};
use std::{fs::File, io, path::Path};

/// A Standard Midi File.
///
/// The header chunk is not stored in `chunks`: it is derived from `format`, `timing` and the
/// amount of track chunks every time the file is written.
#[derive(PartialEq, Eq, Debug, Default)]
pub struct Smf {
    pub format: Format,
    pub timing: Timing,
    /// Track chunks and unknown chunks, in file order.
    pub chunks: Vec<Chunk>,
}
impl Smf {
    /// Create an empty file.
    pub fn new(format: Format, timing: Timing) -> Smf {
        Smf {
            format,
            timing,
            chunks: Vec::new(),
        }
    }

    /// Parse a `.mid` or `.rmi` file with the default reading settings.
    pub fn parse(raw: &[u8]) -> Result<Smf> {
        Self::parse_with(raw, &ReadingSettings::default())
    }

    /// Parse a `.mid` or `.rmi` file.
    pub fn parse_with(raw: &[u8], settings: &ReadingSettings) -> Result<Smf> {
        let raw = riff::unwrap(raw).unwrap_or(raw);
        let mut reader = MidiReader::new(raw);
        let substitute = read_missing_header(&reader, settings)?;
        let mut header: Option<HeaderChunk> = None;
        let mut chunks = Vec::new();
        let mut track_count = 0;
        while !reader.end_reached() {
            match Chunk::read(&mut reader, settings).context("failed to read chunk")? {
                None => {}
                Some(Chunk::Header(h)) => {
                    if header.is_none() && substitute.is_none() {
                        header = Some(h);
                    } else {
                        log::debug!("ignoring duplicate header chunk");
                    }
                }
                Some(Chunk::Track(track)) => {
                    track_count += 1;
                    match header {
                        Some(h)
                            if track_count > h.track_count as usize
                                && settings.extra_track_chunk_policy
                                    == ExtraTrackChunkPolicy::Skip =>
                        {
                            log::debug!("skipping extra track chunk {}", track_count);
                        }
                        _ => chunks.push(Chunk::Track(track)),
                    }
                }
                Some(chunk) => chunks.push(chunk),
            }
        }
        if let Some(h) = header {
            if settings.unexpected_track_chunks_count_policy
                == UnexpectedTrackChunksCountPolicy::Abort
                && track_count != h.track_count as usize
            {
                bail!(ErrorKind::UnexpectedTrackChunksCount {
                    expected: h.track_count,
                    actual: track_count,
                });
            }
        }
        let header = header.or(substitute).unwrap_or_default();
        Ok(Smf {
            format: Format::from_code(header.file_format).unwrap_or_default(),
            timing: header.timing,
            chunks,
        })
    }

    /// Read a whole file from a reader and parse it.
    ///
    /// Parsing errors are reported as `io::ErrorKind::InvalidData`.
    pub fn read<R: io::Read>(mut source: R, settings: &ReadingSettings) -> io::Result<Smf> {
        let mut raw = Vec::new();
        source.read_to_end(&mut raw)?;
        Self::parse_with(&raw, settings)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }

    /// Read and parse the file at the given path.
    pub fn open<P: AsRef<Path>>(path: P, settings: &ReadingSettings) -> io::Result<Smf> {
        Self::read(io::BufReader::new(File::open(path)?), settings)
    }

    /// The track chunks, in file order.
    pub fn tracks(&self) -> impl Iterator<Item = &TrackChunk> {
        self.chunks.iter().filter_map(|chunk| match chunk {
            Chunk::Track(track) => Some(track),
            _ => None,
        })
    }

    pub fn tracks_mut(&mut self) -> impl Iterator<Item = &mut TrackChunk> {
        self.chunks.iter_mut().filter_map(|chunk| match chunk {
            Chunk::Track(track) => Some(track),
            _ => None,
        })
    }

    /// Deep copy of the file. Fails if `chunks` holds a header chunk.
    pub fn try_clone(&self) -> Result<Smf> {
        Ok(Smf {
            format: self.format,
            timing: self.timing,
            chunks: self
                .chunks
                .iter()
                .map(Chunk::try_clone)
                .collect::<Result<_>>()?,
        })
    }

    /// Encode the file into a writer.
    ///
    /// With the `parallel` feature enabled, chunks are encoded concurrently into separate
    /// buffers and then written in order.
    pub fn write<W: Write>(&self, out: &mut W, settings: &WritingSettings) -> WriteResult<W> {
        let chunks = self
            .chunks
            .iter()
            .filter(|chunk| match chunk {
                Chunk::Header(_) => false,
                Chunk::Track(_) => true,
                Chunk::Unknown(_) => !settings.delete_unknown_chunks,
            })
            .collect::<Vec<_>>();
        let track_count = chunks
            .iter()
            .filter(|chunk| matches!(chunk, Chunk::Track(_)))
            .count();
        let header = HeaderChunk {
            file_format: self.format.as_code(),
            track_count: u16::try_from(track_count)
                .map_err(|_| W::invalid_input("track count exceeds 16 bit range"))?,
            timing: self.timing,
        };
        Chunk::Header(header).write(out, settings)?;

        #[cfg(feature = "parallel")]
        {
            if chunks.len() > 1 {
                use rayon::prelude::*;

                let encoded = chunks
                    .par_iter()
                    .map(|chunk| {
                        let mut buf = Vec::with_capacity(
                            CHUNK_PREFIX_LEN + chunk.content_size(settings),
                        );
                        chunk.write(&mut buf, settings).map(|()| buf)
                    })
                    .collect::<StdResult<Vec<Vec<u8>>, &'static str>>()
                    .map_err(W::invalid_input)?;
                for buf in encoded {
                    out.write_all(&buf)?;
                }
                return Ok(());
            }
        }

        for chunk in chunks {
            chunk.write(out, settings)?;
        }
        Ok(())
    }

    /// Encode the file into a `std::io::Write` sink.
    pub fn write_std<T: io::Write + Send>(
        &self,
        out: T,
        settings: &WritingSettings,
    ) -> io::Result<()> {
        self.write(&mut IoWrap(out), settings)
    }

    /// Encode the file into a new byte vector.
    pub fn to_bytes(&self, settings: &WritingSettings) -> StdResult<Vec<u8>, &'static str> {
        let mut out = Vec::new();
        self.write(&mut out, settings)?;
        Ok(out)
    }

    /// Encode the file into the file at the given path, replacing it if it exists.
    pub fn save<P: AsRef<Path>>(&self, path: P, settings: &WritingSettings) -> io::Result<()> {
        fn save_impl(smf: &Smf, path: &Path, settings: &WritingSettings) -> io::Result<()> {
            smf.write_std(io::BufWriter::new(File::create(path)?), settings)
        }
        save_impl(self, path.as_ref(), settings)
    }
}

/// Apply the missing header policy if `reader` does not start with a header chunk.
///
/// Returns the header to use in its place, if any.
fn read_missing_header(
    reader: &MidiReader,
    settings: &ReadingSettings,
) -> Result<Option<HeaderChunk>> {
    if reader.unread().get(..4) == Some(&HEADER_ID[..]) {
        return Ok(None);
    }
    match settings.no_header_chunk_policy {
        NoHeaderChunkPolicy::Abort => bail!(Error::at(ErrorKind::NoHeaderChunk, 0)),
        NoHeaderChunkPolicy::Ignore => {
            log::warn!("file does not start with a header chunk, assuming format 1");
            Ok(Some(HeaderChunk::default()))
        }
    }
}

/// Parse the header of a `.mid` or `.rmi` file, deferring the parsing of its tracks.
///
/// Only track chunks are yielded. Unknown chunks and duplicate headers are skipped.
pub fn parse_lazy<'a>(
    raw: &'a [u8],
    settings: &'a ReadingSettings,
) -> Result<(HeaderChunk, TrackIter<'a>)> {
    let raw = riff::unwrap(raw).unwrap_or(raw);
    let mut reader = MidiReader::new(raw);
    let header = match read_missing_header(&reader, settings)? {
        Some(header) => header,
        None => {
            let (_, size) = chunk::read_prefix(&mut reader)?;
            let start = reader.position();
            let header = HeaderChunk::read(&mut reader, settings)
                .context("failed to read header chunk")?;
            reader.set_position(start.saturating_add(size as usize));
            header
        }
    };
    Ok((
        header,
        TrackIter {
            reader,
            settings,
            track_count_hint: header.track_count,
            done: false,
        },
    ))
}

/// An iterator over the track chunks of a Standard Midi File.
///
/// Yields an error at most once, after which it is exhausted.
#[derive(Clone, Debug)]
pub struct TrackIter<'a> {
    reader: MidiReader<'a>,
    settings: &'a ReadingSettings,
    track_count_hint: u16,
    done: bool,
}
impl<'a> TrackIter<'a> {
    /// The bytes that have not been split into tracks yet.
    #[inline]
    pub fn unread(&self) -> &'a [u8] {
        self.reader.unread()
    }

    /// Decode every remaining track.
    pub fn collect_tracks(self) -> Result<Vec<TrackChunk>> {
        let mut tracks = Vec::with_capacity(self.track_count_hint as usize);
        for events in self {
            tracks.push(events?.collect_track()?);
        }
        Ok(tracks)
    }

    fn next_track(&mut self) -> Result<Option<EventIter<'a>>> {
        while !self.reader.end_reached() {
            if self.reader.remaining() < CHUNK_PREFIX_LEN
                && self.settings.not_enough_bytes_policy == NotEnoughBytesPolicy::ReadAvailable
            {
                log::warn!("ignoring {} trailing bytes", self.reader.remaining());
                break;
            }
            let (id, size) = chunk::read_prefix(&mut self.reader)?;
            let size = size as usize;
            if size > self.reader.remaining()
                && self.settings.not_enough_bytes_policy == NotEnoughBytesPolicy::Abort
            {
                bail!(Error::at(
                    ErrorKind::NotEnoughBytes {
                        expected: size,
                        available: self.reader.remaining(),
                    },
                    self.reader.position() as u64
                ));
            }
            let content = self.reader.read_bytes(size);
            if id == TRACK_ID {
                self.track_count_hint = self.track_count_hint.saturating_sub(1);
                return Ok(Some(EventIter::new(content, self.settings)));
            }
            log::debug!("skipping chunk \"{}\"", id.escape_ascii());
        }
        Ok(None)
    }
}
impl<'a> Iterator for TrackIter<'a> {
    type Item = Result<EventIter<'a>>;

    fn next(&mut self) -> Option<Result<EventIter<'a>>> {
        if self.done {
            return None;
        }
        let next = self.next_track().transpose();
        if !matches!(next, Some(Ok(_))) {
            self.done = true;
        }
        next
    }
}
