use core::fmt;

#[derive(Clone, Debug)]
struct Chained {
    kind: ErrorKind,
    position: Option<u64>,
    src: Option<Error>,
}

/// Represents an error while reading a Standard Midi File or a single event.
///
/// Wraps an [`ErrorKind`](enum.ErrorKind.html), the byte offset at which the error was raised
/// (when known), and a chain of context errors describing what was being read at the time.
///
/// Errors are only ever produced when the applicable policy in
/// [`ReadingSettings`](struct.ReadingSettings.html) says to abort, or when the input cannot be
/// framed at all.
#[derive(Clone)]
pub struct Error {
    inner: Box<Chained>,
}
impl Error {
    /// Create a new error with the given `ErrorKind`.
    #[inline]
    pub fn new(kind: ErrorKind) -> Error {
        Error {
            inner: Box::new(Chained {
                kind,
                position: None,
                src: None,
            }),
        }
    }

    /// Create a new error raised at the given byte offset.
    #[inline]
    pub fn at(kind: ErrorKind, position: u64) -> Error {
        Error::new(kind).with_position(position)
    }

    /// More information about the error itself.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.inner.kind
    }

    /// The byte offset into the input where this error was raised, if known.
    ///
    /// Context errors inherit the position of their source.
    pub fn position(&self) -> Option<u64> {
        self.inner
            .position
            .or_else(|| self.source().and_then(Error::position))
    }

    /// The underlying cause for this error.
    #[inline]
    pub fn source(&self) -> Option<&Error> {
        self.inner.src.as_ref()
    }

    /// The innermost error of the chain, which is usually the most specific one.
    pub fn root_cause(&self) -> &Error {
        let mut err = self;
        while let Some(src) = err.source() {
            err = src;
        }
        err
    }

    /// Record the byte offset where this error happened, unless one is already known.
    pub(crate) fn with_position(mut self, position: u64) -> Error {
        if self.inner.position.is_none() {
            self.inner.position = Some(position);
        }
        self
    }

    fn chain_ctx(self, ctx: &'static str) -> Error {
        Error {
            inner: Box::new(Chained {
                kind: ErrorKind::Context(ctx),
                position: None,
                src: Some(self),
            }),
        }
    }
}
impl From<ErrorKind> for Error {
    #[inline]
    fn from(kind: ErrorKind) -> Error {
        Error::new(kind)
    }
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.kind(), f)?;
        if let Some(pos) = self.inner.position {
            write!(f, " (at byte {})", pos)?;
        }
        Ok(())
    }
}
impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)?;
        let mut maybe_src = self.source();
        while let Some(src) = maybe_src {
            writeln!(f)?;
            write!(f, "  caused by: {}", src)?;
            maybe_src = src.source();
        }
        Ok(())
    }
}
impl std::error::Error for Error {
    #[inline]
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// The type of error that occurred while reading.
///
/// Most variants correspond to a reading policy, and are only raised when that policy is set to
/// abort. The rest mean the data cannot be framed at all and are always fatal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// The input ended before a fixed-size value could be read.
    #[error("not enough bytes: expected {expected}, only {available} available")]
    NotEnoughBytes { expected: usize, available: usize },

    /// A variable-length quantity used more bytes than allowed.
    #[error("variable-length quantity is wider than allowed")]
    InvalidVlq,

    /// A status byte that no event is defined for.
    ///
    /// Always fatal, since the length of the event cannot be known.
    #[error("unknown status byte 0x{0:02X}")]
    UnknownStatus(u8),

    /// A data byte appeared in status position, but there was no running status to reuse.
    #[error("event is missing its status byte and there is no running status")]
    UnexpectedRunningStatus,

    /// The bytes consumed by a chunk differ from the length in its header.
    #[error(
        "chunk \"{}\" declares {expected} bytes but {actual} were read",
        .id.escape_ascii()
    )]
    InvalidChunkSize { id: [u8; 4], expected: u32, actual: u64 },

    /// A track chunk ran out of content without an End Of Track event.
    #[error("track chunk does not end with an end of track event")]
    MissedEndOfTrack,

    /// The header chunk declares a file format other than 0, 1 or 2.
    #[error("unknown file format {0}")]
    UnknownFileFormat(u16),

    /// The header chunk uses an SMPTE time division with an unsupported frame rate.
    #[error("invalid time division 0x{0:04X}")]
    InvalidTimeDivision(u16),

    /// A chunk with an id other than `MThd` or `MTrk` was found.
    #[error("unknown chunk id \"{}\"", .0.escape_ascii())]
    UnknownChunkId([u8; 4]),

    /// Chunk ids are exactly four bytes.
    #[error("chunk id must be 4 bytes long, found {0} bytes")]
    InvalidChunkId(usize),

    /// Header chunks are derived from the file they belong to and cannot be duplicated.
    #[error("header chunks cannot be cloned")]
    HeaderChunkClone,

    /// The first chunk of the file is not a header chunk.
    #[error("file does not start with a header chunk")]
    NoHeaderChunk,

    /// The amount of track chunks differs from the count in the header chunk.
    #[error("header declares {expected} track chunks but {actual} were found")]
    UnexpectedTrackChunksCount { expected: u16, actual: usize },

    /// A channel event data byte has its top bit set.
    #[error("invalid parameter value {value} for channel event 0x{status:02X}")]
    InvalidChannelEventParameterValue { status: u8, value: u8 },

    /// A meta event field is out of range.
    #[error("invalid {parameter} value {value} for meta event 0x{meta_type:02X}")]
    InvalidMetaEventParameterValue {
        meta_type: u8,
        parameter: &'static str,
        value: i64,
    },

    /// A system common event data byte is out of range.
    #[error("invalid parameter value {value} for system common event 0x{status:02X}")]
    InvalidSystemCommonEventParameterValue { status: u8, value: u8 },

    /// A value rejected when constructing or modifying an event.
    #[error("invalid {name}: {value}")]
    InvalidValue { name: &'static str, value: i64 },

    /// Describes what was being read when the source error happened.
    #[error("{0}")]
    Context(&'static str),
}

pub(crate) trait ResultExt<T> {
    fn context(self, ctx: &'static str) -> StdResult<T, Error>;
}
impl<T> ResultExt<T> for StdResult<T, Error> {
    #[inline]
    fn context(self, ctx: &'static str) -> StdResult<T, Error> {
        self.map_err(|err| err.chain_ctx(ctx))
    }
}
impl<T> ResultExt<T> for StdResult<T, ErrorKind> {
    #[inline]
    fn context(self, ctx: &'static str) -> StdResult<T, Error> {
        self.map_err(|kind| Error::new(kind).chain_ctx(ctx))
    }
}

/// The result type used by the MIDI reader.
pub type Result<T> = StdResult<T, Error>;
pub(crate) use core::result::Result as StdResult;
