//! Provides abstractions over writers, from growable and fixed byte buffers to any
//! `std::io::Write`.
//!
//! Chunk lengths are computed before their content is written, so writers never need to seek.

use crate::{prelude::*, primitive::encode_vlq};
use std::io;

/// The result of writing to a [`Write`](trait.Write.html) sink.
pub type WriteResult<W> = StdResult<(), <W as Write>::Error>;

/// A sink of raw MIDI bytes.
///
/// Implemented for `Vec<u8>`, for [`Cursor`](struct.Cursor.html) over a fixed buffer, and for
/// any `std::io::Write` through [`IoWrap`](struct.IoWrap.html).
pub trait Write: Send {
    type Error: Send;

    fn write_all(&mut self, buf: &[u8]) -> WriteResult<Self>;

    /// Create an error for data that cannot be represented in a MIDI file.
    fn invalid_input(msg: &'static str) -> Self::Error;

    #[inline]
    fn write_byte(&mut self, byte: u8) -> WriteResult<Self> {
        self.write_all(&[byte])
    }

    #[inline]
    fn write_sbyte(&mut self, byte: i8) -> WriteResult<Self> {
        self.write_all(&[byte as u8])
    }

    #[inline]
    fn write_word(&mut self, word: u16) -> WriteResult<Self> {
        self.write_all(&word.to_be_bytes())
    }

    #[inline]
    fn write_3byte_dword(&mut self, int: u24) -> WriteResult<Self> {
        self.write_all(&int.as_int().to_be_bytes()[1..])
    }

    #[inline]
    fn write_dword(&mut self, dword: u32) -> WriteResult<Self> {
        self.write_all(&dword.to_be_bytes())
    }

    /// Write a variable-length quantity, using as few bytes as possible.
    #[inline]
    fn write_vlq(&mut self, value: u64) -> WriteResult<Self> {
        let (buf, len) = encode_vlq(value);
        self.write_all(&buf[..len])
    }
}

impl Write for Vec<u8> {
    type Error = &'static str;
    #[inline]
    fn write_all(&mut self, buf: &[u8]) -> WriteResult<Self> {
        self.extend_from_slice(buf);
        Ok(())
    }
    fn invalid_input(msg: &'static str) -> &'static str {
        msg
    }
}

/// Writes into a fixed-size buffer, failing once it runs out of space.
pub struct Cursor<'a> {
    buf: &'a mut [u8],
    cur: usize,
}
impl<'a> Cursor<'a> {
    pub fn new(slice: &mut [u8]) -> Cursor<'_> {
        Cursor { buf: slice, cur: 0 }
    }
    /// The written part of the buffer.
    pub fn written(&self) -> &[u8] {
        &self.buf[..self.cur]
    }
    pub fn cursor(&self) -> usize {
        self.cur
    }
}
impl<'a> Write for Cursor<'a> {
    type Error = CursorError;
    fn write_all(&mut self, buf: &[u8]) -> WriteResult<Self> {
        //Cannot overflow because `cur <= buf.len()` is always true.
        let up_to = self.cur + buf.len();
        if up_to > self.buf.len() {
            let space = self.buf.len() - self.cur;
            self.buf[self.cur..].copy_from_slice(&buf[..space]);
            self.cur = self.buf.len();
            Err(CursorError::OutOfSpace)
        } else {
            self.buf[self.cur..up_to].copy_from_slice(buf);
            self.cur = up_to;
            Ok(())
        }
    }
    fn invalid_input(msg: &'static str) -> CursorError {
        CursorError::InvalidInput(msg)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CursorError {
    OutOfSpace,
    InvalidInput(&'static str),
}

/// Adapts any `std::io::Write` into a MIDI byte sink.
pub struct IoWrap<T>(pub T);
impl<T: io::Write + Send> Write for IoWrap<T> {
    type Error = io::Error;
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        io::Write::write_all(&mut self.0, buf)
    }
    fn invalid_input(msg: &'static str) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidInput, msg)
    }
}
