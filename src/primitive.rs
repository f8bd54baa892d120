//! Simple building-block data that can be read in one go, and the cursor used to read it.
//! All fixed-width primitives are big-endian, as mandated by the SMF standard.

use crate::{prelude::*, settings::TextEncoding};

/// A position-tracked cursor over the raw bytes of a MIDI file or event.
///
/// Reading past the end never panics: fixed-size reads fail with
/// [`ErrorKind::NotEnoughBytes`](enum.ErrorKind.html#variant.NotEnoughBytes), while
/// [`read_bytes`](#method.read_bytes) returns whatever is available.
#[derive(Clone, Debug)]
pub struct MidiReader<'a> {
    raw: &'a [u8],
    pos: usize,
}
impl<'a> MidiReader<'a> {
    /// Create a reader positioned at the start of `raw`.
    #[inline]
    pub fn new(raw: &'a [u8]) -> MidiReader<'a> {
        MidiReader { raw, pos: 0 }
    }

    /// The current byte offset.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move to an absolute byte offset, clamped to the length of the input.
    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos.min(self.raw.len());
    }

    /// Total length of the input.
    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the input is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Amount of bytes left to read.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.raw.len() - self.pos
    }

    /// Whether the whole input has been consumed.
    #[inline]
    pub fn end_reached(&self) -> bool {
        self.pos >= self.raw.len()
    }

    /// The bytes that have not been read yet.
    #[inline]
    pub fn unread(&self) -> &'a [u8] {
        &self.raw[self.pos..]
    }

    /// Skip forward up to `count` bytes, returning how many were actually skipped.
    pub fn skip(&mut self, count: usize) -> usize {
        let skipped = count.min(self.remaining());
        self.pos += skipped;
        skipped
    }

    pub(crate) fn rewind(&mut self, count: usize) {
        self.pos = self.pos.saturating_sub(count);
    }

    fn not_enough_bytes(&self, expected: usize) -> Error {
        Error::at(
            ErrorKind::NotEnoughBytes {
                expected,
                available: self.remaining(),
            },
            self.pos as u64,
        )
    }

    /// Look at the next byte without consuming it.
    #[inline]
    pub fn peek_byte(&self) -> Option<u8> {
        self.raw.get(self.pos).copied()
    }

    /// Read up to `count` bytes, returning fewer if the input is exhausted.
    pub fn read_bytes(&mut self, count: usize) -> &'a [u8] {
        let start = self.pos;
        let count = self.skip(count);
        &self.raw[start..start + count]
    }

    /// Read exactly `count` bytes.
    pub fn read_exact(&mut self, count: usize) -> Result<&'a [u8]> {
        ensure!(count <= self.remaining(), self.not_enough_bytes(count));
        Ok(self.read_bytes(count))
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0; N];
        bytes.copy_from_slice(self.read_exact(N)?);
        Ok(bytes)
    }

    #[inline]
    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = self.peek_byte().ok_or_else(|| self.not_enough_bytes(1))?;
        self.pos += 1;
        Ok(byte)
    }

    #[inline]
    pub fn read_sbyte(&mut self) -> Result<i8> {
        Ok(self.read_byte()? as i8)
    }

    #[inline]
    pub fn read_word(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    #[inline]
    pub fn read_int16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    /// Read a 24-bit big-endian integer.
    #[inline]
    pub fn read_3byte_dword(&mut self) -> Result<u24> {
        let [a, b, c] = self.read_array()?;
        Ok(u24::new(u32::from_be_bytes([0, a, b, c])))
    }

    #[inline]
    pub fn read_dword(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    /// Read a standard variable-length quantity, at most 4 bytes (28 bits) wide.
    pub fn read_vlq_number(&mut self) -> Result<u32> {
        // At most 28 bits, so the cast cannot truncate
        self.read_vlq(VLQ_MAX_BYTES).map(|int| int as u32)
    }

    /// Read an extended variable-length quantity, at most 9 bytes (63 bits) wide.
    pub fn read_vlq_long_number(&mut self) -> Result<u64> {
        self.read_vlq(VLQ_LONG_MAX_BYTES)
    }

    /// Reads until a byte without the continuation bit, so that an over-long quantity is
    /// consumed entirely even when it is rejected.
    fn read_vlq(&mut self, max_bytes: usize) -> Result<u64> {
        let start = self.pos;
        let mut int: u64 = 0;
        let mut count = 0;
        loop {
            let byte = self.read_byte()?;
            count += 1;
            if count <= max_bytes {
                int = int << 7 | bit_range(byte, 0..7) as u64;
            }
            if bit_range(byte, 7..8) == 0 {
                break;
            }
        }
        ensure!(
            count <= max_bytes,
            Error::at(ErrorKind::InvalidVlq, start as u64)
        );
        Ok(int)
    }

    /// Read `count` bytes and decode them as text.
    ///
    /// If the input is exhausted, the available bytes are decoded.
    pub fn read_string(&mut self, count: usize, encoding: TextEncoding) -> String {
        encoding.decode(self.read_bytes(count))
    }
}

/// The maximum width in bytes of a variable-length quantity as defined by the SMF standard.
pub const VLQ_MAX_BYTES: usize = 4;

/// The maximum width in bytes of an extended variable-length quantity.
pub const VLQ_LONG_MAX_BYTES: usize = 9;

/// The largest value a standard variable-length quantity can hold.
pub const VLQ_MAX_VALUE: u32 = 0x0FFF_FFFF;

/// Amount of bytes needed to encode `value` as a variable-length quantity.
#[inline]
pub fn vlq_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    ((bits + 6) / 7).max(1)
}

/// Encode `value` as a variable-length quantity into a stack buffer.
///
/// Returns the buffer and the amount of leading bytes in use.
pub(crate) fn encode_vlq(value: u64) -> ([u8; 10], usize) {
    let len = vlq_len(value);
    let mut buf = [0; 10];
    for (i, byte) in buf[..len].iter_mut().enumerate() {
        let shift = (len - 1 - i) * 7;
        *byte = ((value >> shift) & 0x7F) as u8;
        if i + 1 < len {
            *byte |= 0x80;
        }
    }
    (buf, len)
}

/// Slightly restricted integers.
macro_rules! restricted_int {
    {$(#[$attr:meta])* $name:ident : $inner:tt => $bits:expr} => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Default)]
        #[repr(transparent)]
        #[allow(non_camel_case_types)]
        pub struct $name($inner);
        impl From<$inner> for $name {
            /// Lossy conversion, loses the top bits.
            #[inline]
            fn from(raw: $inner) -> $name {
                $name::from_int_lossy(raw)
            }
        }
        impl From<$name> for $inner {
            #[inline]
            fn from(restricted: $name) -> $inner {restricted.0}
        }
        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
        impl $name {
            const MASK: $inner = (1 << $bits) - 1;

            /// The maximum value that this restricted integer can hold.
            #[inline]
            pub const fn max_value() -> $name {
                $name (Self::MASK)
            }

            /// Creates a restricted int from its non-restricted counterpart by masking off the
            /// extra bits.
            #[inline]
            pub const fn new(raw: $inner) -> $name {
                $name (raw & Self::MASK)
            }

            /// Creates a restricted int from its non-restricted counterpart by masking off the
            /// extra bits.
            #[inline]
            pub const fn from_int_lossy(raw: $inner) -> $name {
                $name (raw & Self::MASK)
            }

            /// Creates a restricted int from its non-restricted counterpart, clamping it to the
            /// maximum value.
            #[inline]
            pub fn from_int_saturating(raw: $inner) -> $name {
                $name (raw.min(Self::MASK))
            }

            /// Returns `Some` if the raw integer is within range of the restricted integer, and
            /// `None` otherwise.
            #[inline]
            pub fn try_from(raw: $inner) -> Option<$name> {
                if raw <= Self::MASK {
                    Some($name(raw))
                }else{
                    None
                }
            }

            /// Get the inner integer out of the wrapper.
            /// The inner integer is guaranteed to be in range of the restricted wrapper.
            #[inline]
            pub const fn as_int(self) -> $inner {
                self.0
            }
        }
        impl PartialEq<$inner> for $name {
            fn eq(&self, rhs: &$inner) -> bool {
                self.as_int() == *rhs
            }
        }
        impl PartialEq<$name> for $inner {
            fn eq(&self, rhs: &$name) -> bool {
                *self == rhs.as_int()
            }
        }
    };
}
restricted_int! {
    /// A 15-bit integer type.
    ///
    /// Wraps the `u16` type and ensures that the top bit is always zero.
    u15: u16 => 15
}
restricted_int! {
    /// A 14-bit integer type.
    ///
    /// Wraps the `u16` type and ensures that the top two bits are always zero.
    u14: u16 => 14
}
restricted_int! {
    /// A 7-bit integer type.
    ///
    /// Wraps the `u8` type and ensures that the top bit is always zero.
    u7: u8 => 7
}
restricted_int! {
    /// A 4-bit integer type.
    ///
    /// Wraps the `u8` type and ensures that the top 4 bits are always zero.
    u4: u8 => 4
}
restricted_int! {
    /// A 3-bit integer type.
    ///
    /// Wraps the `u8` type and ensures that the top 5 bits are always zero.
    u3: u8 => 3
}
restricted_int! {
    /// A 2-bit integer type.
    ///
    /// Wraps the `u8` type and ensures that the top 6 bits are always zero.
    u2: u8 => 2
}
restricted_int! {
    /// A 24-bit integer type.
    ///
    /// Wraps the `u32` type and ensures that the top 8 bits are always zero.
    u24: u32 => 24
}

/// The order in which tracks should be laid out when playing back this SMF file.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Format {
    /// This file should have a single track only.
    SingleTrack,
    /// This file has several tracks that should be played simultaneously.
    ///
    /// Usually the first track controls tempo and other song metadata.
    Parallel,
    /// This file has several tracks, each one a separate song.
    ///
    /// The tracks should be played sequentially, as completely separate MIDI tracks packaged
    /// within a single SMF file.
    Sequential,
}
impl Format {
    /// Get the format for a raw header format word, if it is one of the three known formats.
    pub fn from_code(code: u16) -> Option<Format> {
        Some(match code {
            0 => Format::SingleTrack,
            1 => Format::Parallel,
            2 => Format::Sequential,
            _ => return None,
        })
    }

    /// The raw header format word.
    pub fn as_code(self) -> u16 {
        match self {
            Format::SingleTrack => 0,
            Format::Parallel => 1,
            Format::Sequential => 2,
        }
    }
}
impl Default for Format {
    fn default() -> Format {
        Format::Parallel
    }
}

/// The timing for an SMF file.
/// This can be in ticks/beat or ticks/second.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Timing {
    /// Specifies ticks/beat as a 15-bit integer.
    ///
    /// The length of a beat is not standard, so in order to fully describe the length of a MIDI
    /// tick a [`SetTempo`](struct.SetTempo.html) event should be present.
    Metrical(u15),
    /// Specifies ticks/second by dividing a second into frames and then into subframes.
    /// Therefore the length of of a tick is `1/fps/subframe`.
    Timecode(Fps, u8),
}
impl Timing {
    /// Decode the raw 16-bit time division of a header chunk.
    pub fn from_raw(raw: u16) -> Result<Timing> {
        if bit_range(raw, 15..16) != 0 {
            //Timecode
            let fps = (bit_range(raw, 8..16) as u8 as i8).wrapping_neg();
            let subframe = bit_range(raw, 0..8) as u8;
            Ok(Timing::Timecode(
                Fps::from_int(fps as u8).ok_or(ErrorKind::InvalidTimeDivision(raw))?,
                subframe,
            ))
        } else {
            //Metrical
            Ok(Timing::Metrical(u15::from(raw)))
        }
    }

    /// Encode this timing as the raw 16-bit time division of a header chunk.
    pub fn as_raw(self) -> u16 {
        match self {
            Timing::Metrical(ticksperbeat) => ticksperbeat.as_int(),
            Timing::Timecode(framespersec, ticksperframe) => u16::from_be_bytes([
                (-(framespersec.as_int() as i8)) as u8,
                ticksperframe,
            ]),
        }
    }
}
impl Default for Timing {
    /// 96 ticks per quarter note.
    fn default() -> Timing {
        Timing::Metrical(u15::new(96))
    }
}

/// A timestamp encoding an SMPTE time of the day.
///
/// Enforces several guarantees:
///
/// - `hour` is inside [0, 23]
/// - `minute` is inside [0, 59]
/// - `second` is inside [0, 59]
/// - `frame` is inside [0, fps.max_frame()]
/// - `subframe` is inside [0, 99]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct SmpteTime {
    hour: u8,
    minute: u8,
    second: u8,
    frame: u8,
    subframe: u8,
    fps: Fps,
}
impl SmpteTime {
    pub const MAX_HOUR: u8 = 23;
    pub const MAX_MINUTE: u8 = 59;
    pub const MAX_SECOND: u8 = 59;
    pub const MAX_SUBFRAME: u8 = 99;

    /// Create a new SMPTE timestamp with the given information.
    #[inline]
    pub fn new(
        hour: u8,
        minute: u8,
        second: u8,
        frame: u8,
        subframe: u8,
        fps: Fps,
    ) -> Option<SmpteTime> {
        macro_rules! check {
            ($cond:expr) => {{
                if !{ $cond } {
                    return None;
                }
            }};
        }
        check!(hour <= Self::MAX_HOUR);
        check!(minute <= Self::MAX_MINUTE);
        check!(second <= Self::MAX_SECOND);
        check!(frame <= fps.max_frame());
        check!(subframe <= Self::MAX_SUBFRAME);
        Some(SmpteTime {
            hour,
            minute,
            second,
            frame,
            subframe,
            fps,
        })
    }

    /// Get the hour component of this timestamp.
    #[inline]
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Get the minute component of this timestamp.
    #[inline]
    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Get the second component of this timestamp.
    #[inline]
    pub fn second(&self) -> u8 {
        self.second
    }

    /// Get the frame component of this timestamp.
    /// The meaning of this value depends on the value of `fps`.
    #[inline]
    pub fn frame(&self) -> u8 {
        self.frame
    }

    /// Get the subframe component of this timestamp (hundredths of a frame).
    #[inline]
    pub fn subframe(&self) -> u8 {
        self.subframe
    }

    /// Get the FPS component of this timestamp.
    #[inline]
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Convert the second + frame + subframe components of this timestamp into a single
    /// floating-point number of seconds.
    /// Note that this does not include the hour and minute components.
    #[inline]
    pub fn second_f32(&self) -> f32 {
        self.second as f32
            + ((self.frame as f32 + self.subframe as f32 / 100.0) / self.fps.as_f32())
    }

    pub(crate) fn encode(&self) -> [u8; 5] {
        let hour_fps = self.hour() | self.fps().as_code().as_int() << 5;
        [
            hour_fps,
            self.minute(),
            self.second(),
            self.frame(),
            self.subframe(),
        ]
    }
}

/// One of the four FPS values available for SMPTE times, as defined by the MIDI standard.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum Fps {
    /// 24 frames per second.
    Fps24,
    /// 25 frames per second.
    Fps25,
    /// Actually `29.97 = 30 / 1.001` frames per second.
    ///
    /// Quite an exotic value because of interesting historical reasons.
    Fps29,
    /// 30 frames per second.
    Fps30,
}
impl Fps {
    /// Does the conversion from a 2-bit fps code to an `Fps` value.
    pub(crate) fn from_code(code: u2) -> Fps {
        match code.as_int() {
            0 => Fps::Fps24,
            1 => Fps::Fps25,
            2 => Fps::Fps29,
            _ => Fps::Fps30,
        }
    }

    /// Does the conversion to a 2-bit fps code.
    pub(crate) fn as_code(self) -> u2 {
        u2::from(match self {
            Fps::Fps24 => 0,
            Fps::Fps25 => 1,
            Fps::Fps29 => 2,
            Fps::Fps30 => 3,
        })
    }

    /// Converts an integer representing the semantic fps to an `Fps` value (ie. `24` -> `Fps24`).
    #[inline]
    pub fn from_int(raw: u8) -> Option<Fps> {
        Some(match raw {
            24 => Fps::Fps24,
            25 => Fps::Fps25,
            29 => Fps::Fps29,
            30 => Fps::Fps30,
            _ => return None,
        })
    }

    /// Get the integral approximate fps out.
    #[inline]
    pub fn as_int(self) -> u8 {
        match self {
            Fps::Fps24 => 24,
            Fps::Fps25 => 25,
            Fps::Fps29 => 29,
            Fps::Fps30 => 30,
        }
    }

    /// The largest frame number allowed in an SMPTE timestamp at this rate.
    #[inline]
    pub fn max_frame(self) -> u8 {
        match self {
            Fps::Fps24 => 23,
            Fps::Fps25 => 24,
            Fps::Fps29 | Fps::Fps30 => 29,
        }
    }

    /// Get the actual `f32` fps out.
    #[inline]
    pub fn as_f32(self) -> f32 {
        match self {
            Fps::Fps24 => 24.0,
            Fps::Fps25 => 25.0,
            Fps::Fps29 => 30.0 / 1.001,
            Fps::Fps30 => 30.0,
        }
    }
}
impl From<Fps> for f32 {
    fn from(x: Fps) -> Self {
        x.as_f32()
    }
}
impl From<Fps> for u8 {
    fn from(x: Fps) -> Self {
        x.as_int()
    }
}
