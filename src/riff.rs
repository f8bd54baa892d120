//! There's an abomination called RMID, MIDI embedded in a RIFF file.
//! Support for these files is provided by unwrapping the input slice, stripping away the RIFF
//! wrappers around the raw SMF file.

use crate::prelude::*;

/// RIFF chunks are little-endian and padded to an even length, unlike SMF chunks.
struct RiffChunks<'a>(MidiReader<'a>);
impl<'a> Iterator for RiffChunks<'a> {
    type Item = ([u8; 4], &'a [u8]);
    fn next(&mut self) -> Option<([u8; 4], &'a [u8])> {
        let reader = &mut self.0;
        if reader.remaining() < 8 {
            return None;
        }
        let mut id = [0; 4];
        id.copy_from_slice(reader.read_bytes(4));
        let mut len = [0; 4];
        len.copy_from_slice(reader.read_bytes(4));
        let len = u32::from_le_bytes(len) as usize;
        let data = reader.read_bytes(len);
        if len % 2 == 1 {
            reader.skip(1);
        }
        Some((id, data))
    }
}

/// Extract the SMF data out of an RMID file.
///
/// Returns `None` if `raw` is not an RMID file, in which case it should be read as a plain SMF
/// file.
pub fn unwrap(raw: &[u8]) -> Option<&[u8]> {
    let (id, riff) = RiffChunks(MidiReader::new(raw)).next()?;
    if &id != b"RIFF" || riff.get(..4) != Some(&b"RMID"[..]) {
        return None;
    }
    let data = RiffChunks(MidiReader::new(&riff[4..]))
        .find(|(id, _)| id == b"data")
        .map(|(_, data)| data);
    if data.is_none() {
        log::warn!("rmid file has no data chunk");
    }
    data
}
