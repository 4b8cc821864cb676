//! Persisted image of the preset array.
//!
//! ```text
//! offset  size  content
//! 0       4     magic  b"SCHN"
//! 4       2     format version (LE u16)
//! 6       2     preset count   (LE u16)
//! 8       64×16 records: 16 LE i32 words per preset, in field order
//! ```
//!
//! The header is the only corruption check beyond per-field validation.
//! Storage backends program the header last, so an interrupted save leaves
//! it erased and the whole image is rejected on the next load.

use super::preset::{check_words, Preset};
use super::{N_FIELDS, N_PRESETS};

pub const MAGIC: [u8; 4] = *b"SCHN";
pub const FORMAT_VERSION: u16 = 1;

pub const HEADER_LEN: usize = 8;
pub const RECORD_LEN: usize = N_FIELDS * 4;
/// Total size of the persisted image in bytes.
pub const BLOB_LEN: usize = HEADER_LEN + N_PRESETS * RECORD_LEN;

/// Outcome of decoding one slot from an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlotImage {
    Valid(Preset),
    /// First offending field index and its value, or `None` when the header
    /// itself was rejected.
    Invalid(Option<(usize, i32)>),
}

/// `true` if `blob` starts with a header this build understands.
pub fn header_ok(blob: &[u8; BLOB_LEN]) -> bool {
    blob[0..4] == MAGIC
        && u16::from_le_bytes([blob[4], blob[5]]) == FORMAT_VERSION
        && u16::from_le_bytes([blob[6], blob[7]]) as usize == N_PRESETS
}

/// Serialise the preset array. Every record is written with a clear dirty word.
pub fn encode(presets: &[Preset; N_PRESETS]) -> [u8; BLOB_LEN] {
    let mut blob = [0u8; BLOB_LEN];
    blob[0..4].copy_from_slice(&MAGIC);
    blob[4..6].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
    blob[6..8].copy_from_slice(&(N_PRESETS as u16).to_le_bytes());

    for (slot, preset) in presets.iter().enumerate() {
        let mut synced = *preset;
        synced.dirty = false;
        let base = HEADER_LEN + slot * RECORD_LEN;
        for (i, w) in synced.to_words().iter().enumerate() {
            let at = base + i * 4;
            blob[at..at + 4].copy_from_slice(&w.to_le_bytes());
        }
    }
    blob
}

/// Decode `slot` from an image whose header has already been checked.
pub(crate) fn decode_slot(blob: &[u8; BLOB_LEN], slot: usize, header_valid: bool) -> SlotImage {
    if !header_valid {
        return SlotImage::Invalid(None);
    }

    let base = HEADER_LEN + slot * RECORD_LEN;
    let words: [i32; N_FIELDS] = core::array::from_fn(|i| {
        let at = base + i * 4;
        i32::from_le_bytes([blob[at], blob[at + 1], blob[at + 2], blob[at + 3]])
    });

    match check_words(slot, &words) {
        Ok(()) => SlotImage::Valid(Preset::from_words(&words)),
        Err((field, v)) => SlotImage::Invalid(Some((field.index(), v))),
    }
}
