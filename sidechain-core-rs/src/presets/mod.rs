//! Preset storage, validation and editing.
//!
//! This module provides the [`PresetStore`] holding the 16 presets of the
//! sidechain unit, and the [`ValueEditor`] cursor the on-device UI uses to
//! walk and modify them.
//!
//! # Layout
//!
//! Every preset has the same 16 fields, addressed by [`Field`]:
//!
//! ```text
//!  0 Preset Id        identity, must equal the slot index (read-only)
//!  1 Active           0..=1
//!  2 Step Delay       1..=63 ticks
//!  3 Depth            0..=15
//!  4 Curve            0..=3
//!  5 Source Channel   1..=16
//!  6 Source Note      0..=127
//!  7-10 Dest. Channel 0..=16 (0 = unused)
//! 11-14 Dest. CC      1..=119
//! 15 Reload / Save    dirty flag; commit command in the editor
//! ```
//!
//! # Dirty Tracking
//!
//! Each preset carries a `dirty` flag, set by every edit and by default
//! fill, cleared by [`PresetStore::save()`] and by loading a valid slot.
//! Independently, the store raises one "changed" signal on any mutation,
//! consumed by the envelope engine via [`PresetStore::take_changed()`].
//!
//! # `no_std` Compatibility
//!
//! No heap allocation: all 16 presets live in a fixed array, and the
//! persisted image is built on the stack.

mod editor;
mod error;
mod field;
mod preset;
pub mod record;
mod store;

#[cfg(test)]
pub(crate) mod test_storage;

pub use editor::{EditorStatus, ValueEditor, COMMIT_SENTINEL, STATUS_LINE_LEN};
pub use error::{EditError, PresetError};
pub use field::{Field, FIELD_MAX, FIELD_MIN, FIELD_NAMES};
pub use preset::Preset;
pub use store::{LoadReport, PresetStore, Target};

/// Number of preset slots.
pub const N_PRESETS: usize = 16;

/// Number of fields per preset, including identity and the dirty flag.
pub const N_FIELDS: usize = 16;

/// Number of output destinations per preset.
pub const N_DESTINATIONS: usize = 4;

/// Highest depth value.
pub const MAX_DEPTH: i32 = 15;

/// Channel names for UI display, indexed by channel number (0 = unused).
pub const CHANNEL_NAMES: [&str; 17] = [
    "Off", "Ch1", "Ch2", "Ch3", "Ch4", "Ch5", "Ch6", "Ch7", "Ch8", "Ch9", "Ch10", "Ch11", "Ch12",
    "Ch13", "Ch14", "Ch15", "Ch16",
];

/// Display name for a destination channel value, `"?"` if out of range.
pub fn channel_name(channel: i32) -> &'static str {
    usize::try_from(channel)
        .ok()
        .and_then(|c| CHANNEL_NAMES.get(c).copied())
        .unwrap_or("?")
}
