use core::fmt::Write;

use heapless::String;

use super::error::{EditError, PresetError};
use super::field::Field;
use super::preset::Preset;
use super::store::{PresetStore, Target};
use super::{channel_name, N_PRESETS};
use crate::curves;
use crate::storage::PresetStorage;

/// Value returned by [`ValueEditor::change_current_value()`] when the cursor
/// is on the commit field.
pub const COMMIT_SENTINEL: i32 = 0;

/// Capacity of [`EditorStatus::line()`].
pub const STATUS_LINE_LEN: usize = 64;

/// Snapshot of what the UI shows for the cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EditorStatus {
    pub preset: usize,
    pub field: Field,
    pub field_name: &'static str,
    pub value: i32,
    /// Current preset has unsaved edits.
    pub dirty: bool,
}

impl EditorStatus {
    /// Text rendering of the current value: channel names for destination
    /// channels, curve names for the curve field, digits otherwise.
    pub fn value_text(&self) -> String<16> {
        let mut s = String::new();
        let _ = match self.field {
            Field::Commit => write!(s, "Reload / Save"),
            Field::Curve => write!(s, "{}", curves::curve_name(self.value as usize)),
            f if f.is_channel() => write!(s, "{}", channel_name(self.value)),
            _ => write!(s, "{}", self.value),
        };
        s
    }

    /// One-line summary, e.g. `Preset 3* item02: Step Delay = 5`.
    pub fn line(&self) -> String<STATUS_LINE_LEN> {
        let mut s = String::new();
        let mark = if self.dirty { "*" } else { " " };
        // Fits by construction; truncation is harmless for a status line.
        let _ = write!(
            s,
            "Preset {}{} item{:02}: {} = {}",
            self.preset,
            mark,
            self.field.index(),
            self.field_name,
            self.value_text()
        );
        s
    }
}

/// UI-facing cursor over the current preset and current field.
///
/// The editor never owns presets; every operation works on a
/// [`PresetStore`] passed in by the caller, and those that save or reload
/// take the [`PresetStorage`] as well.
///
/// # Examples
///
/// ```
/// use sidechain::presets::{Field, PresetStore, ValueEditor};
///
/// let mut store = PresetStore::new();
/// let mut editor = ValueEditor::new();
///
/// editor.select_field(1); // Active -> Step Delay
/// assert_eq!(editor.current_field(), Field::StepDelay);
/// assert_eq!(editor.set_current_value(&mut store, 500), Ok(63));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueEditor {
    preset: usize,
    field: Field,
}

impl Default for ValueEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueEditor {
    pub const fn new() -> Self {
        Self {
            preset: 0,
            field: Field::FIRST_EDITABLE,
        }
    }

    pub fn current_preset(&self) -> usize {
        self.preset
    }

    pub fn current_field(&self) -> Field {
        self.field
    }

    // ── Preset selection ─────────────────────────────────────────────

    /// Move to the next (`delta > 0`) or previous (`delta < 0`) preset,
    /// wrapping at 0/15. A `delta` of 0 keeps the index.
    ///
    /// Always reloads the whole store from storage, discarding unsaved edits
    /// on **every** preset, then clears all dirty flags.
    pub fn select_preset<'s, S: PresetStorage>(
        &mut self,
        delta: i32,
        store: &'s mut PresetStore,
        storage: &mut S,
    ) -> &'s Preset {
        let n = N_PRESETS as i32;
        let next = (self.preset as i32 + delta.signum()).rem_euclid(n);
        self.jump_to_preset(next as usize, store, storage)
    }

    /// Make `preset` current (kept unchanged if out of range) and reload.
    ///
    /// Same reload semantics as [`select_preset()`](Self::select_preset).
    pub fn jump_to_preset<'s, S: PresetStorage>(
        &mut self,
        preset: usize,
        store: &'s mut PresetStore,
        storage: &mut S,
    ) -> &'s Preset {
        if preset < N_PRESETS {
            self.preset = preset;
        }
        store.load(storage);
        store.clear_dirty(Target::All);

        #[cfg(feature = "defmt")]
        defmt::debug!("editor: preset {} selected", self.preset);

        &store.presets()[self.preset]
    }

    // ── Field selection ──────────────────────────────────────────────

    /// Move the field cursor by one within the editable range, wrapping.
    /// A `delta` of 0 just reads the cursor.
    pub fn select_field(&mut self, delta: i32) -> Field {
        self.field = self.field.step_editable(delta.signum());
        self.field
    }

    // ── Value mutation ───────────────────────────────────────────────

    /// Nudge the current field by `delta`.
    ///
    /// On the commit field, `delta > 0` saves and `delta < 0` reloads
    /// (discarding edits on all presets); both return [`COMMIT_SENTINEL`].
    /// Otherwise the clamped, stored value is returned.
    pub fn change_current_value<S: PresetStorage>(
        &mut self,
        delta: i32,
        store: &mut PresetStore,
        storage: &mut S,
    ) -> Result<i32, EditError<S::Error>> {
        if self.field == Field::Commit {
            if delta > 0 {
                store.save(storage).map_err(EditError::Storage)?;
            } else if delta < 0 {
                store.load(storage);
            }
            return Ok(COMMIT_SENTINEL);
        }

        Ok(store.change(self.preset, self.field, delta)?)
    }

    /// Set the current field to `value`, clamped like [`PresetStore::set()`].
    pub fn set_current_value(
        &self,
        store: &mut PresetStore,
        value: i32,
    ) -> Result<i32, PresetError> {
        store.set(self.preset, self.field, value)
    }

    pub fn current_value(&self, store: &PresetStore) -> i32 {
        store.presets()[self.preset].get(self.field)
    }

    pub fn status(&self, store: &PresetStore) -> EditorStatus {
        EditorStatus {
            preset: self.preset,
            field: self.field,
            field_name: self.field.name(),
            value: self.current_value(store),
            dirty: store.is_dirty(Target::Slot(self.preset)),
        }
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────
