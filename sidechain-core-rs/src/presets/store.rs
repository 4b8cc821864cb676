use super::error::PresetError;
use super::field::Field;
use super::preset::Preset;
use super::record::{self, SlotImage, BLOB_LEN};
use super::N_PRESETS;
use crate::storage::PresetStorage;

/// Addresses either one slot or every slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Target {
    Slot(usize),
    All,
}

/// What [`PresetStore::load()`] found in storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoadReport {
    /// Bit `i` is set when slot `i` failed validation and was default-filled.
    pub replaced: u16,
    /// The storage read itself failed; the region was treated as erased.
    pub read_failed: bool,
}

impl LoadReport {
    pub fn replaced_count(&self) -> u32 {
        self.replaced.count_ones()
    }

    pub fn was_replaced(&self, slot: usize) -> bool {
        slot < N_PRESETS && self.replaced & (1 << slot) != 0
    }
}

/// The 16 presets held in RAM, with dirty tracking and a change signal.
///
/// # Change signal
///
/// Every mutation (including loads and default fills) raises a store-wide
/// "changed" flag. The envelope engine consumes it once per tick through
/// [`take_changed()`](Self::take_changed) and re-resolves its working copy.
/// The store is always accessed behind the same lock as the engine, so the
/// read-and-clear cannot lose a concurrent set.
pub struct PresetStore {
    presets: [Preset; N_PRESETS],
    changed: bool,
}

impl Default for PresetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetStore {
    /// A store filled with the default template, every slot dirty.
    ///
    /// Call [`load()`](Self::load) before use to pick up persisted presets.
    pub fn new() -> Self {
        let presets = core::array::from_fn(|slot| {
            let mut p = Preset::default_for(slot);
            p.dirty = true;
            p
        });
        Self {
            presets,
            changed: true,
        }
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Read the persisted image and validate every slot.
    ///
    /// Slots that pass validation are taken as-is with their dirty flag
    /// cleared. Slots that fail are replaced by the default template and
    /// left dirty. A failed read is treated like an erased region.
    pub fn load<S: PresetStorage>(&mut self, storage: &mut S) -> LoadReport {
        #[cfg(feature = "defmt")]
        defmt::info!("presets: load");

        let mut report = LoadReport::default();
        let mut blob = [0xFFu8; BLOB_LEN];
        if storage.load(&mut blob).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("presets: storage read failed, treating region as erased");
            blob = [0xFFu8; BLOB_LEN];
            report.read_failed = true;
        }

        let header_valid = record::header_ok(&blob);
        #[cfg(feature = "defmt")]
        {
            if !header_valid {
                defmt::warn!("presets: no valid image header, using defaults");
            }
        }

        for slot in 0..N_PRESETS {
            match record::decode_slot(&blob, slot, header_valid) {
                SlotImage::Valid(mut p) => {
                    p.dirty = false;
                    self.presets[slot] = p;
                }
                SlotImage::Invalid(_detail) => {
                    #[cfg(feature = "defmt")]
                    {
                        if let Some((field, value)) = _detail {
                            defmt::warn!(
                                "presets: invalid value {} at slot {}, field {}",
                                value,
                                slot,
                                field
                            );
                        }
                    }
                    self.write_default(slot);
                    report.replaced |= 1 << slot;
                }
            }
        }

        self.changed = true;
        report
    }

    /// Write the whole array as one image, then clear every dirty flag.
    ///
    /// The storage result is returned unchanged. Dirty flags are cleared
    /// even when the write fails.
    pub fn save<S: PresetStorage>(&mut self, storage: &mut S) -> Result<(), S::Error> {
        #[cfg(feature = "defmt")]
        defmt::info!("presets: save");

        let blob = record::encode(&self.presets);
        let res = storage.save(&blob);
        self.clear_dirty(Target::All);

        #[cfg(feature = "defmt")]
        {
            if res.is_err() {
                defmt::error!("presets: save failed");
            }
        }
        res
    }

    // ── Field access ─────────────────────────────────────────────────

    /// Read one field of one preset.
    pub fn get(&self, preset: usize, field: Field) -> Result<i32, PresetError> {
        Ok(self.preset(preset)?.get(field))
    }

    /// Clamp `value` into the field's range and store it.
    ///
    /// Marks the preset dirty, raises the change signal, and returns the
    /// value actually stored. Out-of-range values are not an error.
    pub fn set(&mut self, preset: usize, field: Field, value: i32) -> Result<i32, PresetError> {
        if preset >= N_PRESETS {
            return Err(PresetError::OutOfRange);
        }
        if !field.is_writable() {
            return Err(PresetError::ReadOnlyField);
        }

        let applied = field.clamp(value);
        let p = &mut self.presets[preset];
        p.put(field, applied);
        p.dirty = true;
        self.changed = true;
        Ok(applied)
    }

    /// Add `delta` to a field, clamping exactly like [`set()`](Self::set).
    pub fn change(&mut self, preset: usize, field: Field, delta: i32) -> Result<i32, PresetError> {
        let current = self.get(preset, field)?;
        self.set(preset, field, current.saturating_add(delta))
    }

    pub fn preset(&self, preset: usize) -> Result<&Preset, PresetError> {
        self.presets.get(preset).ok_or(PresetError::OutOfRange)
    }

    pub fn presets(&self) -> &[Preset; N_PRESETS] {
        &self.presets
    }

    // ── Defaults and validation ──────────────────────────────────────

    /// Overwrite one or all slots with the default template.
    ///
    /// Affected slots are marked dirty and the change signal is raised.
    pub fn fill_default(&mut self, target: Target) -> Result<(), PresetError> {
        match target {
            Target::Slot(slot) if slot >= N_PRESETS => return Err(PresetError::OutOfRange),
            Target::Slot(slot) => self.write_default(slot),
            Target::All => (0..N_PRESETS).for_each(|slot| self.write_default(slot)),
        }

        #[cfg(feature = "defmt")]
        defmt::info!("presets: default fill {}", target);

        self.changed = true;
        Ok(())
    }

    /// Bitmask of slots that currently fail validation. Does not mutate.
    pub fn invalid_slots(&self) -> u16 {
        self.presets
            .iter()
            .enumerate()
            .filter(|(slot, p)| !p.is_valid(*slot))
            .fold(0, |mask, (slot, _)| mask | (1 << slot))
    }

    // ── Dirty tracking ───────────────────────────────────────────────

    /// `true` if the slot (or any slot) differs from storage.
    ///
    /// An out-of-range slot reports `false`.
    pub fn is_dirty(&self, target: Target) -> bool {
        match target {
            Target::Slot(slot) => self.presets.get(slot).is_some_and(|p| p.dirty),
            Target::All => self.presets.iter().any(|p| p.dirty),
        }
    }

    pub fn clear_dirty(&mut self, target: Target) {
        match target {
            Target::Slot(slot) => {
                if let Some(p) = self.presets.get_mut(slot) {
                    p.dirty = false;
                }
            }
            Target::All => self.presets.iter_mut().for_each(|p| p.dirty = false),
        }
    }

    // ── Change signal ────────────────────────────────────────────────

    /// Read and clear the change signal.
    pub fn take_changed(&mut self) -> bool {
        core::mem::replace(&mut self.changed, false)
    }

    /// Raise the change signal without touching any preset.
    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    fn write_default(&mut self, slot: usize) {
        let mut p = Preset::default_for(slot);
        p.dirty = true;
        self.presets[slot] = p;
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────
