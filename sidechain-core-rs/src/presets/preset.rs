use super::field::Field;
use super::{N_DESTINATIONS, N_FIELDS};

/// One stored configuration slot.
///
/// Values are kept as `i32` to match the persisted record words. A preset
/// held by the store always satisfies [`Preset::validate()`] for its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Preset {
    /// Identity; equals the slot position.
    pub preset_index: i32,
    /// `0` forces neutral playback, `1` plays the curve.
    pub active: i32,
    /// Ticks between successive curve steps (1..=63).
    pub step_delay: i32,
    /// 0..=15. `0` plays a flat ceiling.
    pub depth: i32,
    /// Curve id (0..=3).
    pub curve: i32,
    /// MIDI channel (1..=16) that triggers and controls this preset.
    pub src_channel: i32,
    /// Trigger note (0..=127).
    pub src_note: i32,
    /// Output channels; `0` marks an unused destination.
    pub dst_channel: [i32; N_DESTINATIONS],
    /// Output controller numbers.
    pub dst_cc: [i32; N_DESTINATIONS],
    /// RAM differs from the last value written to storage.
    pub dirty: bool,
}

/// Factory template. `preset_index` is fixed up per slot.
const DEFAULT_TEMPLATE: Preset = Preset {
    preset_index: 0,
    active: 1,
    step_delay: 5,
    depth: 12,
    curve: 0,
    src_channel: 1,
    src_note: 36,
    dst_channel: [2, 0, 0, 0],
    dst_cc: [0x07; N_DESTINATIONS],
    dirty: false,
};

impl Preset {
    /// The default template for `slot`, not yet marked dirty.
    pub const fn default_for(slot: usize) -> Self {
        let mut p = DEFAULT_TEMPLATE;
        p.preset_index = slot as i32;
        p
    }

    /// Read a field. The commit field reads back the dirty flag.
    pub fn get(&self, field: Field) -> i32 {
        match field {
            Field::PresetIndex => self.preset_index,
            Field::Active => self.active,
            Field::StepDelay => self.step_delay,
            Field::Depth => self.depth,
            Field::Curve => self.curve,
            Field::SrcChannel => self.src_channel,
            Field::SrcNote => self.src_note,
            Field::DstChannelA => self.dst_channel[0],
            Field::DstChannelB => self.dst_channel[1],
            Field::DstChannelC => self.dst_channel[2],
            Field::DstChannelD => self.dst_channel[3],
            Field::DstCcA => self.dst_cc[0],
            Field::DstCcB => self.dst_cc[1],
            Field::DstCcC => self.dst_cc[2],
            Field::DstCcD => self.dst_cc[3],
            Field::Commit => self.dirty as i32,
        }
    }

    /// Write a field without any range check.
    pub(crate) fn put(&mut self, field: Field, v: i32) {
        match field {
            Field::PresetIndex => self.preset_index = v,
            Field::Active => self.active = v,
            Field::StepDelay => self.step_delay = v,
            Field::Depth => self.depth = v,
            Field::Curve => self.curve = v,
            Field::SrcChannel => self.src_channel = v,
            Field::SrcNote => self.src_note = v,
            Field::DstChannelA => self.dst_channel[0] = v,
            Field::DstChannelB => self.dst_channel[1] = v,
            Field::DstChannelC => self.dst_channel[2] = v,
            Field::DstChannelD => self.dst_channel[3] = v,
            Field::DstCcA => self.dst_cc[0] = v,
            Field::DstCcB => self.dst_cc[1] = v,
            Field::DstCcC => self.dst_cc[2] = v,
            Field::DstCcD => self.dst_cc[3] = v,
            Field::Commit => self.dirty = v != 0,
        }
    }

    /// All fields as record words, in field order.
    pub fn to_words(&self) -> [i32; N_FIELDS] {
        core::array::from_fn(|i| self.get(Field::ALL[i]))
    }

    /// Build a preset from record words. Performs no validation.
    pub fn from_words(words: &[i32; N_FIELDS]) -> Self {
        let mut p = DEFAULT_TEMPLATE;
        for (field, &w) in Field::ALL.iter().zip(words) {
            p.put(*field, w);
        }
        p
    }

    /// Check every field against its constraint for `slot`.
    ///
    /// Returns the first offending field and its value on failure.
    pub fn validate(&self, slot: usize) -> Result<(), (Field, i32)> {
        check_words(slot, &self.to_words())
    }

    pub fn is_valid(&self, slot: usize) -> bool {
        self.validate(slot).is_ok()
    }
}

/// Check raw record words for `slot` without building a preset.
pub(crate) fn check_words(slot: usize, words: &[i32; N_FIELDS]) -> Result<(), (Field, i32)> {
    for (field, &w) in Field::ALL.iter().zip(words) {
        if !field.accepts(slot, w) {
            return Err((*field, w));
        }
    }
    Ok(())
}
