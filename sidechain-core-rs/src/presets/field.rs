use super::error::PresetError;
use super::{MAX_DEPTH, N_FIELDS};

/// Identifies one field of a [`Preset`](super::Preset).
///
/// The discriminant is the field's position in the persisted record and in
/// the [`FIELD_MIN`]/[`FIELD_MAX`] tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Field {
    /// Slot identity; must equal the slot's position. Never editable.
    PresetIndex = 0,
    Active = 1,
    StepDelay = 2,
    Depth = 3,
    Curve = 4,
    SrcChannel = 5,
    SrcNote = 6,
    DstChannelA = 7,
    DstChannelB = 8,
    DstChannelC = 9,
    DstChannelD = 10,
    DstCcA = 11,
    DstCcB = 12,
    DstCcC = 13,
    DstCcD = 14,
    /// Dirty flag in storage, "reload / save" command in the editor.
    Commit = 15,
}

/// Inclusive lower bound of every field, indexed by [`Field::index()`].
pub const FIELD_MIN: [i32; N_FIELDS] = [0, 0, 1, 0, 0, 1, 0, 0, 0, 0, 0, 0x01, 0x01, 0x01, 0x01, 0];
/// Inclusive upper bound of every field, indexed by [`Field::index()`].
///
/// The identity bound is unused: identity is checked against the slot index.
pub const FIELD_MAX: [i32; N_FIELDS] = [
    0, 1, 63, MAX_DEPTH, 3, 16, 127, 16, 16, 16, 16, 0x77, 0x77, 0x77, 0x77, 1,
];

/// Human-readable field names for UI display, indexed by [`Field::index()`].
pub const FIELD_NAMES: [&str; N_FIELDS] = [
    "Preset Id",
    "Active",
    "Step Delay",
    "Depth",
    "Curve",
    "Source Channel",
    "Source Note",
    "Dest. Channel A",
    "Dest. Channel B",
    "Dest. Channel C",
    "Dest. Channel D",
    "Dest. CC A",
    "Dest. CC B",
    "Dest. CC C",
    "Dest. CC D",
    "Reload / Save",
];

impl Field {
    /// All fields in record order.
    pub const ALL: [Field; N_FIELDS] = [
        Field::PresetIndex,
        Field::Active,
        Field::StepDelay,
        Field::Depth,
        Field::Curve,
        Field::SrcChannel,
        Field::SrcNote,
        Field::DstChannelA,
        Field::DstChannelB,
        Field::DstChannelC,
        Field::DstChannelD,
        Field::DstCcA,
        Field::DstCcB,
        Field::DstCcC,
        Field::DstCcD,
        Field::Commit,
    ];

    /// First field the editor can reach. The identity field is skipped.
    pub const FIRST_EDITABLE: Field = Field::Active;
    /// Last field the editor can reach: the commit pseudo-field.
    pub const LAST_EDITABLE: Field = Field::Commit;

    /// Look up a field by its record index.
    pub fn from_index(idx: usize) -> Result<Field, PresetError> {
        Field::ALL
            .get(idx)
            .copied()
            .ok_or(PresetError::InvalidField)
    }

    /// Position of this field in the record.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        FIELD_NAMES[self.index()]
    }

    /// Inclusive lower bound.
    pub fn min_value(self) -> i32 {
        FIELD_MIN[self.index()]
    }

    /// Inclusive upper bound.
    pub fn max_value(self) -> i32 {
        FIELD_MAX[self.index()]
    }

    /// Clamp `v` into this field's `[min, max]` range.
    pub fn clamp(self, v: i32) -> i32 {
        v.clamp(self.min_value(), self.max_value())
    }

    /// `true` for the value fields that `set` may write.
    pub fn is_writable(self) -> bool {
        !matches!(self, Field::PresetIndex | Field::Commit)
    }

    /// `true` for the four destination channel fields.
    pub fn is_channel(self) -> bool {
        matches!(
            self,
            Field::DstChannelA | Field::DstChannelB | Field::DstChannelC | Field::DstChannelD
        )
    }

    /// Check a stored value against this field's constraint.
    ///
    /// The identity field must equal `slot`; every other field must lie in
    /// its `[min, max]` range.
    pub fn accepts(self, slot: usize, v: i32) -> bool {
        match self {
            Field::PresetIndex => v == slot as i32,
            _ => (self.min_value()..=self.max_value()).contains(&v),
        }
    }

    /// Move `delta` steps through the editable range, wrapping at both ends.
    ///
    /// A `delta` of 0 returns `self` unchanged.
    pub fn step_editable(self, delta: i32) -> Field {
        let first = Field::FIRST_EDITABLE.index() as i32;
        let span = (Field::LAST_EDITABLE.index() as i32) - first + 1;
        let pos = (self.index() as i32 - first).clamp(0, span - 1);
        let next = (pos + delta).rem_euclid(span) + first;
        Field::ALL[next as usize]
    }
}
