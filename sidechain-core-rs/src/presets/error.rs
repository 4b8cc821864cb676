use core::fmt;

/// Errors that can occur when addressing presets and fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PresetError {
    /// Preset index is out of bounds (must be < N_PRESETS).
    OutOfRange,
    /// Field index is out of bounds (must be < N_FIELDS).
    InvalidField,
    /// The identity field and the commit pseudo-field cannot be written.
    ReadOnlyField,
}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PresetError::OutOfRange => write!(f, "Preset index out of range (must be 0-15)"),
            PresetError::InvalidField => write!(f, "Field index out of range (must be 0-15)"),
            PresetError::ReadOnlyField => write!(f, "Field is not writable"),
        }
    }
}

/// Errors from editing through the [`ValueEditor`](super::ValueEditor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditError<E> {
    /// The edit addressed a preset or field that cannot be written.
    Preset(PresetError),
    /// The storage backend failed while saving from the commit field.
    Storage(E),
}

impl<E> From<PresetError> for EditError<E> {
    fn from(e: PresetError) -> Self {
        EditError::Preset(e)
    }
}

impl<E: fmt::Debug> fmt::Display for EditError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EditError::Preset(e) => write!(f, "{}", e),
            EditError::Storage(e) => write!(f, "Storage error: {:?}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for EditError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            EditError::Preset(e) => defmt::write!(f, "{}", e),
            EditError::Storage(e) => defmt::write!(f, "Storage error: {}", e),
        }
    }
}
