// In-memory storage used by the unit tests.

use super::preset::Preset;
use super::record::{encode, BLOB_LEN};
use super::N_PRESETS;
use crate::storage::PresetStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamError;

pub struct RamStorage {
    pub image: [u8; BLOB_LEN],
    pub fail_load: bool,
    pub fail_save: bool,
    pub saves: usize,
    pub erases: usize,
}

impl RamStorage {
    pub fn erased() -> Self {
        Self::with_image([0xFF; BLOB_LEN])
    }

    pub fn with_image(image: [u8; BLOB_LEN]) -> Self {
        Self {
            image,
            fail_load: false,
            fail_save: false,
            saves: 0,
            erases: 0,
        }
    }
}

impl PresetStorage for RamStorage {
    type Error = RamError;

    fn load(&mut self, buf: &mut [u8]) -> Result<(), RamError> {
        if self.fail_load {
            return Err(RamError);
        }
        buf.copy_from_slice(&self.image[..buf.len()]);
        Ok(())
    }

    fn save(&mut self, buf: &[u8]) -> Result<(), RamError> {
        self.saves += 1;
        self.image = [0xFF; BLOB_LEN];
        if self.fail_save {
            return Err(RamError);
        }
        self.image[..buf.len()].copy_from_slice(buf);
        Ok(())
    }

    fn erase(&mut self) -> Result<(), RamError> {
        self.erases += 1;
        self.image = [0xFF; BLOB_LEN];
        Ok(())
    }
}

/// A valid image of default presets after `edit` has been applied.
pub fn image_with(edit: impl FnOnce(&mut [Preset; N_PRESETS])) -> [u8; BLOB_LEN] {
    let mut presets: [Preset; N_PRESETS] = core::array::from_fn(Preset::default_for);
    edit(&mut presets);
    encode(&presets)
}
