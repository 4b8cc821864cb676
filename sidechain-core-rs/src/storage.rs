//! The seam between the preset store and non-volatile memory.

/// Block-erase backing store for the persisted preset image.
///
/// Implementations own one dedicated erase region. There is no partial
/// update: `save` always erases the region and rewrites the image.
///
/// `save` and `erase` are long-running and must never be called from the
/// envelope tick context.
pub trait PresetStorage {
    type Error;

    /// Copy `buf.len()` bytes from the start of the region into `buf`.
    ///
    /// No corruption detection happens here; an erased region reads back its
    /// erased pattern.
    fn load(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Erase the region, then program `buf` into it.
    ///
    /// Not atomic: a failure part-way leaves the region indeterminate.
    fn save(&mut self, buf: &[u8]) -> Result<(), Self::Error>;

    /// Erase the region without reprogramming it.
    fn erase(&mut self) -> Result<(), Self::Error>;
}

impl<T: PresetStorage + ?Sized> PresetStorage for &mut T {
    type Error = T::Error;

    fn load(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).load(buf)
    }

    fn save(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        (**self).save(buf)
    }

    fn erase(&mut self) -> Result<(), Self::Error> {
        (**self).erase()
    }
}
