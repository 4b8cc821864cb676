//! Error types for the flash backend.

use core::fmt;

/// Errors that can occur when persisting the preset image.
#[derive(Debug)]
pub enum NvError<E> {
    /// Reading the region failed.
    Read(E),

    /// Erasing the region failed. Nothing was programmed.
    Erase(E),

    /// One or more program operations failed. Every other chunk of the
    /// image was still attempted.
    Program {
        /// Number of failed program operations.
        failed_words: u32,
        /// Absolute flash offset of the first failure.
        first_offset: u32,
        /// Device error of the first failure.
        error: E,
    },

    /// Region offset or size is not a multiple of the erase size, or empty.
    RegionMisaligned,

    /// Region extends past the end of the device.
    RegionOutOfBounds,

    /// The image does not fit into the region.
    BlobTooLarge,

    /// The device's read or write granularity exceeds the staging buffer.
    UnsupportedWriteSize,
}

impl<E: fmt::Debug> fmt::Display for NvError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NvError::Read(e) => write!(f, "Flash read error: {:?}", e),
            NvError::Erase(e) => write!(f, "Flash erase error: {:?}", e),
            NvError::Program {
                failed_words,
                first_offset,
                error,
            } => write!(
                f,
                "Flash program error: {} failed, first at 0x{:08x}: {:?}",
                failed_words, first_offset, error
            ),
            NvError::RegionMisaligned => write!(f, "Region not aligned to erase size"),
            NvError::RegionOutOfBounds => write!(f, "Region exceeds flash capacity"),
            NvError::BlobTooLarge => write!(f, "Image larger than region"),
            NvError::UnsupportedWriteSize => write!(f, "Unsupported flash read/write size"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for NvError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            NvError::Read(e) => defmt::write!(f, "Flash read error: {}", e),
            NvError::Erase(e) => defmt::write!(f, "Flash erase error: {}", e),
            NvError::Program {
                failed_words,
                first_offset,
                error,
            } => defmt::write!(
                f,
                "Flash program error: {} failed, first at {=u32:#x}: {}",
                failed_words,
                first_offset,
                error
            ),
            NvError::RegionMisaligned => defmt::write!(f, "Region not aligned to erase size"),
            NvError::RegionOutOfBounds => defmt::write!(f, "Region exceeds flash capacity"),
            NvError::BlobTooLarge => defmt::write!(f, "Image larger than region"),
            NvError::UnsupportedWriteSize => defmt::write!(f, "Unsupported flash read/write size"),
        }
    }
}
