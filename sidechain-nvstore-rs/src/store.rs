use embedded_storage::nor_flash::NorFlash;

use sidechain::presets::record::HEADER_LEN;
use sidechain::storage::PresetStorage;

use crate::error::NvError;

/// Staging buffer for one program or read operation.
const SCRATCH_LEN: usize = 256;

/// Program granularity before rounding up to the device's write size.
const WORD_LEN: usize = 4;

/// The dedicated erase region holding the preset image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NvRegion {
    /// Start offset from the beginning of the device.
    pub offset: u32,
    /// Region length in bytes, a whole number of erase blocks.
    pub size: u32,
}

impl NvRegion {
    /// The last `size` bytes of a device of `capacity` bytes.
    pub const fn tail(capacity: u32, size: u32) -> Self {
        Self {
            offset: capacity - size,
            size,
        }
    }

    pub fn end(&self) -> Option<u32> {
        self.offset.checked_add(self.size)
    }
}

/// [`PresetStorage`] over one erase region of a NOR flash device.
///
/// A save erases the whole region, programs every record word, and
/// programs the image header last. A failed word is logged and skipped;
/// the remaining words are still written and the failure is reported once
/// at the end.
///
/// # Examples
///
/// ```ignore
/// let flash = Flash::<_, Blocking, FLASH_SIZE>::new_blocking(p.FLASH);
/// let region = NvRegion::tail(FLASH_SIZE as u32, 4096);
/// let storage = NvStore::new(flash, region)?;
/// let unit = Sidechain::new(storage);
/// ```
pub struct NvStore<F: NorFlash> {
    flash: F,
    region: NvRegion,
}

impl<F: NorFlash> NvStore<F> {
    /// Bytes programmed per operation: one word, widened to the write size.
    pub const CHUNK_LEN: usize = WORD_LEN.div_ceil(F::WRITE_SIZE) * F::WRITE_SIZE;

    /// Check `region` against the device geometry and take ownership of
    /// the device.
    pub fn new(flash: F, region: NvRegion) -> Result<Self, NvError<F::Error>> {
        if F::WRITE_SIZE > SCRATCH_LEN
            || F::READ_SIZE > SCRATCH_LEN
            || Self::CHUNK_LEN > SCRATCH_LEN
        {
            return Err(NvError::UnsupportedWriteSize);
        }

        let erase = F::ERASE_SIZE as u32;
        if region.size == 0 || region.offset % erase != 0 || region.size % erase != 0 {
            return Err(NvError::RegionMisaligned);
        }

        match region.end() {
            Some(end) if end as usize <= flash.capacity() => {}
            _ => return Err(NvError::RegionOutOfBounds),
        }

        #[cfg(feature = "defmt")]
        defmt::info!(
            "nvstore: region {=u32:#x}..{=u32:#x}",
            region.offset,
            region.offset + region.size
        );

        Ok(Self { flash, region })
    }

    pub fn region(&self) -> NvRegion {
        self.region
    }

    /// Give the device back.
    pub fn release(self) -> F {
        self.flash
    }

    fn padded_len(len: usize) -> usize {
        len.div_ceil(Self::CHUNK_LEN) * Self::CHUNK_LEN
    }

    fn check_fits(&self, len: usize) -> Result<(), NvError<F::Error>> {
        if Self::padded_len(len) > self.region.size as usize {
            return Err(NvError::BlobTooLarge);
        }
        Ok(())
    }

    fn erase_region(&mut self) -> Result<(), NvError<F::Error>> {
        let from = self.region.offset;
        let to = from + self.region.size;
        self.flash.erase(from, to).map_err(NvError::Erase)
    }

    /// Program one chunk of `buf`, padding a short tail with the erased
    /// pattern.
    fn program_chunk(&mut self, buf: &[u8], index: usize) -> Result<(), F::Error> {
        let start = index * Self::CHUNK_LEN;
        let end = (start + Self::CHUNK_LEN).min(buf.len());

        let mut scratch = [0xFFu8; SCRATCH_LEN];
        scratch[..end - start].copy_from_slice(&buf[start..end]);
        let at = self.region.offset + start as u32;
        self.flash.write(at, &scratch[..Self::CHUNK_LEN])
    }
}

impl<F: NorFlash> PresetStorage for NvStore<F> {
    type Error = NvError<F::Error>;

    fn load(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        if buf.len() > self.region.size as usize {
            return Err(NvError::BlobTooLarge);
        }

        // Whole READ_SIZE units through the scratch buffer; SCRATCH_LEN is a
        // multiple of any supported READ_SIZE.
        let mut scratch = [0u8; SCRATCH_LEN];
        for (i, part) in buf.chunks_mut(SCRATCH_LEN).enumerate() {
            let offset = self.region.offset + (i * SCRATCH_LEN) as u32;
            let len = part.len().div_ceil(F::READ_SIZE) * F::READ_SIZE;
            self.flash
                .read(offset, &mut scratch[..len])
                .map_err(NvError::Read)?;
            part.copy_from_slice(&scratch[..part.len()]);
        }
        Ok(())
    }

    fn save(&mut self, buf: &[u8]) -> Result<(), Self::Error> {
        self.check_fits(buf.len())?;

        #[cfg(feature = "defmt")]
        defmt::info!("nvstore: erase");
        self.erase_region()?;

        #[cfg(feature = "defmt")]
        defmt::info!("nvstore: program {} bytes", buf.len());

        let chunks = buf.len().div_ceil(Self::CHUNK_LEN);
        let header_chunks = HEADER_LEN.div_ceil(Self::CHUNK_LEN).min(chunks);

        let mut failed_words = 0u32;
        let mut first: Option<(u32, F::Error)> = None;

        // Records first, then the header.
        for index in (header_chunks..chunks).chain(0..header_chunks) {
            if let Err(e) = self.program_chunk(buf, index) {
                let offset = self.region.offset + (index * Self::CHUNK_LEN) as u32;

                #[cfg(feature = "defmt")]
                defmt::error!("nvstore: program failed at {=u32:#x}", offset);

                failed_words += 1;
                if first.is_none() {
                    first = Some((offset, e));
                }
            }
        }

        match first {
            None => {
                #[cfg(feature = "defmt")]
                defmt::info!("nvstore: save done");
                Ok(())
            }
            Some((first_offset, error)) => Err(NvError::Program {
                failed_words,
                first_offset,
                error,
            }),
        }
    }

    fn erase(&mut self) -> Result<(), Self::Error> {
        #[cfg(feature = "defmt")]
        defmt::info!("nvstore: erase region");
        self.erase_region()
    }
}

// ── Unit Tests ───────────────────────────────────────────────────────
