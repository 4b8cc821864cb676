// In-memory NOR flash with fault injection, used by the unit tests.

use embedded_storage::nor_flash::{ErrorType, NorFlash, NorFlashErrorKind, ReadNorFlash};

pub const CAPACITY: usize = 4096;

pub struct MemFlash {
    pub mem: [u8; CAPACITY],
    pub fail_read: bool,
    pub fail_erase: bool,
    /// Absolute offset of a write that fails.
    pub fail_write_at: Option<u32>,
    pub erases: usize,
    pub writes: usize,
    pub write_log: [u32; 512],
}

impl MemFlash {
    pub fn new() -> Self {
        Self {
            mem: [0xFF; CAPACITY],
            fail_read: false,
            fail_erase: false,
            fail_write_at: None,
            erases: 0,
            writes: 0,
            write_log: [0; 512],
        }
    }

    fn check(offset: u32, len: usize, align: usize) -> Result<(), NorFlashErrorKind> {
        let offset = offset as usize;
        if offset % align != 0 || len % align != 0 {
            return Err(NorFlashErrorKind::NotAligned);
        }
        if offset + len > CAPACITY {
            return Err(NorFlashErrorKind::OutOfBounds);
        }
        Ok(())
    }
}

impl ErrorType for MemFlash {
    type Error = NorFlashErrorKind;
}

impl ReadNorFlash for MemFlash {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        if self.fail_read {
            return Err(NorFlashErrorKind::Other);
        }
        Self::check(offset, bytes.len(), Self::READ_SIZE)?;
        let at = offset as usize;
        bytes.copy_from_slice(&self.mem[at..at + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        CAPACITY
    }
}

impl NorFlash for MemFlash {
    const WRITE_SIZE: usize = 4;
    const ERASE_SIZE: usize = 1024;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        if self.fail_erase {
            return Err(NorFlashErrorKind::Other);
        }
        Self::check(from, (to - from) as usize, Self::ERASE_SIZE)?;
        self.erases += 1;
        self.mem[from as usize..to as usize].fill(0xFF);
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        Self::check(offset, bytes.len(), Self::WRITE_SIZE)?;
        if self.fail_write_at == Some(offset) {
            return Err(NorFlashErrorKind::Other);
        }
        self.write_log[self.writes] = offset;
        self.writes += 1;
        // NOR programming only clears bits.
        let at = offset as usize;
        for (cell, b) in self.mem[at..at + bytes.len()].iter_mut().zip(bytes) {
            *cell &= *b;
        }
        Ok(())
    }
}
