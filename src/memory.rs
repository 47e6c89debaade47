//! The 4k address space of the CHIP-8 and the loader that places programs into it.
//!
//! Layout:
//!   0x000-0x04F  font sprites (16 glyphs, 5 bytes each)
//!   0x050-0x1FF  reserved for the interpreter
//!   0x200-0xFFF  program and its working data
use std::io;
use std::io::Read;
use thiserror::Error;

/// how much RAM we have
pub const MEMORY_SIZE: usize = 4096;

/// first byte of the program region, everything below it belongs to the interpreter
pub const STARTING_MEMORY_BYTE: usize = 0x200;

/// largest ROM that fits between STARTING_MEMORY_BYTE and the end of memory
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - STARTING_MEMORY_BYTE;

/// where the font sprites start
pub const FONT_BASE: u16 = 0x000;

pub const NUM_BYTES_IN_FONT_CHAR: u8 = 5;

/// The 16 hex digit sprites, 0 through F
pub const FONT_SET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("ROM is {size} bytes, but at most {max} bytes fit in program memory")]
    RomTooLarge { size: usize, max: usize },

    #[error("failed to read ROM: {0}")]
    Read(#[from] io::Error),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MemoryError {
    #[error("memory access out of bounds at address {address:#06X}")]
    OutOfBounds { address: usize },
}

/// 4096 bytes of RAM with the font already seeded. All access is bounds checked.
#[derive(Clone)]
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        let mut bytes = [0; MEMORY_SIZE];
        let font_start = FONT_BASE as usize;
        bytes[font_start..font_start + FONT_SET.len()].copy_from_slice(&FONT_SET);

        Memory { bytes }
    }

    /// Copy `rom` into the program region. Nothing is written unless the whole
    /// image fits.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), LoadError> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(LoadError::RomTooLarge {
                size: rom.len(),
                max: MAX_ROM_SIZE,
            });
        }

        self.bytes[STARTING_MEMORY_BYTE..STARTING_MEMORY_BYTE + rom.len()].copy_from_slice(rom);
        Ok(())
    }

    /// Read an image from `reader` and then `load` it. At most one byte past
    /// `MAX_ROM_SIZE` is consumed, enough to report `RomTooLarge`. A failed
    /// read leaves memory untouched.
    pub fn load_from_reader<R: io::Read>(&mut self, reader: R) -> Result<usize, LoadError> {
        let mut rom = Vec::with_capacity(MAX_ROM_SIZE + 1);
        reader
            .take(MAX_ROM_SIZE as u64 + 1)
            .read_to_end(&mut rom)?;
        self.load(&rom)?;
        Ok(rom.len())
    }

    pub fn read(&self, address: usize) -> Result<u8, MemoryError> {
        self.bytes
            .get(address)
            .copied()
            .ok_or(MemoryError::OutOfBounds { address })
    }

    /// Big-endian 16 bit word at `address` and `address + 1`
    pub fn read_word(&self, address: usize) -> Result<u16, MemoryError> {
        let word = self.read_slice(address, 2)?;
        Ok(u16::from_be_bytes([word[0], word[1]]))
    }

    pub fn read_slice(&self, address: usize, len: usize) -> Result<&[u8], MemoryError> {
        let end = Self::checked_end(address, len)?;
        Ok(&self.bytes[address..end])
    }

    pub fn write(&mut self, address: usize, byte: u8) -> Result<(), MemoryError> {
        let slot = self
            .bytes
            .get_mut(address)
            .ok_or(MemoryError::OutOfBounds { address })?;
        *slot = byte;
        Ok(())
    }

    /// Write all of `data` starting at `address`, or nothing if any byte would
    /// land outside memory
    pub fn write_slice(&mut self, address: usize, data: &[u8]) -> Result<(), MemoryError> {
        let end = Self::checked_end(address, data.len())?;
        self.bytes[address..end].copy_from_slice(data);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    // report the first address that falls outside memory
    fn checked_end(address: usize, len: usize) -> Result<usize, MemoryError> {
        match address.checked_add(len) {
            Some(end) if end <= MEMORY_SIZE => Ok(end),
            _ => Err(MemoryError::OutOfBounds {
                address: address.max(MEMORY_SIZE),
            }),
        }
    }
}

impl Default for Memory {
    fn default() -> Self {
        Memory::new()
    }
}
