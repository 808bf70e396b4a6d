//! The address space of the chip.
//!
//! - `0x000-0x04F` - The built in `4x5` pixel font set (`0-F`)
//! - `0x050-0x1FF` - Reserved for the interpreter
//! - `0x200-0xFFF` - Program ROM and work RAM
use std::fmt;

use crate::{
    definitions::memory,
    opcode::{build_opcode, Opcode},
    MemoryError,
};

/// The bounds checked memory of the chip.
#[derive(Clone)]
pub struct Memory {
    data: Box<[u8; memory::SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            data: Box::new([0; memory::SIZE]),
        }
    }
}

impl Memory {
    /// will create a new zeroed memory block
    pub fn new() -> Self {
        Self::default()
    }

    /// Will zero the whole memory.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// The amount of bytes that can be addressed.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// checks that `len` bytes starting at `address` are inside the memory
    fn check(&self, address: usize, len: usize) -> Result<(), MemoryError> {
        match address.checked_add(len) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(MemoryError::OutOfRange { address, len }),
        }
    }

    /// Will read a single byte.
    pub fn read(&self, address: usize) -> Result<u8, MemoryError> {
        self.check(address, 1)?;
        Ok(self.data[address])
    }

    /// Will write a single byte.
    pub fn write(&mut self, address: usize, value: u8) -> Result<(), MemoryError> {
        self.check(address, 1)?;
        self.data[address] = value;
        Ok(())
    }

    /// Will copy the buffer into memory starting at `offset`.
    ///
    /// The whole range is validated before anything is written, so a buffer
    /// that does not fit leaves the memory unmodified.
    pub fn load(&mut self, bytes: &[u8], offset: usize) -> Result<(), MemoryError> {
        self.slice_mut(offset, bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// A read only view of `len` bytes starting at `address`.
    pub fn slice(&self, address: usize, len: usize) -> Result<&[u8], MemoryError> {
        self.check(address, len)?;
        Ok(&self.data[address..(address + len)])
    }

    /// A mutable view of `len` bytes starting at `address`.
    pub fn slice_mut(&mut self, address: usize, len: usize) -> Result<&mut [u8], MemoryError> {
        self.check(address, len)?;
        Ok(&mut self.data[address..(address + len)])
    }

    /// Will fetch the big endian opcode at the given pointer.
    pub fn fetch(&self, pointer: usize) -> Result<Opcode, MemoryError> {
        build_opcode(&self.data[..], pointer)
    }

    /// The raw content of the memory.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..]
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory")
            .field("len", &self.data.len())
            .finish()
    }
}

impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::chip8::print::memory_dump(self.as_slice(), 0))
    }
}
