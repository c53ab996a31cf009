//! Byte-addressable test memory.
//!
//! Backs the `[0, size)` window of the test device and the reference model's
//! memory. Word accesses are little-endian; writes honour a 4-bit byte strobe.

use std::ops::Range;

use tracing::debug;

use crate::asm::MemoryImage;

/// Flat little-endian byte store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    /// Creates a zeroed memory of `size` bytes.
    pub fn new(size: u32) -> Self {
        Self {
            bytes: vec![0; size as usize],
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// True when `addr..addr + len` lies inside memory.
    pub fn contains(&self, addr: u32, len: u32) -> bool {
        u64::from(addr) + u64::from(len) <= self.bytes.len() as u64
    }

    /// Reads one byte; `None` outside memory.
    pub fn read_byte(&self, addr: u32) -> Option<u8> {
        self.bytes.get(addr as usize).copied()
    }

    /// Writes one byte; returns false outside memory.
    pub fn write_byte(&mut self, addr: u32, value: u8) -> bool {
        self.bytes.get_mut(addr as usize).map(|b| *b = value).is_some()
    }

    /// Reads the little-endian word at `addr`. Bytes past the end read as zero.
    pub fn read_word(&self, addr: u32) -> u32 {
        let mut word = [0u8; 4];
        for (i, byte) in word.iter_mut().enumerate() {
            *byte = self.read_byte(addr.wrapping_add(i as u32)).unwrap_or(0);
        }
        u32::from_le_bytes(word)
    }

    /// Writes the byte lanes of `wdata` selected by `wstrb` (bit i enables byte i).
    ///
    /// Unselected bytes keep their previous value. Selected bytes past the end
    /// of memory are dropped; returns how many were.
    pub fn write_strobed(&mut self, addr: u32, wdata: u32, wstrb: u8) -> usize {
        let mut dropped = 0;
        for (i, byte) in wdata.to_le_bytes().into_iter().enumerate() {
            if wstrb & (1 << i) != 0 && !self.write_byte(addr.wrapping_add(i as u32), byte) {
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!(
                addr = format_args!("{addr:#010x}"),
                wstrb = format_args!("{wstrb:#06b}"),
                dropped,
                "memory: strobed write runs past the end of memory"
            );
        }
        dropped
    }

    /// Copies every section of `image` into memory. Bytes outside memory are dropped.
    ///
    /// Returns the number of bytes that did not fit.
    pub fn load(&mut self, image: &MemoryImage) -> usize {
        let mut dropped = 0;
        for section in image.sections() {
            for (i, byte) in section.data.iter().enumerate() {
                let fits = section
                    .addr
                    .checked_add(i as u32)
                    .is_some_and(|addr| self.write_byte(addr, *byte));
                if !fits {
                    dropped += 1;
                }
            }
        }
        dropped
    }

    /// Sets every byte in `range` (clipped to memory) to `value`.
    pub fn fill(&mut self, range: Range<u32>, value: u8) {
        let end = (range.end as usize).min(self.bytes.len());
        let start = (range.start as usize).min(end);
        self.bytes[start..end].fill(value);
    }
}
