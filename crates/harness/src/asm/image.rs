//! Memory images.
//!
//! A [`MemoryImage`] is an ordered list of `(address, bytes)` sections plus an
//! entry point. Images are produced once per run and loaded into a fresh
//! memory; nothing mutates them after loading.

/// A contiguous run of bytes at a fixed address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Load address of the first byte.
    pub addr: u32,
    /// Section contents.
    pub data: Vec<u8>,
}

impl Section {
    /// One past the last byte address.
    pub fn end(&self) -> u64 {
        u64::from(self.addr) + self.data.len() as u64
    }
}

/// Mapping from byte address to byte value, grouped in sections.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemoryImage {
    sections: Vec<Section>,
    entry: u32,
}

impl MemoryImage {
    /// Creates an empty image starting execution at `entry`.
    pub fn new(entry: u32) -> Self {
        Self {
            sections: Vec::new(),
            entry,
        }
    }

    /// Appends a section.
    pub fn push_section(&mut self, addr: u32, data: Vec<u8>) {
        self.sections.push(Section { addr, data });
    }

    /// The sections in load order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Entry point.
    pub fn entry(&self) -> u32 {
        self.entry
    }

    /// Total number of bytes across all sections.
    pub fn byte_len(&self) -> usize {
        self.sections.iter().map(|s| s.data.len()).sum()
    }

    /// Reads the little-endian word at `addr`, if every byte is covered.
    pub fn read_word(&self, addr: u32) -> Option<u32> {
        let mut bytes = [0u8; 4];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.read_byte(addr.checked_add(i as u32)?)?;
        }
        Some(u32::from_le_bytes(bytes))
    }

    /// Reads one byte, if some section covers `addr`.
    pub fn read_byte(&self, addr: u32) -> Option<u8> {
        self.sections.iter().find_map(|s| {
            let offset = addr.checked_sub(s.addr)? as usize;
            s.data.get(offset).copied()
        })
    }
}
