//! ELF loading.
//!
//! Reads statically linked RV32 executables into a [`MemoryImage`]: one
//! section per loadable segment, zero-filled up to its memory size, with the
//! ELF entry point.

use std::fs;
use std::path::Path;

use object::{Architecture, Object, ObjectSegment};
use tracing::debug;

use crate::asm::MemoryImage;
use crate::common::HarnessError;

impl MemoryImage {
    /// Parses an in-memory ELF file.
    pub fn from_elf(bytes: &[u8]) -> Result<Self, HarnessError> {
        let file = object::File::parse(bytes).map_err(|e| HarnessError::Elf(e.to_string()))?;
        if file.architecture() != Architecture::Riscv32 {
            return Err(HarnessError::Elf(format!(
                "expected a RISC-V 32-bit image, found {:?}",
                file.architecture()
            )));
        }

        let entry = u32::try_from(file.entry())
            .map_err(|_| HarnessError::Elf(format!("entry {:#x} out of range", file.entry())))?;
        let mut image = Self::new(entry);

        for segment in file.segments() {
            let addr = u32::try_from(segment.address()).map_err(|_| {
                HarnessError::Elf(format!("segment at {:#x} out of range", segment.address()))
            })?;
            let mut data = segment
                .data()
                .map_err(|e| HarnessError::Elf(e.to_string()))?
                .to_vec();
            let mem_size = usize::try_from(segment.size())
                .map_err(|_| HarnessError::Elf("segment too large".to_string()))?;
            if data.len() < mem_size {
                data.resize(mem_size, 0);
            }
            if data.is_empty() {
                continue;
            }
            debug!(addr = format_args!("{addr:#x}"), len = data.len(), "ELF segment");
            image.push_section(addr, data);
        }
        Ok(image)
    }
}

/// Reads and parses the ELF file at `path`.
pub fn load_elf(path: &Path) -> Result<MemoryImage, HarnessError> {
    let bytes = fs::read(path)
        .map_err(|e| HarnessError::Elf(format!("cannot read {}: {e}", path.display())))?;
    MemoryImage::from_elf(&bytes)
}
