use std::ops::Range;

use mockall::mock;
use rvdiff_core::asm::MemoryImage;
use rvdiff_core::common::RefFault;
use rvdiff_core::refmodel::ReferenceModel;

mock! {
    pub Reference {}
    impl ReferenceModel for Reference {
        fn reset(&mut self);
        fn load(&mut self, image: &MemoryImage);
        fn fill(&mut self, range: Range<u32>, value: u8);
        fn step(&mut self) -> Result<(), RefFault>;
        fn is_done(&self) -> bool;
        fn reg(&self, idx: usize) -> u32;
        fn read_byte(&self, addr: u32) -> Option<u8>;
    }
}

/// A reference that accepts any program and finishes immediately with all
/// registers zero and all memory reading `fill`.
pub fn finished_reference(fill: u8) -> MockReference {
    let mut reference = MockReference::new();
    reference.expect_reset().return_const(());
    reference.expect_load().return_const(());
    reference.expect_fill().return_const(());
    reference.expect_is_done().return_const(true);
    reference.expect_reg().return_const(0u32);
    reference.expect_read_byte().return_const(Some(fill));
    reference
}
