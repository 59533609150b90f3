// SPDX-License-Identifier: MIT
use crate::mem::vm::paging::PhysicalAddress;
use crate::mem::vm::translation::DirectMapTranslation;

//--------------------------------------------------------------------------------------------------
// Public definitions
//--------------------------------------------------------------------------------------------------
#[rustfmt::skip]
pub mod map {
    /// Start of DRAM on the Versatile Express motherboard.
    pub const PHYS_OFFSET: u32 =    0x6000_0000;

    /// Virtual base of the kernel's linear map with the default 3G/1G split.
    pub const PAGE_OFFSET: u32 =    0xC000_0000;

    /// Amount of memory in the linear map, ending 8 MiB below the default vmalloc area.
    pub const LOWMEM_SIZE: u32 =    0x2F80_0000;
}

//--------------------------------------------------------------------------------------------------
// Public code
//--------------------------------------------------------------------------------------------------
/// Returns the translation through the kernel's linear map of low memory.
pub fn kernel_direct_map() -> DirectMapTranslation {
    // Safe because the kernel keeps all of lowmem mapped at PAGE_OFFSET on this board.
    unsafe {
        DirectMapTranslation::new(
            PhysicalAddress(map::PHYS_OFFSET),
            map::PAGE_OFFSET,
            map::LOWMEM_SIZE,
        )
    }
}
