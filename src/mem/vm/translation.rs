// SPDX-License-Identifier: MIT

use core::ptr::NonNull;

use crate::mem::vm::paging::{PhysicalAddress, PhysicalMemoryRegion, Translation};
use crate::mem::vm::TableLevel;

//--------------------------------------------------------------------------------------------------
// Public definitions
//--------------------------------------------------------------------------------------------------
/// Reaches translation tables through the kernel's linear mapping of low memory.
pub struct DirectMapTranslation {
    /// The physical memory covered by the linear mapping.
    window: PhysicalMemoryRegion,
    /// The offset from a physical address in the window to its virtual address.
    offset: u32,
}

//--------------------------------------------------------------------------------------------------
// Public code
//--------------------------------------------------------------------------------------------------
impl DirectMapTranslation {
    /// Creates a translation for `len` bytes of physical memory starting at `phys_start`, mapped
    /// linearly at `virt_start`.
    ///
    /// # Safety
    ///
    /// The whole window must be mapped readable at `virt_start` for as long as the translation is
    /// used.
    pub const unsafe fn new(phys_start: PhysicalAddress, virt_start: u32, len: u32) -> Self {
        Self {
            window: PhysicalMemoryRegion::new(phys_start, len),
            offset: virt_start.wrapping_sub(phys_start.0),
        }
    }

    pub const fn window(&self) -> PhysicalMemoryRegion {
        self.window
    }
}

unsafe impl Translation for DirectMapTranslation {
    /// Returns `None` for tables that don't fit entirely inside the window.
    fn physical_to_virtual(&self, pa: PhysicalAddress, level: TableLevel) -> Option<NonNull<u32>> {
        let start = pa.0.wrapping_sub(self.window.start().0);
        if start > self.window.len() || self.window.len() - start < level.table_size() {
            return None;
        }
        NonNull::new(pa.0.wrapping_add(self.offset) as usize as *mut u32)
    }
}
