// SPDX-License-Identifier: MIT
//! Synthetic physical memory for exercising the walk on the host.

use core::ptr::NonNull;

use crate::mem::vm::paging::{PhysicalAddress, Translation};
use crate::mem::vm::TableLevel;

/// The first `len` bytes of physical memory, reachable through an identity mapping.
pub struct LowMemory {
    words: Vec<u32>,
}

impl LowMemory {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len / 4],
        }
    }

    pub fn write(&mut self, pa: u32, value: u32) {
        self.words[pa as usize / 4] = value;
    }

    /// Writes entry `index` of the table at physical address `table`.
    pub fn entry(&mut self, table: u32, index: usize, value: u32) {
        self.write(table + index as u32 * 4, value);
    }
}

unsafe impl Translation for LowMemory {
    fn physical_to_virtual(&self, pa: PhysicalAddress, level: TableLevel) -> Option<NonNull<u32>> {
        let end = pa.0 as usize + level.table_size() as usize;
        if end > self.words.len() * 4 {
            return None;
        }
        NonNull::new(self.words[pa.0 as usize / 4..].as_ptr() as *mut u32)
    }
}
