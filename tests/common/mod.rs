// SPDX-License-Identifier: MIT
use std::cell::Cell;
use std::ptr::NonNull;

use arm_v2p::{PhysicalAddress, RegisterSource, TableLevel, Translation};

pub const TTBR0_TABLE: u32 = 0x0000_4000;
pub const TTBR1_TABLE: u32 = 0x0000_8000;
pub const L2_TABLE: u32 = 0x0000_c000;

/// 128 KiB of physical memory starting at address 0, mapped one to one.
pub struct Memory {
    words: Vec<u32>,
}

impl Memory {
    pub fn new() -> Self {
        Self {
            words: vec![0; 0x2_0000 / 4],
        }
    }

    pub fn set(&mut self, table: u32, index: usize, descriptor: u32) {
        self.words[(table as usize + index * 4) / 4] = descriptor;
    }
}

unsafe impl Translation for Memory {
    fn physical_to_virtual(&self, pa: PhysicalAddress, level: TableLevel) -> Option<NonNull<u32>> {
        let first = pa.0 as usize / 4;
        if first + level.table_size() as usize / 4 > self.words.len() {
            return None;
        }
        NonNull::new(self.words[first..].as_ptr() as *mut u32)
    }
}

/// Register values for a kernel with a full-size TTBR0 table.
pub struct Registers {
    pub ttbr0: u32,
    pub ttbr1: u32,
    pub ttbcr: u32,
    pub reads: Cell<u32>,
}

impl Registers {
    pub fn new() -> Self {
        Self {
            ttbr0: TTBR0_TABLE | 0x6a,
            ttbr1: TTBR1_TABLE | 0x6a,
            ttbcr: 0,
            reads: Cell::new(0),
        }
    }
}

impl RegisterSource for Registers {
    fn ttbr0(&self) -> u32 {
        self.reads.set(self.reads.get() + 1);
        self.ttbr0
    }

    fn ttbr1(&self) -> u32 {
        self.ttbr1
    }

    fn ttbcr(&self) -> u32 {
        self.ttbcr
    }

    fn sctlr(&self) -> u32 {
        0x00c5_387d
    }
}
