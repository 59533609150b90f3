// SPDX-License-Identifier: MIT
//
// Translation table types are modelled after the aarch64-paging crate
// (https://github.com/google/aarch64-paging), reworked for the ARMv7 short-descriptor format.

//--------------------------------------------------------------------------------------------------
// Public definitions
//--------------------------------------------------------------------------------------------------

use core::fmt::{self, Display, Formatter};

use paging::{PhysicalAddress, VirtualAddress};

pub mod paging;
pub mod registers;
pub mod translation;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_memory;

/// Which level of the translation table hierarchy a descriptor or table belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TableLevel {
    /// The 4096-entry first-level table located by `TTBR0` or `TTBR1`.
    First,
    /// A 256-entry coarse page table referenced by a first-level page table descriptor.
    Second,
}

/// An error attempting to resolve a virtual address through the translation tables.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WalkError {
    /// The table at the given physical address is not reachable through the [`Translation`]
    /// in use.
    ///
    /// [`Translation`]: paging::Translation
    UnmappedTable {
        level: TableLevel,
        table: PhysicalAddress,
    },
    /// The descriptor covering the address has a fault (or reserved) type.
    InvalidDescriptor { level: TableLevel, descriptor: u32 },
    /// No entry of the second-level table covers the address.
    NotCovered(VirtualAddress),
    /// `TTBCR.EAE` selects the long-descriptor format, which this walker does not decode.
    LongDescriptorFormat,
}

impl TableLevel {
    /// Returns the size in bytes of a full table at this level.
    pub const fn table_size(self) -> u32 {
        match self {
            Self::First => 0x4000,
            Self::Second => 0x400,
        }
    }
}

impl Display for TableLevel {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::First => write!(f, "L1"),
            Self::Second => write!(f, "L2"),
        }
    }
}

impl Display for WalkError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::UnmappedTable { level, table } => {
                write!(f, "Cannot map {} translation table @ {}", level, table)
            }
            Self::InvalidDescriptor { level, descriptor } => {
                write!(f, "Invalid {} descriptor {:#010x}", level, descriptor)
            }
            Self::NotCovered(va) => write!(f, "Virtual address {} not covered by any L2 entry", va),
            Self::LongDescriptorFormat => {
                write!(f, "Long-descriptor translation table format is not supported")
            }
        }
    }
}
