// SPDX-License-Identifier: MIT
//
// Portions of this file are derived from the aarch64-paging crate, which is redistributed under
// the MIT License. For more details, see: https://github.com/google/aarch64-paging

//! ARMv7 short-descriptor translation table types which don't assume anything about how the
//! tables themselves are mapped.

use core::fmt::{self, Debug, Display, Formatter};
use core::ops::{Add, Sub};
use core::ptr::NonNull;

use bitflags::bitflags;

use crate::mem::vm::TableLevel;

/// Number of entries in a second-level (coarse) table. Each entry covers 4 KiB.
pub const L2_ENTRIES: usize = 256;

/// Shift from a virtual address to its first-level table index.
pub const L1_SHIFT: u32 = 20;

/// Size in bytes of a second-level table, which is also its required alignment.
pub const L2_TABLE_SIZE: u32 = 0x400;

/// Bit 18 of a section descriptor, set for super-sections.
const SUPER_SECTION_BIT: u32 = 1 << 18;

const TYPE_MASK: u32 = 0b11;

bitflags! {
    /// Attribute bits of a first-level section or super-section descriptor.
    pub struct SectionAttributes: u32 {
        const BUFFERABLE    = 1 << 2;
        const CACHEABLE     = 1 << 3;
        const EXECUTE_NEVER = 1 << 4;
        const AP0           = 1 << 10;
        const AP1           = 1 << 11;
        const AP2           = 1 << 15;
        const SHAREABLE     = 1 << 16;
        const NON_GLOBAL    = 1 << 17;
        const SUPER_SECTION = SUPER_SECTION_BIT;
        const NON_SECURE    = 1 << 19;
    }
}

bitflags! {
    /// Attribute bits shared by second-level small and large page descriptors.
    pub struct PageAttributes: u32 {
        const BUFFERABLE = 1 << 2;
        const CACHEABLE  = 1 << 3;
        const AP0        = 1 << 4;
        const AP1        = 1 << 5;
        const AP2        = 1 << 9;
        const SHAREABLE  = 1 << 10;
        const NON_GLOBAL = 1 << 11;
    }
}

/// Which translation table base register a walk starts from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TableSelect {
    /// The table covering the bottom of the address space, sized by `TTBCR.N`. Conventionally
    /// process-local.
    Ttbr0,
    /// The fixed 16 KiB table, conventionally mapping the kernel.
    Ttbr1,
}

impl Display for TableSelect {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Ttbr0 => write!(f, "TTBR0"),
            Self::Ttbr1 => write!(f, "TTBR1"),
        }
    }
}

/// An ARMv7 virtual address, the input type of the short-descriptor walk.
#[derive(Copy, Clone, Eq, Ord, PartialEq, PartialOrd)]
pub struct VirtualAddress(pub u32);

impl VirtualAddress {
    /// Returns the index of the first-level entry covering this address.
    pub const fn l1_index(self) -> usize {
        (self.0 >> L1_SHIFT) as usize
    }
}

impl Display for VirtualAddress {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "{:#010x}", self.0)
    }
}

impl Debug for VirtualAddress {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "VirtualAddress({})", self)
    }
}

/// Distance between two addresses, wrapping around the 32-bit space.
impl Sub for VirtualAddress {
    type Output = u32;

    fn sub(self, other: Self) -> Self::Output {
        self.0.wrapping_sub(other.0)
    }
}

/// Offsets an address, wrapping around the 32-bit space.
impl Add<u32> for VirtualAddress {
    type Output = Self;

    fn add(self, other: u32) -> Self {
        Self(self.0.wrapping_add(other))
    }
}

/// A physical address, the output type of the walk.
#[derive(Copy, Clone, Eq, Ord, PartialEq, PartialOrd)]
pub struct PhysicalAddress(pub u32);

impl Display for PhysicalAddress {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "{:#010x}", self.0)
    }
}

impl Debug for PhysicalAddress {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "PhysicalAddress({})", self)
    }
}

/// A range of physical memory, stored as start and length so that a frame ending at the top of
/// the 32-bit space is representable.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct PhysicalMemoryRegion {
    start: PhysicalAddress,
    len: u32,
}

impl PhysicalMemoryRegion {
    pub const fn new(start: PhysicalAddress, len: u32) -> Self {
        Self { start, len }
    }

    /// Returns the first physical address of the region.
    pub const fn start(&self) -> PhysicalAddress {
        self.start
    }

    /// Returns the length of the region in bytes.
    pub const fn len(&self) -> u32 {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn contains(&self, pa: PhysicalAddress) -> bool {
        pa.0.wrapping_sub(self.start.0) < self.len
    }
}

impl Display for PhysicalMemoryRegion {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}+{:#x}", self.start, self.len)
    }
}

impl Debug for PhysicalMemoryRegion {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        Display::fmt(self, f)
    }
}

/// The size of memory mapped by a single terminal descriptor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Granule {
    /// 4 KiB, one second-level slot.
    SmallPage,
    /// 64 KiB, replicated across 16 consecutive second-level slots.
    LargePage,
    /// 1 MiB, one first-level entry.
    Section,
    /// 16 MiB, replicated across 16 consecutive first-level entries.
    SuperSection,
}

impl Granule {
    /// Returns the size of the granule in bytes.
    pub const fn size(self) -> u32 {
        match self {
            Self::SmallPage => 0x0000_1000,
            Self::LargePage => 0x0001_0000,
            Self::Section => 0x0010_0000,
            Self::SuperSection => 0x0100_0000,
        }
    }

    const fn mask(self) -> u32 {
        self.size() - 1
    }

    /// Returns `value` with the bits below the granule cleared. Applied to a descriptor this is
    /// the physical base of the frame.
    pub const fn base_of(self, value: u32) -> u32 {
        value & !self.mask()
    }

    /// Returns the offset of `va` within its granule.
    pub const fn offset_of(self, va: VirtualAddress) -> u32 {
        va.0 & self.mask()
    }

    /// Returns the first virtual address of the granule containing `va`.
    pub const fn region_start(self, va: VirtualAddress) -> VirtualAddress {
        VirtualAddress(self.base_of(va.0))
    }

    /// Returns whether `va` falls inside the granule starting at `start`.
    pub fn covers(self, start: VirtualAddress, va: VirtualAddress) -> bool {
        va >= start && va - start < self.size()
    }

    /// Combines the frame base held in `descriptor` with the offset of `va`.
    pub const fn to_physical(self, descriptor: u32, va: VirtualAddress) -> PhysicalAddress {
        PhysicalAddress(self.base_of(descriptor) + self.offset_of(va))
    }
}

/// A decoded first-level descriptor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum L1Entry {
    /// Type `00` or the reserved type `11`.
    Fault,
    /// Type `01`, pointing at a coarse second-level table.
    PageTable { table: PhysicalAddress },
    /// Type `10`, a section or super-section.
    Block {
        base: PhysicalAddress,
        granule: Granule,
    },
}

/// A decoded second-level descriptor.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum L2Entry {
    /// Type `00`.
    Fault,
    /// A small page (type `1x`) or large page (type `01`).
    Page {
        base: PhysicalAddress,
        granule: Granule,
    },
}

impl L2Entry {
    /// Returns how many consecutive slots of the table this entry occupies.
    pub const fn slots(&self) -> usize {
        match self {
            Self::Fault => 1,
            Self::Page { granule, .. } => {
                (granule.size() / Granule::SmallPage.size()) as usize
            }
        }
    }
}

/// An entry in a first-level table.
#[derive(Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct FirstLevelDescriptor(pub u32);

impl FirstLevelDescriptor {
    pub const fn decode(self) -> L1Entry {
        match self.0 & TYPE_MASK {
            0b01 => L1Entry::PageTable {
                table: PhysicalAddress(self.0 & !(L2_TABLE_SIZE - 1)),
            },
            0b10 => {
                let granule = if self.0 & SUPER_SECTION_BIT != 0 {
                    Granule::SuperSection
                } else {
                    Granule::Section
                };
                L1Entry::Block {
                    base: PhysicalAddress(granule.base_of(self.0)),
                    granule,
                }
            }
            _ => L1Entry::Fault,
        }
    }
}

impl Debug for FirstLevelDescriptor {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "{:#010x}", self.0)?;
        match self.decode() {
            L1Entry::Fault => Ok(()),
            L1Entry::PageTable { table } => write!(f, " (table {})", table),
            L1Entry::Block { base, granule } => write!(
                f,
                " ({:?} {}, {:?})",
                granule,
                base,
                SectionAttributes::from_bits_truncate(self.0)
            ),
        }
    }
}

/// An entry in a second-level table.
#[derive(Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct SecondLevelDescriptor(pub u32);

impl SecondLevelDescriptor {
    pub const fn decode(self) -> L2Entry {
        let granule = if self.0 & 0b10 != 0 {
            Granule::SmallPage
        } else if self.0 & TYPE_MASK == 0b01 {
            Granule::LargePage
        } else {
            return L2Entry::Fault;
        };
        L2Entry::Page {
            base: PhysicalAddress(granule.base_of(self.0)),
            granule,
        }
    }
}

impl Debug for SecondLevelDescriptor {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "{:#010x}", self.0)?;
        if let L2Entry::Page { base, granule } = self.decode() {
            write!(
                f,
                " ({:?} {}, {:?})",
                granule,
                base,
                PageAttributes::from_bits_truncate(self.0)
            )?;
        }
        Ok(())
    }
}

/// An implementation of this trait needs to be provided to the walk, so that the physical
/// addresses of translation tables can be converted into pointers that can be read from the code.
///
/// # Safety
///
/// A returned pointer must be aligned and valid for volatile reads of `level.table_size()` bytes
/// starting at `pa`: 16 KiB for a first-level table, 1 KiB for a second-level table.
pub unsafe trait Translation {
    /// Given the physical address of a table at `level`, returns the virtual address at which it
    /// is mapped, or `None` if it is not currently reachable.
    fn physical_to_virtual(&self, pa: PhysicalAddress, level: TableLevel) -> Option<NonNull<u32>>;
}

unsafe impl<T: Translation + ?Sized> Translation for &T {
    fn physical_to_virtual(&self, pa: PhysicalAddress, level: TableLevel) -> Option<NonNull<u32>> {
        (**self).physical_to_virtual(pa, level)
    }
}

/// A resolved translation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Mapping {
    pub virtual_address: VirtualAddress,
    pub physical: PhysicalAddress,
    pub granule: Granule,
    /// The table the mapping was found in.
    pub table: TableSelect,
}

impl Mapping {
    /// Returns the physical frame backing the mapping.
    pub const fn frame(&self) -> PhysicalMemoryRegion {
        PhysicalMemoryRegion::new(
            PhysicalAddress(self.granule.base_of(self.physical.0)),
            self.granule.size(),
        )
    }

    /// Returns the number of bytes from the resolved address to the end of its frame, i.e. how
    /// far the range is known to be physically contiguous.
    pub const fn remaining(&self) -> u32 {
        self.granule.size() - self.granule.offset_of(self.virtual_address)
    }
}
