// SPDX-License-Identifier: MIT

//! Manual walk of the short-descriptor translation tables for a single address.

use core::ptr::NonNull;

use log::{debug, trace};

use crate::mem::vm::paging::{
    FirstLevelDescriptor, Granule, L1Entry, L2Entry, Mapping, PhysicalAddress,
    SecondLevelDescriptor, TableSelect, Translation, VirtualAddress, L1_SHIFT, L2_ENTRIES,
};
use crate::mem::vm::registers::RegisterSnapshot;
use crate::mem::vm::{TableLevel, WalkError};

/// Walks one translation table hierarchy, reaching table memory through a [`Translation`].
pub struct TranslationWalker<'a, T: ?Sized> {
    snapshot: &'a RegisterSnapshot,
    translation: &'a T,
}

impl<'a, T: Translation + ?Sized> TranslationWalker<'a, T> {
    pub fn new(snapshot: &'a RegisterSnapshot, translation: &'a T) -> Self {
        Self {
            snapshot,
            translation,
        }
    }

    /// Resolves `va` through the table selected by `select`.
    ///
    /// For `TTBR0` the caller is responsible for `va` lying inside the region sized by
    /// `TTBCR.N`; the first-level index is taken from the full address either way.
    pub fn walk(&self, select: TableSelect, va: VirtualAddress) -> Result<Mapping, WalkError> {
        if select == TableSelect::Ttbr0 && !self.snapshot.ttbr0_covers(va) {
            debug!(
                "{} lies outside the {}-bit TTBR0 region, walking anyway",
                va,
                self.snapshot.ttbr0_span_bits()
            );
        }

        let base = self.snapshot.table_base(select);
        trace!(
            "{}: L1 table @ {}, {:?}",
            select,
            base,
            self.snapshot.walk_attributes(select)
        );
        let l1 = self.map_table(TableLevel::First, base)?;
        // Safe because the `Translation` contract makes the whole first-level table readable.
        let descriptor = FirstLevelDescriptor(unsafe { read_entry(l1, va.l1_index()) });
        trace!("{}: L1[{}] = {:?}", select, va.l1_index(), descriptor);

        match descriptor.decode() {
            L1Entry::Fault => Err(WalkError::InvalidDescriptor {
                level: TableLevel::First,
                descriptor: descriptor.0,
            }),
            L1Entry::PageTable { table } => self.scan_second_level(select, table, va),
            L1Entry::Block { granule, .. } => {
                let start = granule.region_start(va);
                if granule.covers(start, va) {
                    Ok(Mapping {
                        virtual_address: va,
                        physical: granule.to_physical(descriptor.0, va),
                        granule,
                        table: select,
                    })
                } else {
                    Err(WalkError::NotCovered(va))
                }
            }
        }
    }

    /// Like [`walk`](Self::walk), but only reports whether a physical address was found.
    pub fn translate(&self, select: TableSelect, va: VirtualAddress) -> Option<PhysicalAddress> {
        self.walk(select, va).ok().map(|mapping| mapping.physical)
    }

    /// Searches the coarse table at `table` for the entry covering `va`.
    ///
    /// Large page descriptors are replicated over 16 slots, so the scan steps over a whole large
    /// page at a time rather than indexing the table directly.
    fn scan_second_level(
        &self,
        select: TableSelect,
        table: PhysicalAddress,
        va: VirtualAddress,
    ) -> Result<Mapping, WalkError> {
        let l2 = self.map_table(TableLevel::Second, table)?;
        let region = VirtualAddress((va.l1_index() as u32) << L1_SHIFT);

        let mut slot = 0;
        while slot < L2_ENTRIES {
            // Safe because `slot` stays below the table length the `Translation` guarantees.
            let descriptor = SecondLevelDescriptor(unsafe { read_entry(l2, slot) });
            let entry = descriptor.decode();

            if let L2Entry::Page { granule, .. } = entry {
                // Slots are 4 KiB apart for both page sizes; a large page starts at its first slot.
                let start = region + slot as u32 * Granule::SmallPage.size();
                if granule.covers(start, va) {
                    trace!("{}: L2[{}] = {:?}", select, slot, descriptor);
                    return Ok(Mapping {
                        virtual_address: va,
                        physical: granule.to_physical(descriptor.0, va),
                        granule,
                        table: select,
                    });
                }
            }
            slot += entry.slots();
        }

        Err(WalkError::NotCovered(va))
    }

    fn map_table(&self, level: TableLevel, pa: PhysicalAddress) -> Result<NonNull<u32>, WalkError> {
        self.translation.physical_to_virtual(pa, level).ok_or_else(|| {
            debug!("Cannot map {} translation table @ {}", level, pa);
            WalkError::UnmappedTable { level, table: pa }
        })
    }
}

/// Reads entry `index` of the table at `table`.
///
/// # Safety
///
/// `table` must be valid for reads of at least `index + 1` entries.
unsafe fn read_entry(table: NonNull<u32>, index: usize) -> u32 {
    table.as_ptr().add(index).read_volatile()
}
