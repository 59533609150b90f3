// SPDX-License-Identifier: MIT
//! End-to-end resolution against synthetic translation tables.

mod common;

use arm_v2p::resolve::{self, virt_to_phys_or_sentinel};
use arm_v2p::{
    AddressResolver, Granule, PhysicalAddress, RegisterSnapshot, TableSelect, VirtualAddress,
    WalkError, NOT_FOUND,
};
use common::{Memory, Registers, L2_TABLE, TTBR0_TABLE, TTBR1_TABLE};

fn resolver(memory: Memory) -> AddressResolver<Memory> {
    AddressResolver::new(RegisterSnapshot::capture(&Registers::new()), memory)
}

#[test]
fn section_maps_offset_unchanged() {
    let mut memory = Memory::new();
    memory.set(TTBR1_TABLE, 0, 0x0000_0412);

    assert_eq!(
        resolver(memory).resolve(VirtualAddress(0x0000_0123)),
        Some(PhysicalAddress(0x0000_0123))
    );
}

#[test]
fn small_page_in_coarse_table() {
    let mut memory = Memory::new();
    memory.set(TTBR1_TABLE, 0, L2_TABLE | 0b01);
    memory.set(L2_TABLE, 5, 0x0010_0002);

    let mapping = resolver(memory).lookup(VirtualAddress(0x0000_5123)).unwrap();
    assert_eq!(mapping.physical, PhysicalAddress(0x0010_0123));
    assert_eq!(mapping.granule, Granule::SmallPage);
    assert_eq!(mapping.remaining(), 0xedd);
}

#[test]
fn reserved_l1_type_is_not_found() {
    let mut memory = Memory::new();
    memory.set(TTBR1_TABLE, 0, 0x0000_0003);
    memory.set(TTBR0_TABLE, 0, 0x0000_0003);

    let resolver = resolver(memory);
    assert_eq!(resolver.resolve(VirtualAddress(0x0000_0123)), None);
    assert!(matches!(
        resolver.lookup(VirtualAddress(0x0000_0123)),
        Err(WalkError::InvalidDescriptor { descriptor: 3, .. })
    ));
}

#[test]
fn super_section_uses_sixteen_megabyte_mask() {
    let mut memory = Memory::new();
    for index in 0xc10..0xc20 {
        memory.set(TTBR1_TABLE, index, 0x8100_0000 | 1 << 18 | 0b10);
    }

    let mapping = resolver(memory).lookup(VirtualAddress(0xc1ab_cdef)).unwrap();
    assert_eq!(mapping.physical, PhysicalAddress(0x81ab_cdef));
    assert_eq!(mapping.frame().start(), PhysicalAddress(0x8100_0000));
}

#[test]
fn mixed_coarse_table() {
    let mut memory = Memory::new();
    memory.set(TTBR0_TABLE, 0x400, L2_TABLE | 0b01);
    // Slots 0..16: one large page. Slot 16: small page. Slots 17..32: unmapped.
    // Slots 32..48: another large page.
    for slot in 0..16 {
        memory.set(L2_TABLE, slot, 0x2001_0001);
    }
    memory.set(L2_TABLE, 16, 0x3000_5002);
    for slot in 32..48 {
        memory.set(L2_TABLE, slot, 0x4002_0001);
    }

    let resolver = resolver(memory);
    let lookup = |va| resolver.lookup(VirtualAddress(va));

    let large = lookup(0x4000_abcd).unwrap();
    assert_eq!(large.physical, PhysicalAddress(0x2001_abcd));
    assert_eq!(large.granule, Granule::LargePage);
    assert_eq!(large.table, TableSelect::Ttbr0);

    assert_eq!(
        lookup(0x4001_0abc).unwrap().physical,
        PhysicalAddress(0x3000_5abc)
    );
    assert_eq!(
        lookup(0x4002_4321).unwrap().physical,
        PhysicalAddress(0x4002_4321)
    );
    assert_eq!(
        lookup(0x4001_1000),
        Err(WalkError::NotCovered(VirtualAddress(0x4001_1000)))
    );
}

#[test]
fn explicit_snapshots_are_independent() {
    let mut memory = Memory::new();
    memory.set(TTBR1_TABLE, 0, 0x0000_0412);
    memory.set(TTBR0_TABLE, 0, 0x0070_0002);

    // Point TTBR1 at an empty table: only the TTBR0 mapping is visible.
    let snapshot = RegisterSnapshot::new(TTBR0_TABLE, 0x0001_0000, 0, 1);
    let resolver = AddressResolver::new(snapshot, &memory);
    assert_eq!(
        resolver.resolve(VirtualAddress(0x0000_0123)),
        Some(PhysicalAddress(0x0070_0123))
    );
}

// The only test touching the process-wide snapshot in this binary.
#[test]
fn process_wide_snapshot_and_sentinel() {
    let mut memory = Memory::new();
    memory.set(TTBR1_TABLE, 0, 0x0000_0412);
    let registers = Registers::new();

    assert!(resolve::current_snapshot().is_none());
    assert_eq!(virt_to_phys_or_sentinel(&registers, &memory, 0x0000_0123), 0x0000_0123);
    assert_eq!(virt_to_phys_or_sentinel(&registers, &memory, 0x0000_0123), 0x0000_0123);
    assert_eq!(virt_to_phys_or_sentinel(&registers, &memory, 0x0010_0000), NOT_FOUND);
    assert_eq!(registers.reads.get(), 1);

    // Later register changes are not observed.
    let moved = Registers {
        ttbr1: 0x0001_0000,
        ..Registers::new()
    };
    assert_eq!(
        resolve::resolve(&moved, &memory, VirtualAddress(0x0000_0123)),
        Some(PhysicalAddress(0x0000_0123))
    );
    assert_eq!(moved.reads.get(), 0);
    assert!(resolve::install_snapshot(RegisterSnapshot::capture(&moved)).is_err());
}
