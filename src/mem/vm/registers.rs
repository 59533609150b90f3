// SPDX-License-Identifier: MIT

use core::fmt::{self, Debug, Formatter};

use tock_registers::{register_bitfields, LocalRegisterCopy};

use crate::mem::vm::paging::{PhysicalAddress, TableSelect, VirtualAddress};
use crate::sync::OnceCell;

//--------------------------------------------------------------------------------------------------
// Public definitions
//--------------------------------------------------------------------------------------------------

register_bitfields! {
    u32,

    /// Translation Table Base Register 0
    pub TTBR0 [
        /// Inner cacheability of table walks (IRGN[1] with the multiprocessing extensions).
        C OFFSET(0) NUMBITS(1) [],
        /// Shareable table walks.
        S OFFSET(1) NUMBITS(1) [],
        /// Outer cacheability of table walks.
        RGN OFFSET(3) NUMBITS(2) [],
        /// Not outer shareable.
        NOS OFFSET(5) NUMBITS(1) []
    ],

    /// Translation Table Base Register 1
    pub TTBR1 [
        C OFFSET(0) NUMBITS(1) [],
        S OFFSET(1) NUMBITS(1) [],
        RGN OFFSET(3) NUMBITS(2) [],
        NOS OFFSET(5) NUMBITS(1) [],
        /// Bits [31:14] of the 16 KiB aligned first-level table.
        BASE OFFSET(14) NUMBITS(18) []
    ],

    /// Translation Table Base Control Register
    pub TTBCR [
        /// TTBR0 translates the low `2^(32 - N)` bytes of the address space.
        N OFFSET(0) NUMBITS(3) [],
        /// Translation table walk disable for TTBR0.
        PD0 OFFSET(4) NUMBITS(1) [],
        /// Translation table walk disable for TTBR1.
        PD1 OFFSET(5) NUMBITS(1) [],
        /// Extended address enable, selecting the long-descriptor format.
        EAE OFFSET(31) NUMBITS(1) []
    ],

    /// System Control Register
    pub SCTLR [
        /// MMU enable.
        M OFFSET(0) NUMBITS(1) [],
        /// Data cache enable.
        C OFFSET(2) NUMBITS(1) [],
        /// Instruction cache enable.
        I OFFSET(12) NUMBITS(1) []
    ]
}

/// Provides the current values of the translation control registers of the calling CPU.
pub trait RegisterSource {
    fn ttbr0(&self) -> u32;
    fn ttbr1(&self) -> u32;
    fn ttbcr(&self) -> u32;
    fn sctlr(&self) -> u32;
}

/// Memory attributes the MMU uses for its own table walks through one TTBR.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct WalkAttributes {
    pub inner_cacheable: bool,
    pub shareable: bool,
    /// Outer cacheability, as the raw `RGN` encoding.
    pub outer_region: u32,
    pub outer_shareable: bool,
}

/// A copy of the translation control registers, taken at one point in time.
///
/// The snapshot is only meaningful while the address space it was taken in stays active.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct RegisterSnapshot {
    ttbr0: u32,
    ttbr1: u32,
    ttbcr: u32,
    sctlr: u32,
}

//--------------------------------------------------------------------------------------------------
// Public code
//--------------------------------------------------------------------------------------------------

impl RegisterSnapshot {
    pub const fn new(ttbr0: u32, ttbr1: u32, ttbcr: u32, sctlr: u32) -> Self {
        Self {
            ttbr0,
            ttbr1,
            ttbcr,
            sctlr,
        }
    }

    /// Reads all registers from `source`.
    pub fn capture<S: RegisterSource + ?Sized>(source: &S) -> Self {
        Self::new(source.ttbr0(), source.ttbr1(), source.ttbcr(), source.sctlr())
    }

    /// Returns the physical address of the first-level table for `select`.
    ///
    /// The TTBR1 table is always 16 KiB aligned. The TTBR0 table shrinks with `TTBCR.N`, so its
    /// base is aligned to `2^(14 - N)` bytes.
    pub fn table_base(&self, select: TableSelect) -> PhysicalAddress {
        match select {
            TableSelect::Ttbr0 => {
                let mask = (1u32 << (14 - self.ttbcr_n())) - 1;
                PhysicalAddress(self.ttbr0 & !mask)
            }
            TableSelect::Ttbr1 => {
                let ttbr1 = LocalRegisterCopy::<u32, TTBR1::Register>::new(self.ttbr1);
                PhysicalAddress(ttbr1.read(TTBR1::BASE) << 14)
            }
        }
    }

    /// Returns `TTBCR.N`.
    pub fn ttbcr_n(&self) -> u32 {
        LocalRegisterCopy::<u32, TTBCR::Register>::new(self.ttbcr).read(TTBCR::N)
    }

    /// Returns the number of low virtual address bits translated through TTBR0.
    pub fn ttbr0_span_bits(&self) -> u32 {
        32 - self.ttbcr_n()
    }

    /// Returns whether `va` lies inside the region TTBR0 is sized for.
    pub fn ttbr0_covers(&self, va: VirtualAddress) -> bool {
        let bits = self.ttbr0_span_bits();
        bits == 32 || va.0 >> bits == 0
    }

    /// Returns the table walk attributes held in the low bits of the selected TTBR.
    pub fn walk_attributes(&self, select: TableSelect) -> WalkAttributes {
        match select {
            TableSelect::Ttbr0 => {
                let ttbr0 = LocalRegisterCopy::<u32, TTBR0::Register>::new(self.ttbr0);
                WalkAttributes {
                    inner_cacheable: ttbr0.is_set(TTBR0::C),
                    shareable: ttbr0.is_set(TTBR0::S),
                    outer_region: ttbr0.read(TTBR0::RGN),
                    outer_shareable: !ttbr0.is_set(TTBR0::NOS),
                }
            }
            TableSelect::Ttbr1 => {
                let ttbr1 = LocalRegisterCopy::<u32, TTBR1::Register>::new(self.ttbr1);
                WalkAttributes {
                    inner_cacheable: ttbr1.is_set(TTBR1::C),
                    shareable: ttbr1.is_set(TTBR1::S),
                    outer_region: ttbr1.read(TTBR1::RGN),
                    outer_shareable: !ttbr1.is_set(TTBR1::NOS),
                }
            }
        }
    }

    pub fn mmu_enabled(&self) -> bool {
        LocalRegisterCopy::<u32, SCTLR::Register>::new(self.sctlr).is_set(SCTLR::M)
    }

    pub fn uses_long_descriptors(&self) -> bool {
        LocalRegisterCopy::<u32, TTBCR::Register>::new(self.ttbcr).is_set(TTBCR::EAE)
    }
}

impl Debug for RegisterSnapshot {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let sctlr = LocalRegisterCopy::<u32, SCTLR::Register>::new(self.sctlr);
        let on_off = |set: bool| if set { "on" } else { "off" };
        write!(
            f,
            "RegisterSnapshot {{ ttbr0: {:#010x}, ttbr1: {:#010x}, ttbcr: {:#010x}, sctlr: {:#010x} \
             (mmu {}, dcache {}, icache {}) }}",
            self.ttbr0,
            self.ttbr1,
            self.ttbcr,
            self.sctlr,
            on_off(sctlr.is_set(SCTLR::M)),
            on_off(sctlr.is_set(SCTLR::C)),
            on_off(sctlr.is_set(SCTLR::I)),
        )
    }
}

/// Returns the process-wide snapshot, capturing it from `source` on first use.
///
/// The snapshot is never refreshed afterwards.
pub fn ensure_initialized<S: RegisterSource + ?Sized>(source: &S) -> &'static RegisterSnapshot {
    SNAPSHOT.get_or_init(|| RegisterSnapshot::capture(source))
}

/// Installs an already known snapshot as the process-wide one.
///
/// Returns the snapshot back if one was already installed or captured.
pub fn install_snapshot(snapshot: RegisterSnapshot) -> Result<(), RegisterSnapshot> {
    SNAPSHOT.set(snapshot)
}

/// Returns the process-wide snapshot, if it has been initialized.
pub fn current_snapshot() -> Option<&'static RegisterSnapshot> {
    SNAPSHOT.get()
}

//--------------------------------------------------------------------------------------------------
// Private definitions
//--------------------------------------------------------------------------------------------------

static SNAPSHOT: OnceCell<RegisterSnapshot> = OnceCell::new();
