// SPDX-License-Identifier: MIT
use core::arch::asm;

use tock_registers::interfaces::Readable;

use crate::mem::vm::registers::{self, RegisterSource};

//--------------------------------------------------------------------------------------------------
// Public definitions
//--------------------------------------------------------------------------------------------------

macro_rules! cp15_read_only {
    ($(#[$attr:meta])* $name:ident, $register:ty, $mrc:literal) => {
        $(#[$attr])*
        pub struct $name;

        impl Readable for $name {
            type T = u32;
            type R = $register;

            #[inline(always)]
            fn get(&self) -> u32 {
                let value;
                // Safe because reading the register has no side effects.
                unsafe {
                    asm!($mrc, out(reg) value, options(nomem, nostack, preserves_flags));
                }
                value
            }
        }
    };
}

cp15_read_only!(
    /// Translation Table Base Register 0
    Ttbr0, registers::TTBR0::Register, "mrc p15, 0, {}, c2, c0, 0"
);
cp15_read_only!(
    /// Translation Table Base Register 1
    Ttbr1, registers::TTBR1::Register, "mrc p15, 0, {}, c2, c0, 1"
);
cp15_read_only!(
    /// Translation Table Base Control Register
    Ttbcr, registers::TTBCR::Register, "mrc p15, 0, {}, c2, c0, 2"
);
cp15_read_only!(
    /// System Control Register
    Sctlr, registers::SCTLR::Register, "mrc p15, 0, {}, c1, c0, 0"
);

pub const TTBR0: Ttbr0 = Ttbr0;
pub const TTBR1: Ttbr1 = Ttbr1;
pub const TTBCR: Ttbcr = Ttbcr;
pub const SCTLR: Sctlr = Sctlr;

/// Reads the registers of whichever core the caller is running on.
pub struct Cp15;

//--------------------------------------------------------------------------------------------------
// Public code
//--------------------------------------------------------------------------------------------------
impl RegisterSource for Cp15 {
    fn ttbr0(&self) -> u32 {
        TTBR0.get()
    }

    fn ttbr1(&self) -> u32 {
        TTBR1.get()
    }

    fn ttbcr(&self) -> u32 {
        TTBCR.get()
    }

    fn sctlr(&self) -> u32 {
        SCTLR.get()
    }
}
