// SPDX-License-Identifier: MIT
//! Access to the translation control registers of the executing CPU.
#[cfg(target_arch = "arm")]
#[path = "arch/arm/cpu.rs"]
mod arch_cpu;

#[cfg(target_arch = "arm")]
pub use arch_cpu::*;
