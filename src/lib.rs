// SPDX-License-Identifier: MIT
//! Resolves virtual addresses to physical addresses by walking the ARMv7 short-descriptor
//! translation tables directly, without going through the fault path.
//!
//! The walk reads the translation table base registers once, then follows the first-level and
//! second-level descriptors for each request. Table memory is reached through a [`Translation`]
//! supplied by the caller, usually the kernel's linear map.
#![cfg_attr(not(test), no_std)]

pub mod bsp;
pub mod cpu;
pub mod mem;
pub mod resolve;
pub mod sync;

pub use mem::vm::paging::{
    Granule, Mapping, PhysicalAddress, PhysicalMemoryRegion, TableSelect, Translation,
    VirtualAddress,
};
pub use mem::vm::registers::{RegisterSnapshot, RegisterSource, WalkAttributes};
pub use mem::vm::translation::DirectMapTranslation;
pub use mem::vm::walk::TranslationWalker;
pub use mem::vm::{TableLevel, WalkError};
pub use resolve::{AddressResolver, NOT_FOUND};
