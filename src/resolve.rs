// SPDX-License-Identifier: MIT
//! The entry point: resolves an address through TTBR1, then TTBR0.

use log::{debug, trace};

use crate::mem::vm::paging::{Mapping, PhysicalAddress, TableSelect, Translation, VirtualAddress};
use crate::mem::vm::registers::{self, RegisterSnapshot, RegisterSource};
use crate::mem::vm::walk::TranslationWalker;
use crate::mem::vm::WalkError;

//--------------------------------------------------------------------------------------------------
// Public definitions
//--------------------------------------------------------------------------------------------------

/// Returned by the sentinel entry points when an address can't be resolved.
///
/// Physical address 0 is a valid address in its own right; callers that can must use the
/// `Option` and `Result` returning functions instead.
pub const NOT_FOUND: u32 = 0;

/// Resolves addresses against a snapshot the caller has taken, rather than the process-wide one.
pub struct AddressResolver<T> {
    snapshot: RegisterSnapshot,
    translation: T,
}

pub use crate::mem::vm::registers::{current_snapshot, ensure_initialized, install_snapshot};

//--------------------------------------------------------------------------------------------------
// Public code
//--------------------------------------------------------------------------------------------------

impl<T: Translation> AddressResolver<T> {
    pub const fn new(snapshot: RegisterSnapshot, translation: T) -> Self {
        Self {
            snapshot,
            translation,
        }
    }

    pub fn snapshot(&self) -> &RegisterSnapshot {
        &self.snapshot
    }

    /// Resolves `va`, reporting the granule it is mapped with and which table it was found in.
    ///
    /// If neither table maps the address, the error from the TTBR0 walk is returned.
    pub fn lookup(&self, va: VirtualAddress) -> Result<Mapping, WalkError> {
        lookup(&self.snapshot, &self.translation, va)
    }

    pub fn resolve(&self, va: VirtualAddress) -> Option<PhysicalAddress> {
        self.lookup(va).ok().map(|mapping| mapping.physical)
    }
}

/// Resolves `va` using the process-wide snapshot, capturing it from `source` on first use.
pub fn resolve<S, T>(source: &S, translation: &T, va: VirtualAddress) -> Option<PhysicalAddress>
where
    S: RegisterSource + ?Sized,
    T: Translation + ?Sized,
{
    let snapshot = registers::ensure_initialized(source);
    lookup(snapshot, translation, va)
        .ok()
        .map(|mapping| mapping.physical)
}

/// Like [`resolve`], but returns [`NOT_FOUND`] for unresolvable addresses.
pub fn virt_to_phys_or_sentinel<S, T>(source: &S, translation: &T, va: u32) -> u32
where
    S: RegisterSource + ?Sized,
    T: Translation + ?Sized,
{
    resolve(source, translation, VirtualAddress(va)).map_or(NOT_FOUND, |pa| pa.0)
}

/// Resolves `va` on the calling CPU through the board's linear map, returning [`NOT_FOUND`] for
/// unresolvable addresses.
#[cfg(all(target_arch = "arm", feature = "bsp_vexpress"))]
pub fn virt_to_phys(va: u32) -> u32 {
    virt_to_phys_or_sentinel(&crate::cpu::Cp15, &crate::bsp::mem::kernel_direct_map(), va)
}

//--------------------------------------------------------------------------------------------------
// Private code
//--------------------------------------------------------------------------------------------------

fn lookup<T: Translation + ?Sized>(
    snapshot: &RegisterSnapshot,
    translation: &T,
    va: VirtualAddress,
) -> Result<Mapping, WalkError> {
    if snapshot.uses_long_descriptors() {
        debug!("TTBCR.EAE is set, refusing to walk {}", va);
        return Err(WalkError::LongDescriptorFormat);
    }
    if !snapshot.mmu_enabled() {
        debug!("MMU is off, translation tables for {} may be stale", va);
    }

    let walker = TranslationWalker::new(snapshot, translation);
    walker.walk(TableSelect::Ttbr1, va).or_else(|err| {
        trace!("{}: {}", TableSelect::Ttbr1, err);
        walker.walk(TableSelect::Ttbr0, va)
    })
}
