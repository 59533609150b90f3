// SPDX-License-Identifier: MIT
//! Board support: where the kernel keeps physical memory mapped.
#[cfg(feature = "bsp_vexpress")]
mod vexpress;

#[cfg(feature = "bsp_vexpress")]
pub use vexpress::*;
