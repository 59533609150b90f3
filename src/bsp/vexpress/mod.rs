// SPDX-License-Identifier: MIT
pub mod mem;
