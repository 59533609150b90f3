// SPDX-License-Identifier: MIT
use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};

//--------------------------------------------------------------------------------------------------
// Public definitions
//--------------------------------------------------------------------------------------------------
/// A cell which is written at most once and can be read without locking afterwards.
///
/// Initialization runs inside a critical section, so concurrent first users neither run the
/// initializer twice nor observe a partially written value.
pub struct OnceCell<T> {
    ready: AtomicBool,
    data: UnsafeCell<Option<T>>,
}

//--------------------------------------------------------------------------------------------------
// Public code
//--------------------------------------------------------------------------------------------------
unsafe impl<T> Send for OnceCell<T> where T: Send {}
unsafe impl<T> Sync for OnceCell<T> where T: Send + Sync {}

impl<T> OnceCell<T> {
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            data: UnsafeCell::new(None),
        }
    }

    /// Stores `value`, or hands it back if the cell is already initialized.
    pub fn set(&self, value: T) -> Result<(), T> {
        critical_section::with(|_| {
            if self.ready.load(Ordering::Acquire) {
                return Err(value);
            }
            // Nobody else writes while we hold the critical section, and readers wait for `ready`.
            unsafe { *self.data.get() = Some(value) };
            self.ready.store(true, Ordering::Release);
            Ok(())
        })
    }

    pub fn get(&self) -> Option<&T> {
        if !self.ready.load(Ordering::Acquire) {
            return None;
        }
        let data = unsafe { &*self.data.get() };
        data.as_ref()
    }

    /// Returns the stored value, initializing it with `f` if the cell is empty.
    pub fn get_or_init(&self, f: impl FnOnce() -> T) -> &T {
        if let Some(value) = self.get() {
            return value;
        }

        critical_section::with(|_| {
            if !self.ready.load(Ordering::Acquire) {
                unsafe { *self.data.get() = Some(f()) };
                self.ready.store(true, Ordering::Release);
            }
        });

        self.get()
            .unwrap_or_else(|| panic!("OnceCell published without a value"))
    }
}
