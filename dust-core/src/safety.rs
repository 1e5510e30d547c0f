//! Process-wide switch deciding whether configuration errors abort construction.
//!
//! When enabled (the default) a storage built from a bad configuration fails
//! with `InvalidConfig`. When disabled the error is logged as a warning and
//! the storage falls back to defaults. The flag is read once per construction
//! and handed down explicitly; nothing below the constructor reads it.
//!
//! Whoever flips the switch owns resetting it. Tests should hold a
//! [`FatalExceptionsOverride`] so the previous value comes back on drop.

use std::sync::atomic::{AtomicBool, Ordering};

static FATAL_EXCEPTIONS: AtomicBool = AtomicBool::new(true);

pub fn fatal_exceptions() -> bool {
    FATAL_EXCEPTIONS.load(Ordering::SeqCst)
}

/// Sets the switch and returns the previous value.
pub fn set_fatal_exceptions(enabled: bool) -> bool {
    FATAL_EXCEPTIONS.swap(enabled, Ordering::SeqCst)
}

pub fn reset_fatal_exceptions() {
    set_fatal_exceptions(true);
}

/// Overrides the switch until dropped.
#[derive(Debug)]
pub struct FatalExceptionsOverride {
    previous: bool,
}

impl FatalExceptionsOverride {
    pub fn new(enabled: bool) -> Self {
        Self {
            previous: set_fatal_exceptions(enabled),
        }
    }
}

impl Drop for FatalExceptionsOverride {
    fn drop(&mut self) {
        set_fatal_exceptions(self.previous);
    }
}
