// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Scoped interrupt masking.
//!
//! `InterruptGuard::acquire()` masks interrupts and remembers whether they
//! were enabled; dropping the guard unmasks only in that case, so guards
//! nest. On target this is PRIMASK and inlines into the caller, which keeps
//! it usable from RAM-resident code. Off target the mask is simulated per
//! thread so tests can observe it.

pub struct InterruptGuard {
    was_enabled: bool,
}

impl InterruptGuard {
    #[inline(always)]
    pub fn acquire() -> Self {
        let was_enabled = imp::enabled();
        imp::disable();
        Self { was_enabled }
    }
}

impl Drop for InterruptGuard {
    #[inline(always)]
    fn drop(&mut self) {
        if self.was_enabled {
            imp::enable();
        }
    }
}

/// Whether interrupts are currently masked.
#[inline(always)]
pub fn is_masked() -> bool {
    !imp::enabled()
}

#[cfg(any(feature = "rp2040", feature = "rp2350"))]
mod imp {
    #[inline(always)]
    pub fn enabled() -> bool {
        cortex_m::register::primask::read().is_inactive()
    }

    #[inline(always)]
    pub fn disable() {
        cortex_m::interrupt::disable();
    }

    #[inline(always)]
    pub fn enable() {
        unsafe { cortex_m::interrupt::enable() }
    }
}

#[cfg(all(not(any(feature = "rp2040", feature = "rp2350")), feature = "std"))]
mod imp {
    use std::cell::Cell;

    std::thread_local! {
        static MASKED: Cell<bool> = const { Cell::new(false) };
    }

    pub fn enabled() -> bool {
        !MASKED.with(Cell::get)
    }

    pub fn disable() {
        MASKED.with(|m| m.set(true));
    }

    pub fn enable() {
        MASKED.with(|m| m.set(false));
    }
}

#[cfg(all(not(any(feature = "rp2040", feature = "rp2350")), not(feature = "std")))]
mod imp {
    use core::sync::atomic::{AtomicBool, Ordering};

    static MASKED: AtomicBool = AtomicBool::new(false);

    pub fn enabled() -> bool {
        !MASKED.load(Ordering::Relaxed)
    }

    pub fn disable() {
        MASKED.store(true, Ordering::Relaxed);
    }

    pub fn enable() {
        MASKED.store(false, Ordering::Relaxed);
    }
}
