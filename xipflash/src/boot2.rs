// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Getting back into XIP after a raw flash operation.
//!
//! On RP2040 the ROM leaves the SSI in plain serial mode, and only the
//! second-stage boot loader at the start of flash knows how to set up the
//! fast XIP read mode again. It cannot be run from flash while flash is
//! unmapped, so a copy is taken into RAM beforehand and jumped into at the
//! end of the envelope. On RP2350 the ROM restores XIP itself as part of
//! `flash_flush_cache()`.

use crate::regs::RegisterBlock;

/// Size of the boot2 image in 32-bit words (256 bytes, CRC included).
pub const BOOT2_WORDS: usize = 64;

/// Start and end of the envelope, as seen by the XIP read path.
pub trait XipRestore {
    /// Take whatever is needed to restore XIP later. Runs while XIP is
    /// still live; idempotent.
    fn capture(&mut self);
    /// Bring the XIP read path back. Last step of the envelope.
    fn restore(&mut self);
}

/// A raw jump into position-independent code held in RAM.
pub trait Trampoline {
    /// Call the Thumb code at `image` with `image` itself in the first
    /// argument register.
    ///
    /// # Safety
    /// `image` must hold valid, position-independent code that returns.
    unsafe fn enter(&mut self, image: *const u32);
}

/// RAM copy of the RP2040 boot2, taken lazily from the start of the XIP
/// window and never invalidated (boot2 does not change while running).
pub struct Boot2Shadow<M, T> {
    source: M,
    trampoline: T,
    image: [u32; BOOT2_WORDS],
    valid: bool,
}

impl<M: RegisterBlock, T: Trampoline> Boot2Shadow<M, T> {
    /// `source` reads the flash-mapped boot region, word offset 0 being
    /// the first word of boot2.
    pub fn new(source: M, trampoline: T) -> Self {
        Self {
            source,
            trampoline,
            image: [0; BOOT2_WORDS],
            valid: false,
        }
    }

    pub fn is_captured(&self) -> bool {
        self.valid
    }

    pub fn image(&self) -> &[u32; BOOT2_WORDS] {
        &self.image
    }
}

impl<M: RegisterBlock, T: Trampoline> XipRestore for Boot2Shadow<M, T> {
    #[inline(always)]
    fn capture(&mut self) {
        if self.valid {
            return;
        }
        for (i, word) in self.image.iter_mut().enumerate() {
            *word = self.source.read(i.wrapping_mul(4));
        }
        self.valid = true;
    }

    #[inline(always)]
    fn restore(&mut self) {
        // The envelope always captures first. Without an image there is
        // nothing safe to jump to.
        if self.valid {
            unsafe { self.trampoline.enter(self.image.as_ptr()) }
        }
    }
}

/// RP2350: nothing to shadow, the ROM re-enters XIP on its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct RomRestore;

impl XipRestore for RomRestore {
    #[inline(always)]
    fn capture(&mut self) {}

    #[inline(always)]
    fn restore(&mut self) {}
}

/// Branch-with-link into the boot2 copy (RP2040, Thumb).
#[cfg(feature = "rp2040")]
#[derive(Clone, Copy, Debug, Default)]
pub struct ThumbTrampoline;

#[cfg(feature = "rp2040")]
impl Trampoline for ThumbTrampoline {
    #[inline(always)]
    unsafe fn enter(&mut self, image: *const u32) {
        let entry = image as usize | 1;
        core::arch::asm!(
            "blx {entry}",
            entry = in(reg) entry,
            inout("r0") image => _,
            clobber_abi("C"),
        );
    }
}
