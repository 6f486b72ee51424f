// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Typed handle over a block of 32-bit memory-mapped registers.
//!
//! Everything above this module addresses registers by byte offset from a
//! block base, so the same engine code runs against real hardware (`Mmio`)
//! or a simulated peripheral in the host tests.

/// A block of 32-bit registers addressed by byte offset.
///
/// Implementations used inside the XIP envelope must inline completely:
/// nothing reachable from these methods may live in flash.
pub trait RegisterBlock {
    fn read(&self, offset: usize) -> u32;
    fn write(&self, offset: usize, value: u32);

    #[inline(always)]
    fn modify<F: FnOnce(u32) -> u32>(&self, offset: usize, f: F) {
        let value = self.read(offset);
        self.write(offset, f(value));
    }

    #[inline(always)]
    fn set_bits(&self, offset: usize, bits: u32) {
        self.modify(offset, |v| v | bits);
    }

    #[inline(always)]
    fn clear_bits(&self, offset: usize, bits: u32) {
        self.modify(offset, |v| v & !bits);
    }
}

impl<T: RegisterBlock + ?Sized> RegisterBlock for &T {
    #[inline(always)]
    fn read(&self, offset: usize) -> u32 {
        (**self).read(offset)
    }

    #[inline(always)]
    fn write(&self, offset: usize, value: u32) {
        (**self).write(offset, value)
    }
}

/// Volatile register block at a fixed base address.
#[derive(Clone, Copy, Debug)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// # Safety
    /// `base` must be the address of a peripheral (or memory) block that is
    /// valid for aligned 32-bit volatile access at every offset used.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    pub fn base(&self) -> usize {
        self.base
    }
}

impl RegisterBlock for Mmio {
    #[inline(always)]
    fn read(&self, offset: usize) -> u32 {
        unsafe { core::ptr::read_volatile(self.base.wrapping_add(offset) as *const u32) }
    }

    #[inline(always)]
    fn write(&self, offset: usize, value: u32) {
        unsafe { core::ptr::write_volatile(self.base.wrapping_add(offset) as *mut u32, value) }
    }
}

/// RP2040 XIP_SSI (DesignWare APB SSI in front of the flash).
pub mod ssi {
    pub const CTRLR0: usize = 0x00;
    pub const SSIENR: usize = 0x08;
    pub const BAUDR: usize = 0x14;
    pub const SR: usize = 0x28;
    pub const DR0: usize = 0x60;

    pub const SR_TFNF: u32 = 1 << 1;
    pub const SR_RFNE: u32 = 1 << 3;

    pub const CTRLR0_DFS_32_LSB: u32 = 16;
    pub const CTRLR0_TMOD_LSB: u32 = 8;
    /// TMOD = transmit and receive.
    pub const TMOD_TX_AND_RX: u32 = 0;
    /// SPI_FRF = 0 (standard single-line SPI), DFS_32 = 7 (8-bit frames).
    pub const CTRLR0_STD_8BIT: u32 = (7 << CTRLR0_DFS_32_LSB) | (TMOD_TX_AND_RX << CTRLR0_TMOD_LSB);
}

/// RP2040 IO_QSPI, GPIO_QSPI_SS control register.
pub mod ioqspi {
    pub const SS_CTRL: usize = 0x0c;

    pub const OUTOVER_LSB: u32 = 8;
    pub const OUTOVER_BITS: u32 = 0x3 << OUTOVER_LSB;
    pub const OUTOVER_LOW: u32 = 0x2;
    pub const OUTOVER_HIGH: u32 = 0x3;
}

/// RP2350 QMI direct-mode registers.
pub mod qmi {
    pub const DIRECT_CSR: usize = 0x00;
    pub const DIRECT_TX: usize = 0x04;
    pub const DIRECT_RX: usize = 0x08;

    pub const CSR_EN: u32 = 1 << 0;
    pub const CSR_BUSY: u32 = 1 << 1;
    pub const CSR_ASSERT_CS0N: u32 = 1 << 2;
    pub const CSR_TXFULL: u32 = 1 << 10;
    pub const CSR_RXEMPTY: u32 = 1 << 16;
}

/// Peripheral bases not covered by a PAC dependency.
pub mod base {
    pub const QMI_RP2350: usize = 0x400d_0000;
}
