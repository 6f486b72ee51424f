// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! The concrete driver for the device family selected at build time.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::driver::FlashDriver;
use crate::regs::Mmio;

#[cfg(feature = "rp2040")]
use crate::{
    boot2::{Boot2Shadow, ThumbTrampoline},
    chip_select::GpioOverrideCs,
    layout::FLASH_BASE,
    rom::Rp2040Rom,
    transport::{SsiConfig, SsiTransport},
};

#[cfg(feature = "rp2350")]
use crate::{
    boot2::RomRestore,
    regs::base,
    rom::Rp2350Rom,
    transport::{QmiConfig, QmiTransport},
};

/// RP2040: ROM erase/program, SSI bit-banging, boot2 shadow for XIP.
#[cfg(feature = "rp2040")]
pub type Flash = FlashDriver<
    Rp2040Rom,
    SsiTransport<Mmio, GpioOverrideCs<Mmio>>,
    Boot2Shadow<Mmio, ThumbTrampoline>,
>;

/// RP2350: ROM erase/program, QMI direct mode, ROM-restored XIP.
#[cfg(feature = "rp2350")]
pub type Flash = FlashDriver<Rp2350Rom, QmiTransport<Mmio>, RomRestore>;

static TAKEN: AtomicBool = AtomicBool::new(false);

impl Flash {
    /// Hand out the driver once per boot.
    pub fn take() -> Option<Self> {
        cortex_m::interrupt::free(|_| {
            if TAKEN.load(Ordering::Relaxed) {
                None
            } else {
                TAKEN.store(true, Ordering::Relaxed);
                Some(unsafe { Self::steal() })
            }
        })
    }

    /// Build the driver with the default transport configuration.
    ///
    /// # Safety
    /// Must be called while XIP is active (it reads the ROM table), and no
    /// other `Flash` may exist.
    pub unsafe fn steal() -> Self {
        Self::steal_with(Default::default())
    }
}

#[cfg(feature = "rp2040")]
impl Flash {
    /// # Safety
    /// See [`Flash::steal`].
    pub unsafe fn steal_with(config: SsiConfig) -> Self {
        let ssi = Mmio::new(rp2040_hal::pac::XIP_SSI::ptr() as usize);
        let io_qspi = Mmio::new(rp2040_hal::pac::IO_QSPI::ptr() as usize);
        let boot2 = Mmio::new(FLASH_BASE as usize);

        FlashDriver::new(
            Rp2040Rom::new(),
            SsiTransport::new(ssi, GpioOverrideCs::new(io_qspi), config),
            Boot2Shadow::new(boot2, ThumbTrampoline),
        )
    }
}

#[cfg(feature = "rp2350")]
impl Flash {
    /// # Safety
    /// See [`Flash::steal`].
    pub unsafe fn steal_with(config: QmiConfig) -> Self {
        let qmi = Mmio::new(base::QMI_RP2350);
        FlashDriver::new(Rp2350Rom::new(), QmiTransport::new(qmi, config), RomRestore)
    }
}
