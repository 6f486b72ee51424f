// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! RP2040 engine: the XIP_SSI shift-register controller, driven by hand.

use super::{in_flight_limit, pump, FifoStatus, Transport};
use crate::chip_select::ChipSelect;
use crate::irq::InterruptGuard;
use crate::regs::{ssi, RegisterBlock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SsiConfig {
    /// BAUDR value (even, >= 2). 32 gives ~3.9 MHz from a 125 MHz clk_sys,
    /// slow enough for any compliant flash.
    pub clock_divider: u32,
    /// Depth of the SSI transmit/receive FIFOs.
    pub fifo_depth: usize,
}

impl Default for SsiConfig {
    fn default() -> Self {
        Self {
            clock_divider: 32,
            fifo_depth: 16,
        }
    }
}

/// CTRLR0 and BAUDR as found before a transfer.
struct SavedSsi {
    ctrlr0: u32,
    baudr: u32,
}

pub struct SsiTransport<R, C> {
    ssi: R,
    cs: C,
    config: SsiConfig,
}

impl<R: RegisterBlock, C: ChipSelect> SsiTransport<R, C> {
    pub fn new(ssi: R, cs: C, config: SsiConfig) -> Self {
        Self { ssi, cs, config }
    }

    pub fn config(&self) -> SsiConfig {
        self.config
    }

    #[inline(always)]
    fn save(&self) -> SavedSsi {
        SavedSsi {
            ctrlr0: self.ssi.read(ssi::CTRLR0),
            baudr: self.ssi.read(ssi::BAUDR),
        }
    }

    /// The SSI only accepts CTRLR0/BAUDR writes while disabled.
    #[inline(always)]
    fn configure(&self, ctrlr0: u32, baudr: u32) {
        self.ssi.write(ssi::SSIENR, 0);
        self.ssi.write(ssi::CTRLR0, ctrlr0);
        self.ssi.write(ssi::BAUDR, baudr);
        self.ssi.write(ssi::SSIENR, 1);
    }
}

impl<R: RegisterBlock, C: ChipSelect> Transport for SsiTransport<R, C> {
    #[inline(always)]
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) {
        // The SSI registers are shared with anything else touching the bus.
        let _irq = InterruptGuard::acquire();

        let saved = self.save();
        self.configure(ssi::CTRLR0_STD_8BIT, self.config.clock_divider);

        self.cs.set(false);
        let regs = &self.ssi;
        pump(
            tx,
            rx,
            in_flight_limit(self.config.fifo_depth),
            || {
                let sr = regs.read(ssi::SR);
                FifoStatus {
                    can_put: sr & ssi::SR_TFNF != 0,
                    can_get: sr & ssi::SR_RFNE != 0,
                }
            },
            |byte| regs.write(ssi::DR0, byte as u32),
            || regs.read(ssi::DR0) as u8,
        );
        self.cs.set(true);

        self.configure(saved.ctrlr0, saved.baudr);
    }
}
