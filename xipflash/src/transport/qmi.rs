// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! RP2350 engine: QMI direct mode, one byte at a time through DIRECT_TX /
//! DIRECT_RX.
//!
//! No interrupt masking here; the driver envelope already holds a guard.

use super::{in_flight_limit, pump, FifoStatus, Transport};
use crate::chip_select::{ChipSelect, DirectCs};
use crate::regs::{qmi, RegisterBlock};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QmiConfig {
    /// Depth of the direct-mode TX/RX FIFOs.
    pub fifo_depth: usize,
}

impl Default for QmiConfig {
    fn default() -> Self {
        Self { fifo_depth: 4 }
    }
}

pub struct QmiTransport<R> {
    qmi: R,
    cs: DirectCs<R>,
    config: QmiConfig,
}

impl<R: RegisterBlock + Clone> QmiTransport<R> {
    pub fn new(qmi: R, config: QmiConfig) -> Self {
        Self {
            cs: DirectCs::new(qmi.clone()),
            qmi,
            config,
        }
    }

    pub fn config(&self) -> QmiConfig {
        self.config
    }
}

impl<R: RegisterBlock + Clone> Transport for QmiTransport<R> {
    #[inline(always)]
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) {
        self.qmi.set_bits(qmi::DIRECT_CSR, qmi::CSR_EN);
        // Let the cooldown of the last XIP access expire.
        while self.qmi.read(qmi::DIRECT_CSR) & qmi::CSR_BUSY != 0 {}

        self.cs.set(false);
        let regs = &self.qmi;
        pump(
            tx,
            rx,
            in_flight_limit(self.config.fifo_depth),
            || {
                let csr = regs.read(qmi::DIRECT_CSR);
                FifoStatus {
                    can_put: csr & qmi::CSR_TXFULL == 0,
                    can_get: csr & qmi::CSR_RXEMPTY == 0,
                }
            },
            |byte| regs.write(qmi::DIRECT_TX, byte as u32),
            // DIRECT_RX is 16 bits wide; only the low byte is data here.
            || regs.read(qmi::DIRECT_RX) as u8,
        );
        self.cs.set(true);

        // Cache flush and XIP re-entry fail on some revisions with direct
        // mode still enabled.
        self.qmi.clear_bits(qmi::DIRECT_CSR, qmi::CSR_EN);
    }
}
