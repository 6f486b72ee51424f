// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash chip-select control.
//!
//! Only called from inside the XIP envelope, so both implementations are
//! plain register pokes that inline into the transport.

use crate::regs::{ioqspi, qmi, RegisterBlock};

/// Drives the flash chip-select line. `true` deasserts (CS high).
pub trait ChipSelect {
    fn set(&mut self, high: bool);
}

/// RP2040: force the QSPI_SS pad through the IO_QSPI output override.
pub struct GpioOverrideCs<R> {
    io: R,
}

impl<R: RegisterBlock> GpioOverrideCs<R> {
    pub fn new(io: R) -> Self {
        Self { io }
    }
}

impl<R: RegisterBlock> ChipSelect for GpioOverrideCs<R> {
    #[inline(always)]
    fn set(&mut self, high: bool) {
        let level = if high {
            ioqspi::OUTOVER_HIGH
        } else {
            ioqspi::OUTOVER_LOW
        };
        let field = level << ioqspi::OUTOVER_LSB;
        // Flip only the bits of OUTOVER that differ; the rest of the
        // register is left as found.
        self.io.modify(ioqspi::SS_CTRL, |cur| {
            cur ^ ((cur ^ field) & ioqspi::OUTOVER_BITS)
        });
    }
}

/// RP2350: chip select is a bit in the QMI direct-mode CSR.
///
/// Only meaningful while direct mode is enabled; the transport owns the
/// enable bit.
pub struct DirectCs<R> {
    qmi: R,
}

impl<R: RegisterBlock> DirectCs<R> {
    pub fn new(qmi: R) -> Self {
        Self { qmi }
    }
}

impl<R: RegisterBlock> ChipSelect for DirectCs<R> {
    #[inline(always)]
    fn set(&mut self, high: bool) {
        if high {
            self.qmi.clear_bits(qmi::DIRECT_CSR, qmi::CSR_ASSERT_CS0N);
        } else {
            self.qmi.set_bits(qmi::DIRECT_CSR, qmi::CSR_ASSERT_CS0N);
        }
    }
}
