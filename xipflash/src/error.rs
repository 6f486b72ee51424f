// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Precondition failures, reported before the XIP envelope is entered.
//!
//! Once the envelope runs there is nothing to report: a dead flash chip
//! hangs the polling loops and a broken XIP restore faults on the next
//! instruction fetch.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Empty erase range, empty program data or empty raw transaction.
    ZeroLength,
    /// Erase offset or length is not a multiple of the sector size.
    Misaligned,
    /// Range overflows or runs past the end of the 16 MiB flash window.
    OutOfBounds,
    /// Transmit and receive buffers of a raw command differ in length.
    LengthMismatch,
    /// A buffer the envelope must read lives in the flash-mapped window.
    SourceInFlash,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ZeroLength => f.write_str("zero-length flash operation"),
            Error::Misaligned => f.write_str("erase range is not sector aligned"),
            Error::OutOfBounds => f.write_str("range exceeds the flash window"),
            Error::LengthMismatch => f.write_str("tx and rx buffers differ in length"),
            Error::SourceInFlash => f.write_str("source buffer is in flash"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
