// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Bit-level, full-duplex transfers on the flash bus.
//!
//! One engine per device family. Both are byte-transparent: the caller
//! frames the command (opcode, address, dummy bytes) in the transmit buffer
//! and finds the response at the same positions in the receive buffer.
//! There is no timeout; a missing flash chip hangs the loop.

mod qmi;
mod ssi;

pub use qmi::{QmiConfig, QmiTransport};
pub use ssi::{SsiConfig, SsiTransport};

/// One chip-select-framed, full-duplex transaction.
pub trait Transport {
    /// Clock `tx` out while filling `rx`. Both slices have the same length;
    /// the driver checks this before entering the XIP envelope.
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]);
}

/// Bytes allowed in flight for a FIFO of `depth` entries.
///
/// Two entries of slack keep the receive side from overflowing while the
/// last pushes are still being clocked out.
#[inline(always)]
pub(crate) fn in_flight_limit(depth: usize) -> usize {
    depth.saturating_sub(2).max(1)
}

/// Readiness of the two FIFOs, sampled from one status register read.
#[derive(Clone, Copy)]
pub(crate) struct FifoStatus {
    pub can_put: bool,
    pub can_get: bool,
}

/// Shared pump loop: push while there is room and the in-flight bound
/// allows it, pop whenever a byte is waiting, until both cursors reach the
/// end.
///
/// Runs with flash unmapped, so it stays free of indexing and checked
/// arithmetic: nothing in here may branch to a panic handler in flash.
#[inline(always)]
pub(crate) fn pump<S, P, G>(tx: &[u8], rx: &mut [u8], limit: usize, mut status: S, mut put: P, mut get: G)
where
    S: FnMut() -> FifoStatus,
    P: FnMut(u8),
    G: FnMut() -> u8,
{
    let count = tx.len().min(rx.len());
    let mut sending = tx.iter().take(count);
    let mut slots = rx.iter_mut().take(count);
    let mut next_tx = sending.next();
    let mut next_rx = slots.next();
    let mut in_flight: usize = 0;

    while next_tx.is_some() || next_rx.is_some() {
        let flags = status();
        if flags.can_put && in_flight < limit {
            if let Some(&byte) = next_tx {
                put(byte);
                next_tx = sending.next();
                in_flight = in_flight.saturating_add(1);
            }
        }
        if flags.can_get {
            if let Some(slot) = next_rx.take() {
                *slot = get();
                next_rx = slots.next();
                in_flight = in_flight.saturating_sub(1);
            }
        }
    }
}
