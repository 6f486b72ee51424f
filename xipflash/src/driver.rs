// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! The flash operation sequencer.
//!
//! Every erase, program and raw command runs through `run_envelope()`,
//! which is placed in RAM and calls only code that is inlined into it or
//! lives in ROM:
//!   1. capture the XIP restore state (boot2 shadow, once)
//!   2. connect_internal_flash() + flash_exit_xip()
//!   3. the action itself
//!   4. flash_flush_cache()
//!   5. restore XIP
//!
//! Preconditions are checked, and logging done, before step 1 and after
//! step 5 only. Interrupts stay masked for the whole envelope.
//!
//! The driver takes `&mut self` everywhere: holding the only `FlashDriver`
//! is what keeps two envelopes from overlapping.

use core::sync::atomic::{compiler_fence, Ordering};

use crate::boot2::XipRestore;
use crate::error::Error;
use crate::identity::{
    jedec_id_frame, parse_jedec_id, parse_unique_id, unique_id_frame, IdCache, JedecId, UniqueId,
};
use crate::irq::InterruptGuard;
use crate::layout::{
    check_erase_range, check_range, check_source, EraseOp, FLASH_PAGE_SIZE, JEDEC_ID_DATA_BYTES,
    UNIQUE_ID_TOTAL_BYTES,
};
use crate::rom::FlashRom;
use crate::transport::Transport;

const PAGE: usize = FLASH_PAGE_SIZE as usize;

/// What to do once XIP is down.
enum Action<'a> {
    Erase {
        offset: u32,
        len: u32,
        block_size: u32,
        cmd: u8,
    },
    Program {
        offset: u32,
        data: &'a [u8],
    },
    Command {
        tx: &'a [u8],
        rx: &'a mut [u8],
    },
}

pub struct FlashDriver<R, T, X> {
    rom: R,
    transport: T,
    xip: X,
    id: IdCache,
}

impl<R: FlashRom, T: Transport, X: XipRestore> FlashDriver<R, T, X> {
    pub fn new(rom: R, transport: T, xip: X) -> Self {
        Self {
            rom,
            transport,
            xip,
            id: IdCache::new(),
        }
    }

    /// Give the parts back.
    pub fn release(self) -> (R, T, X) {
        (self.rom, self.transport, self.xip)
    }

    /// Erase `len` bytes at flash offset `offset` with 64 KiB block erases
    /// (the ROM falls back to sector erases where a block does not fit).
    ///
    /// `offset` and `len` must be sector aligned; block alignment only
    /// affects speed.
    pub fn erase(&mut self, offset: u32, len: u32) -> Result<(), Error> {
        self.erase_with(offset, len, EraseOp::Block64)
    }

    /// Erase with an explicit erase granularity and opcode.
    pub fn erase_with(&mut self, offset: u32, len: u32, op: EraseOp) -> Result<(), Error> {
        check_erase_range(offset, len)?;
        debug!(
            "flash erase: offset={=u32:#x} len={=u32} cmd={=u8:#x}",
            offset,
            len,
            op.opcode()
        );

        self.run(Action::Erase {
            offset,
            len,
            block_size: op.size(),
            cmd: op.opcode(),
        });
        Ok(())
    }

    /// Program `data` at flash offset `offset`. The target range should be
    /// erased; programming can only clear bits.
    ///
    /// Any byte range is accepted. The ROM only programs whole, aligned
    /// pages, so a partial first or last page is sent as a full page padded
    /// with 0xFF, which leaves the neighbouring bytes as they are. Each
    /// partial page and the run of whole pages between them gets its own
    /// envelope.
    ///
    /// `data` must not live in flash: the ROM reads it while XIP is down.
    pub fn program(&mut self, offset: u32, data: &[u8]) -> Result<(), Error> {
        let len = u32::try_from(data.len()).map_err(|_| Error::OutOfBounds)?;
        check_range(offset, len)?;
        check_not_in_flash(data)?;
        debug!("flash program: offset={=u32:#x} len={=u32}", offset, len);

        // The window is a whole number of pages, so no page below overflows.
        let mut offset = offset;
        let mut rest = data;
        while !rest.is_empty() {
            let in_page = (offset % FLASH_PAGE_SIZE) as usize;

            if in_page == 0 && rest.len() >= PAGE {
                let (pages, tail) = rest.split_at(rest.len() - rest.len() % PAGE);
                self.run(Action::Program {
                    offset,
                    data: pages,
                });
                offset += pages.len() as u32;
                rest = tail;
            } else {
                let (head, tail) = rest.split_at((PAGE - in_page).min(rest.len()));
                let mut page = [0xFFu8; PAGE];
                page[in_page..in_page + head.len()].copy_from_slice(head);
                self.run(Action::Program {
                    offset: offset - in_page as u32,
                    data: &page,
                });
                offset += head.len() as u32;
                rest = tail;
            }
        }
        Ok(())
    }

    /// Clock `tx` out to the flash while clocking `rx` in, framed by one
    /// chip-select assertion. Opcode, address and dummy bytes are the
    /// caller's to lay out in `tx`.
    pub fn raw_command(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<(), Error> {
        if tx.len() != rx.len() {
            return Err(Error::LengthMismatch);
        }
        if tx.is_empty() {
            return Err(Error::ZeroLength);
        }
        check_not_in_flash(tx)?;
        trace!("flash cmd: {=u8:#x} len={=usize}", tx[0], tx.len());

        self.run(Action::Command { tx, rx });
        Ok(())
    }

    /// The chip's 64-bit unique ID. Read from the chip once, then cached.
    pub fn unique_id(&mut self) -> Result<UniqueId, Error> {
        if let Some(id) = self.id.get() {
            return Ok(id);
        }

        let tx = unique_id_frame();
        let mut rx = [0u8; UNIQUE_ID_TOTAL_BYTES];
        self.raw_command(&tx, &mut rx)?;

        let id = self.id.fill(parse_unique_id(&rx));
        debug!("flash unique id: {}", id);
        Ok(id)
    }

    /// The unique ID if it has been read already. Never touches the bus.
    pub fn cached_id(&self) -> Option<UniqueId> {
        self.id.get()
    }

    /// Manufacturer, memory type and capacity code. Not cached.
    pub fn jedec_id(&mut self) -> Result<JedecId, Error> {
        let tx = jedec_id_frame();
        let mut rx = [0u8; 1 + JEDEC_ID_DATA_BYTES];
        self.raw_command(&tx, &mut rx)?;

        let id = parse_jedec_id(&rx);
        if id.capacity().is_none() {
            warn!("unexpected JEDEC capacity code {=u8:#x}", id.capacity_code);
        }
        Ok(id)
    }

    fn run(&mut self, action: Action<'_>) {
        let _irq = InterruptGuard::acquire();
        run_envelope(&mut self.rom, &mut self.transport, &mut self.xip, action);
    }
}

/// Reject buffers the ROM or the transport would have to read from flash.
fn check_not_in_flash(buf: &[u8]) -> Result<(), Error> {
    check_source(buf.as_ptr() as usize, buf.len())
}

#[inline(never)]
#[cfg_attr(
    all(target_arch = "arm", target_os = "none"),
    link_section = ".data.ram_func"
)]
fn run_envelope<R: FlashRom, T: Transport, X: XipRestore>(
    rom: &mut R,
    transport: &mut T,
    xip: &mut X,
    action: Action<'_>,
) {
    xip.capture();
    compiler_fence(Ordering::SeqCst);

    rom.connect_internal_flash();
    rom.flash_exit_xip();

    match action {
        Action::Erase {
            offset,
            len,
            block_size,
            cmd,
        } => rom.flash_range_erase(offset, len as usize, block_size, cmd),
        Action::Program { offset, data } => rom.flash_range_program(offset, data),
        Action::Command { tx, rx } => transport.transfer(tx, rx),
    }

    rom.flash_flush_cache();
    xip.restore();
    compiler_fence(Ordering::SeqCst);
}
