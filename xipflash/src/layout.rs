// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Flash geometry, XIP window, command opcodes and range checks.

use crate::error::Error;

// --- XIP window ---

/// Base of the cached, memory-mapped flash read window.
pub const FLASH_BASE: u32 = 0x1000_0000;
/// Size of the memory-mapped window (and the largest addressable flash).
pub const FLASH_WINDOW_SIZE: u32 = 16 * 1024 * 1024;

/// Start and end of the flash-backed address aliases (cached, uncached,
/// no-alloc variants). Nothing the envelope reads may live here.
pub const XIP_ALIAS_START: usize = 0x1000_0000;
pub const XIP_ALIAS_END: usize = 0x1400_0000;

// --- Geometry ---

pub const FLASH_PAGE_SIZE: u32 = 256;
pub const FLASH_SECTOR_SIZE: u32 = 4096;
pub const FLASH_BLOCK_SIZE: u32 = 65536;

// --- Opcodes ---

/// Sector erase (4 KiB).
pub const CMD_SECTOR_ERASE: u8 = 0x20;
/// Block erase (32 KiB).
pub const CMD_BLOCK32_ERASE: u8 = 0x52;
/// Block erase (64 KiB).
pub const CMD_BLOCK64_ERASE: u8 = 0xD8;
/// Read JEDEC ID (manufacturer, memory type, capacity).
pub const CMD_READ_JEDEC_ID: u8 = 0x9F;
/// Read unique ID (Winbond and compatibles).
pub const CMD_READ_UNIQUE_ID: u8 = 0x4B;

pub const UNIQUE_ID_DUMMY_BYTES: usize = 4;
pub const UNIQUE_ID_DATA_BYTES: usize = 8;
pub const UNIQUE_ID_TOTAL_BYTES: usize = 1 + UNIQUE_ID_DUMMY_BYTES + UNIQUE_ID_DATA_BYTES;

pub const JEDEC_ID_DATA_BYTES: usize = 3;

/// Erase granularity handed to the ROM's range-erase routine.
///
/// The ROM issues `cmd` for every `size`-aligned chunk that fits and falls
/// back to 4 KiB sector erases for the rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EraseOp {
    Sector,
    Block32,
    Block64,
}

impl EraseOp {
    pub fn size(self) -> u32 {
        match self {
            EraseOp::Sector => FLASH_SECTOR_SIZE,
            EraseOp::Block32 => 32 * 1024,
            EraseOp::Block64 => FLASH_BLOCK_SIZE,
        }
    }

    pub fn opcode(self) -> u8 {
        match self {
            EraseOp::Sector => CMD_SECTOR_ERASE,
            EraseOp::Block32 => CMD_BLOCK32_ERASE,
            EraseOp::Block64 => CMD_BLOCK64_ERASE,
        }
    }
}

/// Check that `[offset, offset + len)` is non-empty and inside the window.
pub fn check_range(offset: u32, len: u32) -> Result<(), Error> {
    if len == 0 {
        return Err(Error::ZeroLength);
    }
    match offset.checked_add(len) {
        Some(end) if end <= FLASH_WINDOW_SIZE => Ok(()),
        _ => Err(Error::OutOfBounds),
    }
}

/// Erase ranges must start and end on a sector boundary.
pub fn check_erase_range(offset: u32, len: u32) -> Result<(), Error> {
    check_range(offset, len)?;
    if !offset.is_multiple_of(FLASH_SECTOR_SIZE) || !len.is_multiple_of(FLASH_SECTOR_SIZE) {
        return Err(Error::Misaligned);
    }
    Ok(())
}

/// Reject a buffer at `addr` spanning `len` bytes if any of it sits in the
/// XIP aliases: it would be unreadable once XIP is down.
pub fn check_source(addr: usize, len: usize) -> Result<(), Error> {
    let end = addr.saturating_add(len);
    if addr < XIP_ALIAS_END && end > XIP_ALIAS_START {
        return Err(Error::SourceInFlash);
    }
    Ok(())
}
