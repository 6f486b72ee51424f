// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Chip identity: the 64-bit unique ID and the JEDEC ID, their command
//! frames, and the cache that keeps the unique ID after the first read.

use core::fmt;

use crate::layout::{
    CMD_READ_JEDEC_ID, CMD_READ_UNIQUE_ID, JEDEC_ID_DATA_BYTES, UNIQUE_ID_DATA_BYTES,
    UNIQUE_ID_DUMMY_BYTES, UNIQUE_ID_TOTAL_BYTES,
};

/// Factory-programmed unique ID of the flash chip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UniqueId(pub [u8; UNIQUE_ID_DATA_BYTES]);

impl UniqueId {
    pub fn as_bytes(&self) -> &[u8; UNIQUE_ID_DATA_BYTES] {
        &self.0
    }

    /// The ID read as a big-endian integer, first byte on the wire first.
    pub fn to_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

/// Response to the JEDEC "read ID" command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct JedecId {
    pub manufacturer: u8,
    pub memory_type: u8,
    pub capacity_code: u8,
}

impl JedecId {
    /// Chip size in bytes, for the usual `2^n` capacity encoding.
    pub fn capacity(&self) -> Option<u32> {
        match self.capacity_code {
            code @ 0x08..=0x1f => Some(1u32 << code),
            _ => None,
        }
    }
}

/// `0x4B`, four dummy bytes, then eight bytes clocked in as the ID.
pub fn unique_id_frame() -> [u8; UNIQUE_ID_TOTAL_BYTES] {
    let mut frame = [0u8; UNIQUE_ID_TOTAL_BYTES];
    frame[0] = CMD_READ_UNIQUE_ID;
    frame
}

pub fn parse_unique_id(rx: &[u8; UNIQUE_ID_TOTAL_BYTES]) -> UniqueId {
    let mut id = [0u8; UNIQUE_ID_DATA_BYTES];
    id.copy_from_slice(&rx[1 + UNIQUE_ID_DUMMY_BYTES..]);
    UniqueId(id)
}

pub fn jedec_id_frame() -> [u8; 1 + JEDEC_ID_DATA_BYTES] {
    let mut frame = [0u8; 1 + JEDEC_ID_DATA_BYTES];
    frame[0] = CMD_READ_JEDEC_ID;
    frame
}

pub fn parse_jedec_id(rx: &[u8; 1 + JEDEC_ID_DATA_BYTES]) -> JedecId {
    JedecId {
        manufacturer: rx[1],
        memory_type: rx[2],
        capacity_code: rx[3],
    }
}

/// Write-once store for the unique ID. The chip's ID never changes, so
/// once set the value is served without touching the bus.
#[derive(Debug, Default)]
pub struct IdCache {
    id: Option<UniqueId>,
}

impl IdCache {
    pub const fn new() -> Self {
        Self { id: None }
    }

    pub fn get(&self) -> Option<UniqueId> {
        self.id
    }

    /// Store `id` unless a value is already cached; returns the cached one.
    pub fn fill(&mut self, id: UniqueId) -> UniqueId {
        *self.id.get_or_insert(id)
    }
}
