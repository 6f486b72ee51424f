// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Self-hosted flash driver for RP2040/RP2350 parts that execute in place
//! from the same QSPI NOR chip they erase and program.
//!
//! Every destructive or raw operation runs inside one envelope, executed
//! from RAM with interrupts masked:
//!   1. capture the boot2 shadow (RP2040 only, once)
//!   2. connect_internal_flash() + flash_exit_xip()
//!   3. erase / program through the ROM, or a raw transfer on the bus
//!   4. flash_flush_cache()
//!   5. restore XIP (jump into the boot2 shadow on RP2040)
//!
//! Feature flags:
//! - `rp2040`: Legacy family (SSI shift-register engine, IO_QSPI chip select)
//! - `rp2350`: Direct family (QMI direct-mode engine)
//! - `std`: host support, used by the simulation tests
//! - `defmt`: logging

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(all(test, not(feature = "std")))]
extern crate std;

#[cfg(all(feature = "rp2040", feature = "rp2350"))]
compile_error!("features `rp2040` and `rp2350` are mutually exclusive");

mod fmt;

pub mod boot2;
pub mod chip_select;
pub mod driver;
pub mod error;
#[cfg(any(feature = "rp2040", feature = "rp2350"))]
pub mod family;
pub mod identity;
pub mod irq;
pub mod layout;
pub mod regs;
pub mod rom;
pub mod transport;

pub use boot2::{Boot2Shadow, RomRestore, Trampoline, XipRestore, BOOT2_WORDS};
pub use chip_select::{ChipSelect, DirectCs, GpioOverrideCs};
pub use driver::FlashDriver;
pub use error::Error;
pub use identity::{JedecId, UniqueId};
pub use layout::{
    EraseOp, FLASH_BASE, FLASH_BLOCK_SIZE, FLASH_PAGE_SIZE, FLASH_SECTOR_SIZE, FLASH_WINDOW_SIZE,
};
pub use regs::{Mmio, RegisterBlock};
pub use rom::FlashRom;
pub use transport::{QmiConfig, QmiTransport, SsiConfig, SsiTransport, Transport};

#[cfg(any(feature = "rp2040", feature = "rp2350"))]
pub use family::Flash;
