// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! xipflash on a Pico: identify the flash, then erase, program and verify
//! a scratch block at the end of the chip while running from that chip.

#![no_std]
#![no_main]

mod peripherals;

use crc::{Crc, CRC_32_ISO_HDLC};
use defmt_rtt as _;
use embedded_hal::digital::{OutputPin, StatefulOutputPin};
use panic_probe as _;
use xipflash::{Flash, FLASH_BASE, FLASH_BLOCK_SIZE, FLASH_PAGE_SIZE, FLASH_WINDOW_SIZE};

defmt::timestamp!("{=u64:us}", { 0 });

use cortex_m_rt::entry;

#[unsafe(link_section = ".boot2")]
#[used]
pub static BOOT2_FIRMWARE: [u8; 256] = rp2040_boot2::BOOT_LOADER_W25Q080;

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Flash size assumed when the JEDEC ID does not tell.
const DEFAULT_FLASH_SIZE: u32 = 2 * 1024 * 1024;

/// Read bytes from an absolute XIP flash address via volatile reads.
fn flash_read(abs_addr: u32, buf: &mut [u8]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte = unsafe { ((abs_addr + i as u32) as *const u8).read_volatile() };
    }
}

/// Erase the last block, program one page and compare it through XIP.
fn scratch_test(flash: &mut Flash, flash_size: u32) -> Result<bool, xipflash::Error> {
    let offset = flash_size
        .min(FLASH_WINDOW_SIZE)
        .checked_sub(FLASH_BLOCK_SIZE)
        .ok_or(xipflash::Error::OutOfBounds)?;

    let mut page = [0u8; FLASH_PAGE_SIZE as usize];
    for (i, byte) in page.iter_mut().enumerate() {
        *byte = (i as u8) ^ 0x5A;
    }
    let expected = CRC32.checksum(&page);

    flash.erase(offset, FLASH_BLOCK_SIZE)?;

    let mut readback = [0u8; FLASH_PAGE_SIZE as usize];
    flash_read(FLASH_BASE + offset, &mut readback);
    if readback.iter().any(|&b| b != 0xFF) {
        defmt::println!("Erase check failed at 0x{:08x}", FLASH_BASE + offset);
        return Ok(false);
    }

    flash.program(offset, &page)?;

    flash_read(FLASH_BASE + offset, &mut readback);
    let actual = CRC32.checksum(&readback);
    if actual != expected {
        defmt::println!(
            "CRC mismatch at 0x{:08x}: expected 0x{:08x}, got 0x{:08x}",
            FLASH_BASE + offset,
            expected,
            actual
        );
        return Ok(false);
    }

    Ok(true)
}

#[entry]
fn main() -> ! {
    defmt::println!("xipflash demo started");

    let mut p = peripherals::init();
    peripherals::blink(&mut p.led_pin, &mut p.timer, 3, 200);

    let mut flash = Flash::take().unwrap();

    let flash_size = match flash.jedec_id() {
        Ok(jedec) => {
            defmt::println!("JEDEC ID: {}", jedec);
            jedec.capacity().unwrap_or(DEFAULT_FLASH_SIZE)
        }
        Err(e) => {
            defmt::println!("JEDEC ID read failed: {}", e);
            DEFAULT_FLASH_SIZE
        }
    };

    match flash.unique_id() {
        Ok(id) => defmt::println!("Unique ID: {}", id),
        Err(e) => defmt::println!("Unique ID read failed: {}", e),
    }

    let period = match scratch_test(&mut flash, flash_size) {
        Ok(true) => {
            defmt::println!("Scratch block erase/program verified");
            500_000
        }
        Ok(false) => 50_000,
        Err(e) => {
            defmt::println!("Scratch test rejected: {}", e);
            50_000
        }
    };

    // Slow blink on success, fast blink on failure
    let mut blink_counter = 0u32;
    loop {
        blink_counter += 1;
        if blink_counter >= period {
            blink_counter = 0;
            if p.led_pin.is_set_high().unwrap_or(false) {
                p.led_pin.set_low().ok();
            } else {
                p.led_pin.set_high().ok();
            }
        }
    }
}
