// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Boot-ROM flash routines.
//!
//! The hardware bindings resolve every function pointer once, at
//! construction, while XIP is still live. The pointers then sit in the
//! driver (RAM) so the envelope never reads flash to find them.

/// The boot-ROM entry points the envelope is built from.
pub trait FlashRom {
    /// Restore the QSPI pads and bus to a state where raw access works.
    fn connect_internal_flash(&mut self);
    /// Leave XIP mode; flash is no longer readable through the window.
    fn flash_exit_xip(&mut self);
    /// Erase `len` bytes at `offset`, using `cmd` for each aligned
    /// `block_size` chunk.
    fn flash_range_erase(&mut self, offset: u32, len: usize, block_size: u32, cmd: u8);
    /// Program `data` at `offset`.
    fn flash_range_program(&mut self, offset: u32, data: &[u8]);
    /// Flush the XIP cache so no stale line survives the content change.
    fn flash_flush_cache(&mut self);
}

#[cfg(any(feature = "rp2040", feature = "rp2350"))]
type RomFnVoid = unsafe extern "C" fn();
#[cfg(any(feature = "rp2040", feature = "rp2350"))]
type RomFnErase = unsafe extern "C" fn(u32, usize, u32, u8);
#[cfg(any(feature = "rp2040", feature = "rp2350"))]
type RomFnProgram = unsafe extern "C" fn(u32, *const u8, usize);

#[cfg(any(feature = "rp2040", feature = "rp2350"))]
/// ROM function pointers, resolved from the ROM table.
#[derive(Clone, Copy)]
struct RomTable {
    connect_internal_flash: RomFnVoid,
    flash_exit_xip: RomFnVoid,
    flash_range_erase: RomFnErase,
    flash_range_program: RomFnProgram,
    flash_flush_cache: RomFnVoid,
}

#[cfg(any(feature = "rp2040", feature = "rp2350"))]
impl RomTable {
    #[inline(always)]
    fn connect_internal_flash(&self) {
        unsafe { (self.connect_internal_flash)() }
    }

    #[inline(always)]
    fn flash_exit_xip(&self) {
        unsafe { (self.flash_exit_xip)() }
    }

    #[inline(always)]
    fn flash_range_erase(&self, offset: u32, len: usize, block_size: u32, cmd: u8) {
        unsafe { (self.flash_range_erase)(offset, len, block_size, cmd) }
    }

    #[inline(always)]
    fn flash_range_program(&self, offset: u32, data: &[u8]) {
        unsafe { (self.flash_range_program)(offset, data.as_ptr(), data.len()) }
    }

    #[inline(always)]
    fn flash_flush_cache(&self) {
        unsafe { (self.flash_flush_cache)() }
    }
}

#[cfg(any(feature = "rp2040", feature = "rp2350"))]
macro_rules! forward_rom_table {
    ($ty:ty) => {
        impl FlashRom for $ty {
            #[inline(always)]
            fn connect_internal_flash(&mut self) {
                self.table.connect_internal_flash()
            }

            #[inline(always)]
            fn flash_exit_xip(&mut self) {
                self.table.flash_exit_xip()
            }

            #[inline(always)]
            fn flash_range_erase(&mut self, offset: u32, len: usize, block_size: u32, cmd: u8) {
                self.table.flash_range_erase(offset, len, block_size, cmd)
            }

            #[inline(always)]
            fn flash_range_program(&mut self, offset: u32, data: &[u8]) {
                self.table.flash_range_program(offset, data)
            }

            #[inline(always)]
            fn flash_flush_cache(&mut self) {
                self.table.flash_flush_cache()
            }
        }
    };
}

/// RP2040 boot ROM, looked up through `rp2040_hal::rom_data`.
#[cfg(feature = "rp2040")]
pub struct Rp2040Rom {
    table: RomTable,
}

#[cfg(feature = "rp2040")]
impl Rp2040Rom {
    /// Resolve the ROM flash routines. Requires XIP to be active.
    pub fn new() -> Self {
        use rp2040_hal::rom_data;

        Self {
            table: RomTable {
                connect_internal_flash: rom_data::connect_internal_flash::ptr(),
                flash_exit_xip: rom_data::flash_exit_xip::ptr(),
                flash_range_erase: rom_data::flash_range_erase::ptr(),
                flash_range_program: rom_data::flash_range_program::ptr(),
                flash_flush_cache: rom_data::flash_flush_cache::ptr(),
            },
        }
    }
}

#[cfg(feature = "rp2040")]
impl Default for Rp2040Rom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "rp2040")]
forward_rom_table!(Rp2040Rom);

/// RP2350 boot ROM, looked up through `rom_table_lookup`.
#[cfg(feature = "rp2350")]
pub struct Rp2350Rom {
    table: RomTable,
}

#[cfg(feature = "rp2350")]
impl Rp2350Rom {
    /// Halfword pointer to `rom_table_lookup` (Arm).
    const TABLE_LOOKUP: *const u16 = 0x16 as *const u16;
    /// Look up the Arm secure-mode entry of a function.
    const RT_FLAG_FUNC_ARM_SEC: u32 = 0x0004;

    /// Look up a ROM function by its two-character tag.
    unsafe fn lookup(tag: &[u8; 2]) -> usize {
        let lookup: unsafe extern "C" fn(u32, u32) -> usize =
            core::mem::transmute::<usize, unsafe extern "C" fn(u32, u32) -> usize>(
                Self::TABLE_LOOKUP.read_volatile() as usize,
            );
        let code = u16::from_le_bytes(*tag) as u32;
        lookup(code, Self::RT_FLAG_FUNC_ARM_SEC)
    }

    /// Resolve the ROM flash routines. Requires XIP to be active.
    pub fn new() -> Self {
        unsafe {
            Self {
                table: RomTable {
                    connect_internal_flash: core::mem::transmute::<usize, RomFnVoid>(
                        Self::lookup(b"IF"),
                    ),
                    flash_exit_xip: core::mem::transmute::<usize, RomFnVoid>(Self::lookup(b"EX")),
                    flash_range_erase: core::mem::transmute::<usize, RomFnErase>(
                        Self::lookup(b"RE"),
                    ),
                    flash_range_program: core::mem::transmute::<usize, RomFnProgram>(
                        Self::lookup(b"RP"),
                    ),
                    flash_flush_cache: core::mem::transmute::<usize, RomFnVoid>(
                        Self::lookup(b"FC"),
                    ),
                },
            }
        }
    }
}

#[cfg(feature = "rp2350")]
impl Default for Rp2350Rom {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "rp2350")]
forward_rom_table!(Rp2350Rom);
