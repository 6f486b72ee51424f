// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Simulated flash bus for the host tests.
//!
//! One `SimBus` models the SSI controller, the IO_QSPI chip-select
//! override, the QMI direct-mode interface, the boot2 region at the start
//! of the XIP window, a flash chip on the wire, and the ROM. Typed views
//! hand each piece to the driver as a `RegisterBlock`; everything that
//! happens lands in one event log.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;

use xipflash::boot2::{Boot2Shadow, RomRestore, Trampoline, BOOT2_WORDS};
use xipflash::chip_select::GpioOverrideCs;
use xipflash::irq;
use xipflash::regs::{ioqspi, qmi, ssi, RegisterBlock};
use xipflash::rom::FlashRom;
use xipflash::transport::{QmiConfig, QmiTransport, SsiConfig, SsiTransport};
use xipflash::{FlashDriver, FLASH_PAGE_SIZE};

const PAGE: usize = FLASH_PAGE_SIZE as usize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Connect,
    ExitXip,
    Erase {
        offset: u32,
        len: usize,
        block_size: u32,
        cmd: u8,
    },
    Program {
        offset: u32,
        data: Vec<u8>,
    },
    Flush,
    Restore,
    CsAssert,
    CsDeassert,
    /// One byte clocked on the wire: (sent, received).
    Shift(u8, u8),
}

/// What the flash chip answers to byte `index` of the current frame.
pub type Responder = Box<dyn FnMut(usize, u8) -> u8>;

/// Tiny xorshift generator for jittered FIFO readiness.
pub struct XorShift(u32);

impl XorShift {
    pub fn new(seed: u32) -> Self {
        Self(seed.max(1))
    }

    pub fn next(&mut self) -> u32 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.0 = x;
        x
    }
}

/// Pattern of the fake boot2 image at the start of the XIP window.
pub fn boot2_word(i: usize) -> u32 {
    0xB007_0000 | i as u32
}

/// Junk in the upper bits of DIRECT_RX, which the engine must drop.
pub const QMI_RX_JUNK: u32 = 0x5A00;

/// Unrelated bits of the IO_QSPI SS control register.
pub const SS_CTRL_OTHER_BITS: u32 = 0x3003_0011;

pub struct State {
    pub log: Vec<Event>,
    responder: Responder,
    fifo_depth: usize,
    rng: Option<XorShift>,

    // XIP_SSI
    pub ctrlr0: u32,
    pub baudr: u32,
    pub ssienr: u32,
    /// CTRLR0/BAUDR as seen by the first byte on the wire.
    pub config_on_wire: Option<(u32, u32)>,

    // IO_QSPI
    pub ss_ctrl: u32,

    // QMI
    pub direct_csr: u32,
    busy_reads: u32,

    // Shared FIFOs and wire state
    tx_fifo: VecDeque<u8>,
    rx_fifo: VecDeque<u8>,
    cs_asserted: bool,
    frame_index: usize,
    pushed: usize,
    popped: usize,
    pub max_in_flight: usize,
    pub unmasked_pushes: usize,

    // Boot region
    pub boot_reads: usize,

    // ROM
    pub xip_enabled: bool,
}

pub struct SimBus {
    state: RefCell<State>,
}

impl SimBus {
    pub fn new(fifo_depth: usize, responder: Responder) -> Self {
        Self {
            state: RefCell::new(State {
                log: Vec::new(),
                responder,
                fifo_depth,
                rng: None,
                ctrlr0: 0x001f_0300,
                baudr: 4,
                ssienr: 1,
                config_on_wire: None,
                ss_ctrl: SS_CTRL_OTHER_BITS,
                direct_csr: 0,
                busy_reads: 0,
                tx_fifo: VecDeque::new(),
                rx_fifo: VecDeque::new(),
                cs_asserted: false,
                frame_index: 0,
                pushed: 0,
                popped: 0,
                max_in_flight: 0,
                unmasked_pushes: 0,
                boot_reads: 0,
                xip_enabled: true,
            }),
        }
    }

    /// A chip that answers every byte with its bitwise complement.
    pub fn complementing(fifo_depth: usize) -> Self {
        Self::new(fifo_depth, Box::new(|_, byte| !byte))
    }

    /// Report "not ready" on about a third of status reads.
    pub fn with_jitter(self, seed: u32) -> Self {
        self.state.borrow_mut().rng = Some(XorShift::new(seed));
        self
    }

    pub fn state(&self) -> std::cell::Ref<'_, State> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> std::cell::RefMut<'_, State> {
        self.state.borrow_mut()
    }

    pub fn log(&self) -> Vec<Event> {
        self.state.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    pub fn ssi(&self) -> SsiView<'_> {
        SsiView(self)
    }

    pub fn io_qspi(&self) -> IoQspiView<'_> {
        IoQspiView(self)
    }

    pub fn qmi(&self) -> QmiView<'_> {
        QmiView(self)
    }

    pub fn boot(&self) -> BootView<'_> {
        BootView(self)
    }

    pub fn rom(&self) -> FakeRom<'_> {
        FakeRom(self)
    }

    pub fn trampoline(&self) -> RecordingTrampoline<'_> {
        RecordingTrampoline(self)
    }
}

impl State {
    fn ready(&mut self) -> bool {
        match self.rng.as_mut() {
            Some(rng) => rng.next() % 3 != 0,
            None => true,
        }
    }

    fn set_cs(&mut self, asserted: bool) {
        if asserted == self.cs_asserted {
            return;
        }
        self.cs_asserted = asserted;
        if asserted {
            self.frame_index = 0;
            self.log.push(Event::CsAssert);
        } else {
            self.log.push(Event::CsDeassert);
        }
    }

    /// Move one byte from the TX FIFO across the wire into the RX FIFO.
    fn shift(&mut self) {
        if !self.cs_asserted {
            return;
        }
        let Some(sent) = self.tx_fifo.pop_front() else {
            return;
        };
        if self.config_on_wire.is_none() {
            self.config_on_wire = Some((self.ctrlr0, self.baudr));
        }
        let received = (self.responder)(self.frame_index, sent);
        self.frame_index += 1;
        self.rx_fifo.push_back(received);
        assert!(
            self.rx_fifo.len() <= self.fifo_depth,
            "RX FIFO overrun (depth {})",
            self.fifo_depth
        );
        self.log.push(Event::Shift(sent, received));
    }

    fn push(&mut self, byte: u8) {
        assert!(self.tx_fifo.len() < self.fifo_depth, "TX FIFO overrun");
        if !irq::is_masked() {
            self.unmasked_pushes += 1;
        }
        self.tx_fifo.push_back(byte);
        self.pushed += 1;
        self.max_in_flight = self.max_in_flight.max(self.pushed - self.popped);
    }

    fn pop(&mut self) -> u8 {
        let byte = self.rx_fifo.pop_front().expect("RX FIFO underflow");
        self.popped += 1;
        byte
    }

    fn flush_fifos(&mut self) {
        self.tx_fifo.clear();
        self.rx_fifo.clear();
    }
}

// --- XIP_SSI ---

#[derive(Clone, Copy)]
pub struct SsiView<'a>(&'a SimBus);

impl RegisterBlock for SsiView<'_> {
    fn read(&self, offset: usize) -> u32 {
        let mut s = self.0.state.borrow_mut();
        match offset {
            ssi::CTRLR0 => s.ctrlr0,
            ssi::BAUDR => s.baudr,
            ssi::SSIENR => s.ssienr,
            ssi::SR => {
                if s.ssienr == 0 || !s.ready() {
                    return 0;
                }
                s.shift();
                let mut sr = 0;
                if s.tx_fifo.len() < s.fifo_depth {
                    sr |= ssi::SR_TFNF;
                }
                if !s.rx_fifo.is_empty() && s.ready() {
                    sr |= ssi::SR_RFNE;
                }
                sr
            }
            ssi::DR0 => s.pop() as u32,
            _ => panic!("unmodelled SSI register {:#x}", offset),
        }
    }

    fn write(&self, offset: usize, value: u32) {
        let mut s = self.0.state.borrow_mut();
        match offset {
            ssi::CTRLR0 => {
                assert_eq!(s.ssienr, 0, "CTRLR0 written while SSI enabled");
                s.ctrlr0 = value;
            }
            ssi::BAUDR => {
                assert_eq!(s.ssienr, 0, "BAUDR written while SSI enabled");
                s.baudr = value;
            }
            ssi::SSIENR => {
                if value == 0 {
                    s.flush_fifos();
                }
                s.ssienr = value;
            }
            ssi::DR0 => {
                assert_eq!(s.ssienr, 1, "DR0 written while SSI disabled");
                s.push(value as u8);
            }
            _ => panic!("unmodelled SSI register {:#x}", offset),
        }
    }
}

// --- IO_QSPI ---

#[derive(Clone, Copy)]
pub struct IoQspiView<'a>(&'a SimBus);

impl RegisterBlock for IoQspiView<'_> {
    fn read(&self, offset: usize) -> u32 {
        assert_eq!(offset, ioqspi::SS_CTRL);
        self.0.state.borrow().ss_ctrl
    }

    fn write(&self, offset: usize, value: u32) {
        assert_eq!(offset, ioqspi::SS_CTRL);
        let mut s = self.0.state.borrow_mut();
        s.ss_ctrl = value;
        let outover = (value & ioqspi::OUTOVER_BITS) >> ioqspi::OUTOVER_LSB;
        s.set_cs(outover == ioqspi::OUTOVER_LOW);
    }
}

// --- QMI direct mode ---

#[derive(Clone, Copy)]
pub struct QmiView<'a>(&'a SimBus);

impl RegisterBlock for QmiView<'_> {
    fn read(&self, offset: usize) -> u32 {
        let mut s = self.0.state.borrow_mut();
        match offset {
            qmi::DIRECT_CSR => {
                let mut csr = s.direct_csr & (qmi::CSR_EN | qmi::CSR_ASSERT_CS0N);
                if s.busy_reads > 0 {
                    s.busy_reads -= 1;
                    return csr | qmi::CSR_BUSY | qmi::CSR_TXFULL | qmi::CSR_RXEMPTY;
                }
                if csr & qmi::CSR_EN != 0 && s.ready() {
                    s.shift();
                }
                if s.tx_fifo.len() >= s.fifo_depth || !s.ready() {
                    csr |= qmi::CSR_TXFULL;
                }
                if s.rx_fifo.is_empty() {
                    csr |= qmi::CSR_RXEMPTY;
                }
                csr
            }
            qmi::DIRECT_RX => s.pop() as u32 | QMI_RX_JUNK,
            _ => panic!("unmodelled QMI register {:#x}", offset),
        }
    }

    fn write(&self, offset: usize, value: u32) {
        let mut s = self.0.state.borrow_mut();
        match offset {
            qmi::DIRECT_CSR => {
                let was_enabled = s.direct_csr & qmi::CSR_EN != 0;
                let enabled = value & qmi::CSR_EN != 0;
                if enabled && !was_enabled {
                    s.busy_reads = 3;
                }
                if !enabled {
                    s.flush_fifos();
                }
                s.direct_csr = value & (qmi::CSR_EN | qmi::CSR_ASSERT_CS0N);
                s.set_cs(enabled && value & qmi::CSR_ASSERT_CS0N != 0);
            }
            qmi::DIRECT_TX => {
                assert!(s.direct_csr & qmi::CSR_EN != 0, "DIRECT_TX written outside direct mode");
                s.push(value as u8);
            }
            _ => panic!("unmodelled QMI register {:#x}", offset),
        }
    }
}

// --- Boot2 region ---

#[derive(Clone, Copy)]
pub struct BootView<'a>(&'a SimBus);

impl RegisterBlock for BootView<'_> {
    fn read(&self, offset: usize) -> u32 {
        let mut s = self.0.state.borrow_mut();
        assert!(s.xip_enabled, "boot2 read while XIP is down");
        assert!(offset < BOOT2_WORDS * 4);
        s.boot_reads += 1;
        boot2_word(offset / 4)
    }

    fn write(&self, _offset: usize, _value: u32) {
        panic!("boot2 region is read-only");
    }
}

// --- ROM ---

pub struct FakeRom<'a>(&'a SimBus);

impl FakeRom<'_> {
    fn record(&self, event: Event) {
        assert!(irq::is_masked(), "ROM called with interrupts enabled: {:?}", event);
        self.0.state.borrow_mut().log.push(event);
    }
}

impl FlashRom for FakeRom<'_> {
    fn connect_internal_flash(&mut self) {
        self.record(Event::Connect);
    }

    fn flash_exit_xip(&mut self) {
        self.record(Event::ExitXip);
        self.0.state.borrow_mut().xip_enabled = false;
    }

    fn flash_range_erase(&mut self, offset: u32, len: usize, block_size: u32, cmd: u8) {
        assert!(!self.0.state.borrow().xip_enabled, "erase with XIP live");
        self.record(Event::Erase {
            offset,
            len,
            block_size,
            cmd,
        });
    }

    fn flash_range_program(&mut self, offset: u32, data: &[u8]) {
        assert!(!self.0.state.borrow().xip_enabled, "program with XIP live");
        // The ROM only programs whole pages at page-aligned offsets.
        assert!(
            offset.is_multiple_of(FLASH_PAGE_SIZE) && data.len().is_multiple_of(PAGE),
            "program not page aligned: offset={:#x} len={}",
            offset,
            data.len()
        );
        self.record(Event::Program {
            offset,
            data: data.to_vec(),
        });
    }

    fn flash_flush_cache(&mut self) {
        self.record(Event::Flush);
    }
}

/// Flash contents over `[offset, offset + len)` after replaying every
/// logged program onto erased flash. Programming ANDs bits in, as on the
/// chip.
pub fn programmed_image(log: &[Event], offset: u32, len: usize) -> Vec<u8> {
    let mut image = vec![0xFFu8; len];
    for event in log {
        if let Event::Program { offset: at, data } = event {
            for (i, byte) in data.iter().enumerate() {
                let Some(rel) = (*at as usize + i).checked_sub(offset as usize) else {
                    continue;
                };
                if let Some(slot) = image.get_mut(rel) {
                    *slot &= byte;
                }
            }
        }
    }
    image
}

/// Stands in for the jump into the boot2 copy: checks the image and turns
/// XIP back on.
pub struct RecordingTrampoline<'a>(&'a SimBus);

impl Trampoline for RecordingTrampoline<'_> {
    unsafe fn enter(&mut self, image: *const u32) {
        let image = std::slice::from_raw_parts(image, BOOT2_WORDS);
        for (i, word) in image.iter().enumerate() {
            assert_eq!(*word, boot2_word(i), "boot2 copy differs at word {}", i);
        }
        let mut s = self.0.state.borrow_mut();
        s.log.push(Event::Restore);
        s.xip_enabled = true;
    }
}

// --- Assembled drivers ---

pub type LegacyTransport<'a> = SsiTransport<SsiView<'a>, GpioOverrideCs<IoQspiView<'a>>>;
pub type LegacyRestore<'a> = Boot2Shadow<BootView<'a>, RecordingTrampoline<'a>>;
pub type LegacyDriver<'a> = FlashDriver<FakeRom<'a>, LegacyTransport<'a>, LegacyRestore<'a>>;
pub type DirectDriver<'a> = FlashDriver<FakeRom<'a>, QmiTransport<QmiView<'a>>, RomRestore>;

pub fn legacy_transport(bus: &SimBus, config: SsiConfig) -> LegacyTransport<'_> {
    SsiTransport::new(bus.ssi(), GpioOverrideCs::new(bus.io_qspi()), config)
}

pub fn legacy_driver(bus: &SimBus) -> LegacyDriver<'_> {
    let depth = bus.state().fifo_depth;
    FlashDriver::new(
        bus.rom(),
        legacy_transport(
            bus,
            SsiConfig {
                fifo_depth: depth,
                ..SsiConfig::default()
            },
        ),
        Boot2Shadow::new(bus.boot(), bus.trampoline()),
    )
}

pub fn direct_driver(bus: &SimBus) -> DirectDriver<'_> {
    let depth = bus.state().fifo_depth;
    FlashDriver::new(
        bus.rom(),
        QmiTransport::new(bus.qmi(), QmiConfig { fifo_depth: depth }),
        RomRestore,
    )
}

/// Only the wire-level events of a log.
pub fn wire_events(log: &[Event]) -> Vec<Event> {
    log.iter()
        .filter(|e| matches!(e, Event::CsAssert | Event::CsDeassert | Event::Shift(..)))
        .cloned()
        .collect()
}
