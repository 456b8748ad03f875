//! Fake register file for unit tests
//!
//! Models just enough of the controller for the engine's own tests: the
//! EECD request/grant handshake, line-level EECD edges, the EERD/EEWR
//! word engine over an in-memory word array, and plain storage for every
//! other register. The full SPI EEPROM emulation lives in nicnvm-dummy.

use std::collections::BTreeMap;
use std::vec::Vec;

use crate::bus::RegisterBus;
use crate::regs::{
    Eecd, EECD, EERD, EEWR, NVM_RW_ADDR_SHIFT, NVM_RW_REG_DATA, NVM_RW_REG_DONE, NVM_RW_REG_START,
};

pub struct FakeBus {
    words: Vec<u16>,
    regs: BTreeMap<u32, u32>,
    grant: bool,
    eerd_stuck: bool,
    do_pattern: Vec<bool>,
    do_index: usize,
    di_samples: Vec<bool>,
    reads: usize,
    writes: usize,
    delay_us: u64,
}

impl FakeBus {
    pub fn new(words: &[u16]) -> Self {
        Self {
            words: words.to_vec(),
            regs: BTreeMap::new(),
            grant: true,
            eerd_stuck: false,
            do_pattern: Vec::new(),
            do_index: 0,
            di_samples: Vec::new(),
            reads: 0,
            writes: 0,
            delay_us: 0,
        }
    }

    pub fn words(&self) -> &[u16] {
        &self.words
    }

    /// Number of `write_reg` calls
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Number of `read_reg` calls, flushes included
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Current register value without counting an access
    pub fn reg(&self, reg: u32) -> u32 {
        self.regs.get(&reg).copied().unwrap_or(0)
    }

    pub fn set_grant(&mut self, grant: bool) {
        self.grant = grant;
    }

    pub fn set_eerd_stuck(&mut self, stuck: bool) {
        self.eerd_stuck = stuck;
    }

    /// DO levels presented on successive SK rising edges; low afterwards
    pub fn set_do_pattern(&mut self, pattern: &[bool]) {
        self.do_pattern = pattern.to_vec();
        self.do_index = 0;
    }

    /// DI level seen at each SK rising edge
    pub fn rising_edge_di(&self) -> &[bool] {
        &self.di_samples
    }

    pub fn total_delay_us(&self) -> u64 {
        self.delay_us
    }

    fn write_eecd(&mut self, value: u32) {
        let old = Eecd::from_bits_retain(self.reg(EECD));
        let mut new = Eecd::from_bits_retain(value);

        // DO and GNT are driven by the device
        new.set(Eecd::DO, old.contains(Eecd::DO));
        new.set(Eecd::GNT, self.grant && new.contains(Eecd::REQ));

        if !old.contains(Eecd::SK) && new.contains(Eecd::SK) {
            self.di_samples.push(new.contains(Eecd::DI));
            let level = self.do_pattern.get(self.do_index).copied().unwrap_or(false);
            self.do_index += 1;
            new.set(Eecd::DO, level);
        }

        self.regs.insert(EECD, new.bits());
    }

    fn word_address(value: u32) -> usize {
        ((value & 0xFFFF) >> NVM_RW_ADDR_SHIFT) as usize
    }

    fn write_eerd(&mut self, value: u32) {
        if value & NVM_RW_REG_START == 0 || self.eerd_stuck {
            self.regs.insert(EERD, value & !NVM_RW_REG_DONE);
            return;
        }
        let word = self.words[Self::word_address(value)];
        let done = (u32::from(word) << NVM_RW_REG_DATA) | (value & 0xFFFC) | NVM_RW_REG_DONE;
        self.regs.insert(EERD, done);
    }

    fn write_eewr(&mut self, value: u32) {
        if value & NVM_RW_REG_START == 0 || self.eerd_stuck {
            return;
        }
        let address = Self::word_address(value);
        self.words[address] = (value >> NVM_RW_REG_DATA) as u16;
    }
}

impl RegisterBus for FakeBus {
    fn read_reg(&mut self, reg: u32) -> u32 {
        self.reads += 1;
        match reg {
            EEWR if self.eerd_stuck => 0,
            EEWR => NVM_RW_REG_DONE,
            _ => self.reg(reg),
        }
    }

    fn write_reg(&mut self, reg: u32, value: u32) {
        self.writes += 1;
        match reg {
            EECD => self.write_eecd(value),
            EERD => self.write_eerd(value),
            EEWR => self.write_eewr(value),
            _ => {
                self.regs.insert(reg, value);
            }
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_us += u64::from(us);
    }
}
