//! nicnvm-dummy - In-memory NIC register file emulator
//!
//! This crate provides a [`RegisterBus`] that emulates the NVM-facing part
//! of a gigabit controller: the EECD request/grant handshake, a bit-level
//! SPI EEPROM wired to the EECD lines, the EERD/EEWR word engine, and the
//! receive address registers loaded from NVM at reset. It's useful for
//! testing and for working on EEPROM images without real hardware.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

mod eeprom;

#[cfg(feature = "alloc")]
use alloc::collections::BTreeMap;
#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

pub use eeprom::{SpiEepromModel, MAX_PAGE_SIZE};

use nicnvm_core::nvm::NvmInfo;
#[cfg(feature = "alloc")]
use nicnvm_core::regs::{
    rah, ral, CTRL_EXT, CTRL_EXT_EE_RST, EECD, EERD, EEWR, NVM_RW_ADDR_SHIFT, NVM_RW_REG_DATA,
    NVM_RW_REG_DONE, NVM_RW_REG_START,
};
use nicnvm_core::regs::{
    Eecd, EECD_SIZE_EX_SHIFT, NVM_WORD_SIZE_BASE_SHIFT, NVM_WORD_SIZE_MAX_SHIFT,
};
#[cfg(feature = "alloc")]
use nicnvm_core::RegisterBus;

/// RAH: address valid
#[cfg(feature = "alloc")]
const RAH_AV: u32 = 1 << 31;

/// Configuration for the emulated controller
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// EECD size field; the part holds `64 << size_ex` words
    pub size_ex: u8,
    /// Strap 16-bit SPI addressing with 32-byte pages instead of 8-bit
    /// addressing with 8-byte pages
    pub wide_address: bool,
    /// Whether software requests on EECD are ever granted
    pub grant: bool,
    /// Status reads that report busy after each page write
    pub busy_polls: u32,
    /// EERD/EEWR never report completion
    pub eerd_stuck: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            size_ex: 2, // 256 words, exercises the A8 opcode bit
            wide_address: false,
            grant: true,
            busy_polls: 2,
            eerd_stuck: false,
        }
    }
}

impl DummyConfig {
    /// Config for a part of `word_size` words, picking the address width
    /// the size needs
    ///
    /// Returns `None` unless `word_size` is a supported power of two.
    pub fn for_word_size(word_size: usize) -> Option<Self> {
        if !word_size.is_power_of_two() {
            return None;
        }
        let shift = word_size.trailing_zeros();
        if !(NVM_WORD_SIZE_BASE_SHIFT..=NVM_WORD_SIZE_MAX_SHIFT).contains(&shift) {
            return None;
        }
        Some(Self {
            size_ex: (shift - NVM_WORD_SIZE_BASE_SHIFT) as u8,
            wide_address: word_size > 256,
            ..Self::default()
        })
    }

    /// EECD strap bits for this configuration
    pub fn straps(&self) -> u32 {
        let mut eecd = Eecd::PRES;
        if self.wide_address {
            eecd |= Eecd::ADDR_BITS;
        }
        eecd.bits() | (u32::from(self.size_ex) << EECD_SIZE_EX_SHIFT)
    }

    /// Part descriptor the engine detects from these straps
    pub fn nvm_info(&self) -> NvmInfo {
        NvmInfo::spi_from_eecd(self.straps())
    }
}

/// Emulated controller
#[cfg(feature = "alloc")]
pub struct DummyNic {
    config: DummyConfig,
    /// EEPROM contents, two bytes per word, low byte first
    mem: Vec<u8>,
    eeprom: SpiEepromModel,
    eecd: Eecd,
    eerd: u32,
    regs: BTreeMap<u32, u32>,
    reads: usize,
    writes: usize,
    delay_us: u64,
}

#[cfg(feature = "alloc")]
impl DummyNic {
    /// Create a controller with a blank (all 0xFF) EEPROM
    pub fn new(config: DummyConfig) -> Self {
        let info = config.nvm_info();
        let mem = vec![0xFF; usize::from(info.word_size) * 2];
        let eeprom = SpiEepromModel::new(
            info.address_bits as u8,
            usize::from(info.page_size),
            config.busy_polls,
        );

        let mut nic = Self {
            eecd: Eecd::from_bits_retain(config.straps()) | Eecd::CS,
            config,
            mem,
            eeprom,
            eerd: 0,
            regs: BTreeMap::new(),
            reads: 0,
            writes: 0,
            delay_us: 0,
        };
        nic.load_from_nvm();
        nic
    }

    /// Create a controller with the EEPROM pre-filled with `words`
    pub fn with_words(config: DummyConfig, words: &[u16]) -> Self {
        let mut nic = Self::new(config);
        for (i, &w) in words.iter().enumerate().take(nic.word_size()) {
            nic.mem[i * 2..i * 2 + 2].copy_from_slice(&w.to_le_bytes());
        }
        nic.load_from_nvm();
        nic
    }

    /// Create a controller from a raw image (16-bit little-endian words)
    pub fn with_image(config: DummyConfig, image: &[u8]) -> Self {
        let mut nic = Self::new(config);
        let len = core::cmp::min(image.len(), nic.mem.len());
        nic.mem[..len].copy_from_slice(&image[..len]);
        nic.load_from_nvm();
        nic
    }

    /// Number of words in the EEPROM
    pub fn word_size(&self) -> usize {
        self.mem.len() / 2
    }

    /// Get the raw EEPROM image
    pub fn image(&self) -> &[u8] {
        &self.mem
    }

    /// Read one EEPROM word directly, bypassing the register interface
    pub fn word(&self, index: usize) -> u16 {
        u16::from_le_bytes([self.mem[index * 2], self.mem[index * 2 + 1]])
    }

    /// All EEPROM words
    pub fn words(&self) -> Vec<u16> {
        (0..self.word_size()).map(|i| self.word(i)).collect()
    }

    /// Get the SPI EEPROM model
    pub fn eeprom(&self) -> &SpiEepromModel {
        &self.eeprom
    }

    /// Change whether EECD requests are granted
    pub fn set_grant(&mut self, grant: bool) {
        self.config.grant = grant;
    }

    /// Change how long the EEPROM stays busy after a page write
    pub fn set_busy_polls(&mut self, polls: u32) {
        self.config.busy_polls = polls;
        self.eeprom.set_busy_polls(polls);
    }

    /// Make EERD/EEWR hang
    pub fn set_eerd_stuck(&mut self, stuck: bool) {
        self.config.eerd_stuck = stuck;
    }

    /// Number of register reads so far
    pub fn reg_reads(&self) -> usize {
        self.reads
    }

    /// Number of register writes so far
    pub fn reg_writes(&self) -> usize {
        self.writes
    }

    /// Total time spent in delays
    pub fn total_delay_us(&self) -> u64 {
        self.delay_us
    }

    /// Zero the access counters and the delay accumulator
    pub fn reset_counters(&mut self) {
        self.reads = 0;
        self.writes = 0;
        self.delay_us = 0;
    }

    /// Latch the receive address registers from NVM words 0..3
    fn load_from_nvm(&mut self) {
        let low = u32::from(self.word(0)) | (u32::from(self.word(1)) << 16);
        let high = u32::from(self.word(2)) | RAH_AV;
        self.regs.insert(ral(0), low);
        self.regs.insert(rah(0), high);
    }

    fn word_address(value: u32) -> usize {
        ((value & 0xFFFF) >> NVM_RW_ADDR_SHIFT) as usize
    }

    fn write_eecd(&mut self, value: u32) {
        let host = Eecd::SK | Eecd::CS | Eecd::DI | Eecd::REQ;
        let old = self.eecd;
        let requested = Eecd::from_bits_retain(value) & host;

        // Chip select first, so a deselect commits before any clock edge
        let selected = !requested.contains(Eecd::CS);
        self.eeprom.set_selected(selected, &mut self.mem);

        if !old.contains(Eecd::SK) && requested.contains(Eecd::SK) {
            self.eeprom.clock(requested.contains(Eecd::DI), &mut self.mem);
        }

        let mut eecd = Eecd::from_bits_retain(self.config.straps()) | requested;
        eecd.set(Eecd::GNT, self.config.grant && requested.contains(Eecd::REQ));
        eecd.set(Eecd::DO, self.eeprom.data_out());
        self.eecd = eecd;
    }

    fn write_eerd(&mut self, value: u32) {
        if value & NVM_RW_REG_START == 0 || self.config.eerd_stuck {
            self.eerd = value & !NVM_RW_REG_DONE;
            return;
        }

        let addr = Self::word_address(value);
        let word = if addr < self.word_size() {
            self.word(addr)
        } else {
            log::warn!("dummy NIC: EERD address {:#x} out of range", addr);
            0xFFFF
        };
        self.eerd = (u32::from(word) << NVM_RW_REG_DATA) | (value & 0xFFFC) | NVM_RW_REG_DONE;
    }

    fn write_eewr(&mut self, value: u32) {
        if value & NVM_RW_REG_START == 0 || self.config.eerd_stuck {
            return;
        }

        let addr = Self::word_address(value);
        if addr < self.word_size() {
            let word = (value >> NVM_RW_REG_DATA) as u16;
            self.mem[addr * 2..addr * 2 + 2].copy_from_slice(&word.to_le_bytes());
        } else {
            log::warn!("dummy NIC: EEWR address {:#x} out of range", addr);
        }
    }

    fn write_ctrl_ext(&mut self, value: u32) {
        if value & CTRL_EXT_EE_RST != 0 {
            log::debug!("dummy NIC: reloading from NVM");
            self.load_from_nvm();
        }
        // EE_RST self-clears
        self.regs.insert(CTRL_EXT, value & !CTRL_EXT_EE_RST);
    }
}

#[cfg(feature = "alloc")]
impl RegisterBus for DummyNic {
    fn read_reg(&mut self, reg: u32) -> u32 {
        self.reads += 1;
        match reg {
            EECD => self.eecd.bits(),
            EERD => self.eerd,
            EEWR if self.config.eerd_stuck => 0,
            EEWR => NVM_RW_REG_DONE,
            _ => self.regs.get(&reg).copied().unwrap_or(0),
        }
    }

    fn write_reg(&mut self, reg: u32, value: u32) {
        self.writes += 1;
        match reg {
            EECD => self.write_eecd(value),
            EERD => self.write_eerd(value),
            EEWR => self.write_eewr(value),
            CTRL_EXT => self.write_ctrl_ext(value),
            _ => {
                self.regs.insert(reg, value);
            }
        }
    }

    fn delay_us(&mut self, us: u32) {
        // No real delay needed for in-memory operations
        self.delay_us += u64::from(us);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nicnvm_core::nvm::{EerdEeprom, NoOpNvm, NvmDevice, NvmOps, SpiEeprom};
    use nicnvm_core::protected::{BlockDescriptor, BlockType, ProtectedBlock};
    use nicnvm_core::regs::{NVM_CHECKSUM_REG, NVM_PBA_PTR_GUARD, NVM_SUM};
    use nicnvm_core::{checksum, Error};

    const VENDOR: BlockType = BlockType::from_bits_retain(1 << 8);

    fn pattern() -> Vec<u16> {
        (0..256u16).map(|i| i.wrapping_mul(0x0101) ^ 0x5A00).collect()
    }

    fn device<O: NvmOps>(nic: DummyNic, ops: O) -> NvmDevice<DummyNic, O> {
        let mut dev = NvmDevice::new(nic, NvmInfo::default(), ops);
        dev.init_params().unwrap();
        dev.bus_mut().reset_counters();
        dev
    }

    fn spi_device(words: &[u16]) -> NvmDevice<DummyNic, SpiEeprom> {
        device(DummyNic::with_words(DummyConfig::default(), words), SpiEeprom)
    }

    #[test]
    fn test_detects_geometry() {
        let dev = spi_device(&pattern());
        assert_eq!(dev.info().word_size, 256);
        assert_eq!(dev.info().address_bits, 8);
        assert_eq!(dev.info().page_size, 8);

        let wide = DummyConfig::for_word_size(4096).unwrap();
        assert_eq!(wide.nvm_info().word_size, 4096);
        assert_eq!(wide.nvm_info().address_bits, 16);
        assert!(DummyConfig::for_word_size(100).is_none());
        assert!(DummyConfig::for_word_size(32).is_none());
    }

    #[test]
    fn test_spi_read() {
        let words = pattern();
        let mut dev = spi_device(&words);

        let mut data = [0u16; 5];
        dev.read(10, &mut data).unwrap();
        assert_eq!(&data[..], &words[10..15]);

        // Arbitration is released afterwards
        let eecd = Eecd::from_bits_retain(dev.bus_mut().read_reg(EECD));
        assert!(!eecd.contains(Eecd::REQ));
    }

    #[test]
    fn test_spi_write_read_back() {
        let mut dev = spi_device(&pattern());
        let data = [0x1234, 0xABCD, 0x0F0F];
        dev.write(4, &data).unwrap();

        let mut back = [0u16; 3];
        dev.read(4, &mut back).unwrap();
        assert_eq!(back, data);
        assert_eq!(dev.bus().word(3), pattern()[3]);
        assert_eq!(dev.bus().word(7), pattern()[7]);
    }

    #[test]
    fn test_spi_write_splits_at_page_boundaries() {
        let mut dev = spi_device(&pattern());
        let data = [0x1111, 0x2222, 0x3333, 0x4444, 0x5555, 0x6666, 0x7777];

        // 8-byte pages hold 4 words: words 2..4, 4..8, 8..9
        dev.write(2, &data).unwrap();
        assert_eq!(dev.bus().eeprom().commits(), 3);
        assert_eq!(&dev.bus().words()[2..9], &data[..]);
        assert_eq!(dev.bus().word(1), pattern()[1]);
        assert_eq!(dev.bus().word(9), pattern()[9]);
    }

    #[test]
    fn test_spi_a8_addressing() {
        let words = pattern();
        let mut dev = spi_device(&words);

        let mut data = [0u16; 4];
        dev.read(126, &mut data).unwrap();
        assert_eq!(&data[..], &words[126..130]);

        // Crosses byte address 0x100, so the second page needs A8
        dev.write(126, &[0xA0A0, 0xA1A1, 0xA2A2, 0xA3A3]).unwrap();
        assert_eq!(&dev.bus().words()[126..130], &[0xA0A0, 0xA1A1, 0xA2A2, 0xA3A3]);
        // The low half of the array is not aliased
        assert_eq!(dev.bus().word(0), words[0]);
        assert_eq!(dev.bus().word(1), words[1]);
    }

    #[test]
    fn test_spi_last_word() {
        let mut dev = spi_device(&pattern());
        dev.write(255, &[0xBEEF]).unwrap();
        let mut data = [0u16; 1];
        dev.read(255, &mut data).unwrap();
        assert_eq!(data, [0xBEEF]);
    }

    #[test]
    fn test_grant_timeout() {
        let mut nic = DummyNic::with_words(DummyConfig::default(), &pattern());
        nic.set_grant(false);
        let mut dev = device(nic, SpiEeprom);

        let mut data = [0u16; 2];
        assert_eq!(dev.read(0, &mut data), Err(Error::Timeout));
        assert_eq!(data, [0, 0]);
        assert_eq!(dev.bus().total_delay_us(), 1000 * 5);

        let eecd = Eecd::from_bits_retain(dev.bus_mut().read_reg(EECD));
        assert!(!eecd.contains(Eecd::REQ));
    }

    #[test]
    fn test_busy_timeout_releases_bus() {
        let mut dev = spi_device(&pattern());
        dev.bus_mut().set_busy_polls(u32::MAX);

        // The first page commits; the part never becomes ready for the second
        let result = dev.write(2, &[1, 2, 3, 4]);
        assert_eq!(result, Err(Error::Timeout));
        assert_eq!(dev.bus().eeprom().commits(), 1);
        let words = dev.bus().words();
        assert_eq!(&words[2..4], &[1, 2]);
        assert_eq!(&words[4..6], &pattern()[4..6]);

        let eecd = Eecd::from_bits_retain(dev.bus_mut().read_reg(EECD));
        assert!(!eecd.contains(Eecd::REQ));
        assert!(eecd.contains(Eecd::CS));
    }

    #[test]
    fn test_bounds_rejected_without_bus_activity() {
        let mut dev = spi_device(&pattern());
        let mut data = [0u16; 2];

        assert_eq!(dev.read(255, &mut data), Err(Error::InvalidArgument));
        assert_eq!(dev.read(256, &mut data[..1]), Err(Error::InvalidArgument));
        assert_eq!(dev.read(0, &mut []), Err(Error::InvalidArgument));
        assert_eq!(dev.write(250, &[0; 7]), Err(Error::InvalidArgument));

        assert_eq!(dev.bus().reg_reads(), 0);
        assert_eq!(dev.bus().reg_writes(), 0);
    }

    #[test]
    fn test_spi_checksum() {
        let mut dev = spi_device(&pattern());
        assert_eq!(dev.validate_checksum(), Err(Error::ChecksumMismatch));

        dev.update_checksum().unwrap();
        dev.validate_checksum().unwrap();

        let words = dev.bus().words();
        assert_eq!(
            checksum::sum_words(&words[..=NVM_CHECKSUM_REG as usize]),
            NVM_SUM
        );
        // Nothing past the checksum word changed
        assert_eq!(&words[0x40..], &pattern()[0x40..]);
    }

    #[test]
    fn test_eerd_round_trip_and_checksum() {
        let nic = DummyNic::with_words(DummyConfig::default(), &pattern());
        let mut dev = device(nic, EerdEeprom);

        dev.write(0x30, &[0xCAFE, 0xF00D]).unwrap();
        let mut data = [0u16; 2];
        dev.read(0x30, &mut data).unwrap();
        assert_eq!(data, [0xCAFE, 0xF00D]);

        dev.update_checksum().unwrap();
        dev.validate_checksum().unwrap();
    }

    #[test]
    fn test_eerd_timeout() {
        let mut nic = DummyNic::with_words(DummyConfig::default(), &pattern());
        nic.set_eerd_stuck(true);
        let mut dev = device(nic, EerdEeprom);

        let mut data = [0u16; 1];
        assert_eq!(dev.read(0, &mut data), Err(Error::Timeout));
        assert_eq!(dev.write(0, &[1]), Err(Error::Timeout));
        assert_eq!(dev.bus().word(0), pattern()[0]);
    }

    #[test]
    fn test_noop_table_leaves_image() {
        let nic = DummyNic::with_words(DummyConfig::default(), &pattern());
        let mut dev = NvmDevice::new(nic, NvmInfo::default(), NoOpNvm);
        dev.init_params().unwrap();
        assert_eq!(dev.info().word_size, 0);

        dev.write(0, &[0; 4]).unwrap();
        dev.update_checksum().unwrap();
        assert_eq!(dev.bus().words(), pattern());
    }

    #[test]
    fn test_mac_address_and_reload() {
        let mut words = pattern();
        words[..3].copy_from_slice(&[0x1B00, 0xAA21, 0xCCBB]);
        let mut dev = spi_device(&words);

        assert_eq!(
            dev.read_mac_address().unwrap(),
            [0x00, 0x1B, 0x21, 0xAA, 0xBB, 0xCC]
        );
        assert_eq!(dev.mac().perm_addr, dev.mac().addr);

        // New address only shows up after a reload
        dev.write(0, &[0x2200, 0x6644]).unwrap();
        assert_eq!(dev.read_mac_address().unwrap()[..2], [0x00, 0x1B]);
        dev.reload();
        assert_eq!(
            dev.read_mac_address().unwrap(),
            [0x00, 0x22, 0x44, 0x66, 0xBB, 0xCC]
        );
    }

    #[test]
    fn test_pba_layouts() {
        let mut words = pattern();
        words[8] = 0x1234;
        words[9] = 0x5678;
        let mut dev = spi_device(&words);
        assert_eq!(dev.read_pba_length(), Ok(11));
        assert_eq!(dev.pba_string().unwrap(), "123456-078");

        words[8] = NVM_PBA_PTR_GUARD;
        words[9] = 0x60;
        words[0x60] = 6;
        for (i, pair) in b"G12345-678".chunks(2).enumerate() {
            words[0x61 + i] = u16::from_be_bytes([pair[0], pair[1]]);
        }
        let mut dev = spi_device(&words);
        assert_eq!(dev.read_pba_length(), Ok(11));
        assert_eq!(dev.pba_string().unwrap(), "G12345-678");

        let mut small = [0u8; 10];
        assert_eq!(dev.read_pba_string(&mut small), Err(Error::NoSpace));
    }

    #[test]
    fn test_led_default() {
        let mut words = pattern();
        words[4] = 0xFFFF;
        let mut dev = spi_device(&words);
        assert_eq!(dev.valid_led_default(), Ok(0x8911));
    }

    #[test]
    fn test_masked_block_write_on_device() {
        let mut dev = spi_device(&pattern());
        let mut data = [0x1234u16, 0x5678];
        let desc = BlockDescriptor::direct(VENDOR, 0x30, 2).with_mask(0x00FF);
        dev.write_protected_block(&ProtectedBlock::new(desc, &mut data), None)
            .unwrap();

        let before = pattern();
        assert_eq!(dev.bus().word(0x30), (before[0x30] & 0xFF00) | 0x34);
        assert_eq!(dev.bus().word(0x31), (before[0x31] & 0xFF00) | 0x78);
        assert_eq!(dev.bus().word(0x32), before[0x32]);
    }

    #[test]
    fn test_pointed_blocks_on_device() {
        let mut words = pattern();
        words[0x3D] = 0x80;
        words[0x81] = 8; // 4 words
        words[0x3E] = 0xFFFF;
        let mut dev = spi_device(&words);

        let table = [
            BlockDescriptor::pointed(BlockType::ISCSI_BOOT_CONFIG, 0x3D, 0),
            BlockDescriptor::pointed(BlockType::ISCSI_BOOT_CONFIG, 0x3E, 0),
            BlockDescriptor::direct(VENDOR, 0x30, 2),
        ];
        let mut found = [BlockDescriptor::direct(VENDOR, 0, 0); 3];
        let n = dev
            .get_protected_blocks_from_table(
                &table,
                BlockType::ISCSI_BOOT_CONFIG,
                Some(&mut found),
                None,
            )
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(found[0].block_size, 4);

        let mut buf = [0u16; 4];
        let mut blocks = [ProtectedBlock::new(found[0], &mut buf)];
        dev.read_protected_blocks(&mut blocks, None).unwrap();
        assert_eq!(buf, [words[0x80], 8, words[0x82], words[0x83]]);

        let mut data = [0u16; 1];
        let unallocated = BlockDescriptor::pointed(VENDOR, 0x3E, 0).with_size(1);
        assert_eq!(
            dev.write_protected_block(&ProtectedBlock::new(unallocated, &mut data), None),
            Err(Error::RecordUnallocated)
        );
    }

    #[test]
    fn test_snapshot_writes_leave_device_untouched() {
        let mut dev = spi_device(&pattern());
        let mut image = dev.bus().words();
        let mut data = [0xFFFFu16; 2];
        let desc = BlockDescriptor::direct(VENDOR, 0x30, 2).with_mask(0x0F00);
        let blocks = [ProtectedBlock::new(desc, &mut data)];

        dev.bus_mut().reset_counters();
        dev.write_protected_blocks(&blocks, Some(image.as_mut_slice()))
            .unwrap();

        assert_eq!(image[0x30], pattern()[0x30] | 0x0F00);
        assert_eq!(dev.bus().words(), pattern());
        assert_eq!(dev.bus().reg_writes(), 0);
    }
}
