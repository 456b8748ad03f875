//! EECD line-level primitives
//!
//! Each helper reads or writes the EECD register and waits the configured
//! half-period after every edge. Data is shifted most-significant bit
//! first in both directions.

use crate::bus::RegisterBus;
use crate::error::{Error, Result};
use crate::nvm::{NvmInfo, NvmType};
use crate::regs::{
    Eecd, EECD, NVM_MAX_RETRY_SPI, NVM_RDSR_OPCODE_SPI, NVM_STATUS_RDY_SPI, POLL_INTERVAL_US,
};

/// Bit-bang driver over the EECD register
pub struct EecdBitbang<'a> {
    bus: &'a mut dyn RegisterBus,
    info: NvmInfo,
}

impl<'a> EecdBitbang<'a> {
    /// Create a driver for the part described by `info`
    pub fn new(bus: &'a mut dyn RegisterBus, info: &NvmInfo) -> Self {
        Self { bus, info: *info }
    }

    fn is_spi(&self) -> bool {
        self.info.nvm_type == NvmType::EepromSpi
    }

    fn delay(&mut self) {
        self.bus.delay_us(u32::from(self.info.delay_usec));
    }

    /// Read the EECD register
    pub fn read_eecd(&mut self) -> Eecd {
        Eecd::from_bits_retain(self.bus.read_reg(EECD))
    }

    /// Write the EECD register
    pub fn write_eecd(&mut self, eecd: Eecd) {
        self.bus.write_reg(EECD, eecd.bits());
    }

    fn write_eecd_flush(&mut self, eecd: Eecd) {
        self.write_eecd(eecd);
        self.bus.flush();
    }

    /// Raise the EEPROM clock
    pub fn raise_clk(&mut self, eecd: &mut Eecd) {
        eecd.insert(Eecd::SK);
        self.write_eecd_flush(*eecd);
        self.delay();
    }

    /// Lower the EEPROM clock
    pub fn lower_clk(&mut self, eecd: &mut Eecd) {
        eecd.remove(Eecd::SK);
        self.write_eecd_flush(*eecd);
        self.delay();
    }

    /// Shift the low `count` bits of `data` out to the EEPROM
    pub fn shift_out(&mut self, data: u16, count: u16) {
        if count == 0 {
            return;
        }

        let mut eecd = self.read_eecd();
        if self.is_spi() {
            eecd.insert(Eecd::DO);
        }

        let mut mask = 1u32 << (count - 1);
        while mask != 0 {
            eecd.set(Eecd::DI, u32::from(data) & mask != 0);
            self.write_eecd_flush(eecd);
            self.delay();

            self.raise_clk(&mut eecd);
            self.lower_clk(&mut eecd);

            mask >>= 1;
        }

        eecd.remove(Eecd::DI);
        self.write_eecd(eecd);
    }

    /// Shift `count` bits in from the EEPROM
    ///
    /// DI is held low while the part drives DO.
    pub fn shift_in(&mut self, count: u16) -> u16 {
        let mut eecd = self.read_eecd();
        eecd.remove(Eecd::DO | Eecd::DI);

        let mut data = 0u16;
        for _ in 0..count {
            data <<= 1;
            self.raise_clk(&mut eecd);

            eecd = self.read_eecd();
            eecd.remove(Eecd::DI);
            if eecd.contains(Eecd::DO) {
                data |= 1;
            }

            self.lower_clk(&mut eecd);
        }
        data
    }

    /// Return the EEPROM to standby
    ///
    /// Toggles chip select so the part latches (or discards) the current
    /// command before the next one.
    pub fn standby(&mut self) {
        if !self.is_spi() {
            return;
        }
        let mut eecd = self.read_eecd();

        eecd.insert(Eecd::CS);
        self.write_eecd_flush(eecd);
        self.delay();

        eecd.remove(Eecd::CS);
        self.write_eecd_flush(eecd);
        self.delay();
    }

    /// Terminate the current command by deselecting the part
    pub fn stop(&mut self) {
        let mut eecd = self.read_eecd();
        if self.is_spi() {
            eecd.insert(Eecd::CS);
            self.lower_clk(&mut eecd);
        }
    }

    /// Select the part and wait until it reports ready
    ///
    /// Polls the status register until its ready bit clears, going back
    /// to standby between attempts.
    pub fn ready(&mut self) -> Result<()> {
        if !self.is_spi() {
            return Ok(());
        }

        let mut eecd = self.read_eecd();
        eecd.remove(Eecd::CS | Eecd::SK);
        self.write_eecd_flush(eecd);
        self.bus.delay_us(1);

        for _ in 0..NVM_MAX_RETRY_SPI {
            self.shift_out(u16::from(NVM_RDSR_OPCODE_SPI), self.info.opcode_bits);
            let status = self.shift_in(8) as u8;
            if status & NVM_STATUS_RDY_SPI == 0 {
                return Ok(());
            }

            self.bus.delay_us(POLL_INTERVAL_US);
            self.standby();
        }

        log::debug!("SPI NVM status error: part stayed busy");
        Err(Error::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeBus;

    #[test]
    fn test_shift_out_msb_first() {
        let mut bus = FakeBus::new(&[0; 64]);
        let info = NvmInfo::spi(64, 8, 8);
        EecdBitbang::new(&mut bus, &info).shift_out(0b1010_0001, 8);

        // One DI sample per rising clock edge
        assert_eq!(
            bus.rising_edge_di(),
            &[true, false, true, false, false, false, false, true][..]
        );
    }

    #[test]
    fn test_shift_in_samples_after_rising_edge() {
        let mut bus = FakeBus::new(&[0; 64]);
        bus.set_do_pattern(&[true, true, false, true]);
        let info = NvmInfo::spi(64, 8, 8);
        let value = EecdBitbang::new(&mut bus, &info).shift_in(4);
        assert_eq!(value, 0b1101);
    }

    #[test]
    fn test_standby_is_noop_for_non_spi() {
        let mut bus = FakeBus::new(&[0; 64]);
        let mut info = NvmInfo::spi(64, 8, 8);
        info.nvm_type = NvmType::EepromMicrowire;
        EecdBitbang::new(&mut bus, &info).standby();
        assert_eq!(bus.writes(), 0);
    }
}
