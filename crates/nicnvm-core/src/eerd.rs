//! Register-polled NVM access
//!
//! Later controllers put a word-access engine in front of the EEPROM. The
//! host writes a request (word address plus START) to EERD or EEWR and
//! polls the same register until the DONE flag appears; for reads the
//! word is then in the upper half of EERD. The engine serializes access on
//! its own, so no request/grant handshake is needed on this path.

use crate::bus::RegisterBus;
use crate::error::{Error, Result};
use crate::nvm::{check_bounds, NvmHw, NvmInfo, NvmOps};
use crate::regs::{
    EECD, EERD, EEWR, NVM_RW_ADDR_SHIFT, NVM_RW_ATTEMPTS, NVM_RW_REG_DATA, NVM_RW_REG_DONE,
    NVM_RW_REG_START, POLL_INTERVAL_US,
};

/// Which access register to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollReg {
    /// EERD
    Read,
    /// EEWR
    Write,
}

impl PollReg {
    fn reg(self) -> u32 {
        match self {
            Self::Read => EERD,
            Self::Write => EEWR,
        }
    }
}

/// Wait for the DONE flag of EERD or EEWR
pub fn poll_eerd_eewr_done(bus: &mut dyn RegisterBus, which: PollReg) -> Result<()> {
    for _ in 0..NVM_RW_ATTEMPTS {
        if bus.read_reg(which.reg()) & NVM_RW_REG_DONE != 0 {
            return Ok(());
        }
        bus.delay_us(POLL_INTERVAL_US);
    }

    log::debug!("{:?} access never completed", which);
    Err(Error::Timeout)
}

fn request(offset: u16, index: usize) -> u32 {
    ((u32::from(offset) + index as u32) << NVM_RW_ADDR_SHIFT) | NVM_RW_REG_START
}

/// Read words through EERD, one request per word
///
/// A timeout on any word aborts the remaining words.
pub fn read_nvm_eerd(hw: &mut NvmHw<'_>, offset: u16, data: &mut [u16]) -> Result<()> {
    check_bounds(hw.nvm, offset, data.len())?;

    for (i, word) in data.iter_mut().enumerate() {
        hw.bus.write_reg(EERD, request(offset, i));
        poll_eerd_eewr_done(&mut *hw.bus, PollReg::Read)?;
        *word = (hw.bus.read_reg(EERD) >> NVM_RW_REG_DATA) as u16;
    }

    log::trace!("EERD read {} words at {:#x}", data.len(), offset);
    Ok(())
}

/// Write words through EEWR, one request per word
///
/// Waits for the engine to be idle before each request and for DONE after
/// it. The checksum is not updated.
pub fn write_nvm_eewr(hw: &mut NvmHw<'_>, offset: u16, data: &[u16]) -> Result<()> {
    check_bounds(hw.nvm, offset, data.len())?;

    for (i, &word) in data.iter().enumerate() {
        let eewr = (u32::from(word) << NVM_RW_REG_DATA) | request(offset, i);

        poll_eerd_eewr_done(&mut *hw.bus, PollReg::Write)?;
        hw.bus.write_reg(EEWR, eewr);
        poll_eerd_eewr_done(&mut *hw.bus, PollReg::Write)?;
    }

    log::trace!("EEWR wrote {} words at {:#x}", data.len(), offset);
    Ok(())
}

/// Operation table for controllers with the EERD/EEWR engine
#[derive(Debug, Clone, Copy, Default)]
pub struct EerdEeprom;

impl NvmOps for EerdEeprom {
    fn init_params(&self, hw: &mut NvmHw<'_>) -> Result<()> {
        *hw.nvm = NvmInfo::spi_from_eecd(hw.bus.read_reg(EECD));
        Ok(())
    }

    fn acquire(&self, _hw: &mut NvmHw<'_>) -> Result<()> {
        Ok(())
    }

    fn release(&self, _hw: &mut NvmHw<'_>) {}

    fn read(&self, hw: &mut NvmHw<'_>, offset: u16, data: &mut [u16]) -> Result<()> {
        read_nvm_eerd(hw, offset, data)
    }

    fn write(&self, hw: &mut NvmHw<'_>, offset: u16, data: &[u16]) -> Result<()> {
        write_nvm_eewr(hw, offset, data)
    }
}
