//! EEPROM bus arbitration
//!
//! Firmware and host share the EEPROM wires. The host raises the request
//! bit in EECD and may only drive the bus once the controller answers with
//! the grant bit.

use super::EecdBitbang;
use crate::error::{Error, Result};
use crate::nvm::NvmHw;
use crate::regs::{Eecd, EECD, NVM_GRANT_ATTEMPTS, POLL_INTERVAL_US};

/// Request the EEPROM bus and wait for the grant
///
/// On timeout the request bit is withdrawn before returning
/// [`Error::Timeout`], so a failed acquire needs no release.
pub fn acquire_nvm(hw: &mut NvmHw<'_>) -> Result<()> {
    let bus = &mut *hw.bus;

    let eecd = bus.read_reg(EECD);
    bus.write_reg(EECD, eecd | Eecd::REQ.bits());

    let mut eecd = Eecd::from_bits_retain(bus.read_reg(EECD));
    let mut attempts = NVM_GRANT_ATTEMPTS;
    while attempts > 0 {
        if eecd.contains(Eecd::GNT) {
            return Ok(());
        }
        bus.delay_us(POLL_INTERVAL_US);
        eecd = Eecd::from_bits_retain(bus.read_reg(EECD));
        attempts -= 1;
    }

    eecd.remove(Eecd::REQ);
    bus.write_reg(EECD, eecd.bits());
    log::debug!("could not acquire NVM grant");
    Err(Error::Timeout)
}

/// Stop any command in flight and drop the bus request
pub fn release_nvm(hw: &mut NvmHw<'_>) {
    let mut lines = EecdBitbang::new(&mut *hw.bus, hw.nvm);
    lines.stop();

    let mut eecd = lines.read_eecd();
    eecd.remove(Eecd::REQ);
    lines.write_eecd(eecd);
}
