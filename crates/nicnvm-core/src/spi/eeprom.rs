//! SPI EEPROM word read and page write sequences

use super::{acquire_nvm, release_nvm, EecdBitbang};
use crate::error::Result;
use crate::nvm::{check_bounds, NvmHw, NvmInfo, NvmOps};
use crate::regs::{
    EECD, NVM_A8_OPCODE_SPI, NVM_READ_OPCODE_SPI, NVM_WREN_OPCODE_SPI, NVM_WRITE_OPCODE_SPI,
    NVM_WRITE_SETTLE_MS,
};

/// Operation table for bit-banged SPI EEPROMs
///
/// Uses the EECD request/grant handshake for arbitration and drives the
/// part directly over the EECD lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpiEeprom;

impl NvmOps for SpiEeprom {
    fn init_params(&self, hw: &mut NvmHw<'_>) -> Result<()> {
        *hw.nvm = NvmInfo::spi_from_eecd(hw.bus.read_reg(EECD));
        log::debug!(
            "SPI NVM: {} words, {} address bits, {}-byte pages",
            hw.nvm.word_size,
            hw.nvm.address_bits,
            hw.nvm.page_size
        );
        Ok(())
    }

    fn acquire(&self, hw: &mut NvmHw<'_>) -> Result<()> {
        acquire_nvm(hw)
    }

    fn release(&self, hw: &mut NvmHw<'_>) {
        release_nvm(hw)
    }

    fn read(&self, hw: &mut NvmHw<'_>, offset: u16, data: &mut [u16]) -> Result<()> {
        read_nvm_spi(self, hw, offset, data)
    }

    fn write(&self, hw: &mut NvmHw<'_>, offset: u16, data: &[u16]) -> Result<()> {
        write_nvm_spi(self, hw, offset, data)
    }
}

/// Opcode with address bit 8 folded in for 8-bit address parts
fn opcode_for(info: &NvmInfo, opcode: u8, offset: u16) -> u16 {
    if info.address_bits == 8 && offset >= 128 {
        u16::from(opcode | NVM_A8_OPCODE_SPI)
    } else {
        u16::from(opcode)
    }
}

/// Read words from a SPI EEPROM
///
/// A single READ command streams every requested word: the part
/// auto-increments its address on each byte. Words arrive high byte
/// first and are swapped into host order. Arbitration is obtained through
/// `ops` so that a family can substitute its own gate.
pub fn read_nvm_spi<O: NvmOps + ?Sized>(
    ops: &O,
    hw: &mut NvmHw<'_>,
    offset: u16,
    data: &mut [u16],
) -> Result<()> {
    check_bounds(hw.nvm, offset, data.len())?;

    ops.acquire(hw)?;
    let result = read_locked(hw, offset, data);
    ops.release(hw);

    result
}

fn read_locked(hw: &mut NvmHw<'_>, offset: u16, data: &mut [u16]) -> Result<()> {
    let info = *hw.nvm;
    let mut lines = EecdBitbang::new(&mut *hw.bus, &info);

    lines.ready()?;
    lines.standby();

    lines.shift_out(opcode_for(&info, NVM_READ_OPCODE_SPI, offset), info.opcode_bits);
    lines.shift_out(offset.wrapping_mul(2), info.address_bits);

    for word in data.iter_mut() {
        *word = lines.shift_in(16).swap_bytes();
    }

    log::trace!("SPI read {} words at {:#x}", data.len(), offset);
    Ok(())
}

/// Write words to a SPI EEPROM
///
/// Data is sent in page-sized bursts: each burst is preceded by a ready
/// poll and a WREN, and ends when the byte address reaches a page boundary
/// or the data runs out. The checksum is not updated.
pub fn write_nvm_spi<O: NvmOps + ?Sized>(
    ops: &O,
    hw: &mut NvmHw<'_>,
    offset: u16,
    data: &[u16],
) -> Result<()> {
    check_bounds(hw.nvm, offset, data.len())?;

    ops.acquire(hw)?;
    let result = write_locked(hw, offset, data);
    ops.release(hw);

    result
}

fn write_locked(hw: &mut NvmHw<'_>, offset: u16, data: &[u16]) -> Result<()> {
    let info = *hw.nvm;
    let mut lines = EecdBitbang::new(&mut *hw.bus, &info);
    let page_size = u32::from(info.page_size);

    let mut widx = 0usize;
    while widx < data.len() {
        lines.ready()?;
        lines.standby();

        lines.shift_out(u16::from(NVM_WREN_OPCODE_SPI), info.opcode_bits);
        lines.standby();

        let start = offset + widx as u16;
        lines.shift_out(opcode_for(&info, NVM_WRITE_OPCODE_SPI, start), info.opcode_bits);
        lines.shift_out(start.wrapping_mul(2), info.address_bits);

        while widx < data.len() {
            lines.shift_out(data[widx].swap_bytes(), 16);
            widx += 1;

            let byte_addr = (u32::from(offset) + widx as u32) * 2;
            if page_size != 0 && byte_addr % page_size == 0 {
                lines.standby();
                break;
            }
        }
        log::trace!("SPI wrote page at {:#x}", start);
    }

    hw.bus.delay_ms(NVM_WRITE_SETTLE_MS);
    Ok(())
}
