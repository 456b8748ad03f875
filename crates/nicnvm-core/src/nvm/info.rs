//! NVM part descriptor

use crate::regs::{
    Eecd, EECD_SIZE_EX_MASK, EECD_SIZE_EX_SHIFT, NVM_WORD_SIZE_BASE_SHIFT,
    NVM_WORD_SIZE_MAX_SHIFT,
};

/// Kind of non-volatile memory behind the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NvmType {
    /// No NVM attached (or not yet detected)
    #[default]
    None,
    /// SPI serial EEPROM
    EepromSpi,
    /// Microwire serial EEPROM
    EepromMicrowire,
    /// Flash part
    Flash,
}

/// Per-device NVM configuration
///
/// Filled in once at device initialization and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NvmInfo {
    /// Total addressable 16-bit words
    pub word_size: u16,
    /// Width of the address sent after the opcode
    pub address_bits: u16,
    /// Width of the opcode
    pub opcode_bits: u16,
    /// Bytes per write page; 0 means writes are never split
    pub page_size: u16,
    /// Clock half-period in microseconds
    pub delay_usec: u16,
    /// Kind of part
    pub nvm_type: NvmType,
}

impl NvmInfo {
    /// Describe a SPI EEPROM with 8-bit opcodes and a 1 us clock half-period
    pub const fn spi(word_size: u16, address_bits: u16, page_size: u16) -> Self {
        Self {
            word_size,
            address_bits,
            opcode_bits: 8,
            page_size,
            delay_usec: 1,
            nvm_type: NvmType::EepromSpi,
        }
    }

    /// Derive the SPI EEPROM geometry from the EECD strapping bits
    ///
    /// The address-width strap selects 16-bit addressing with 32-byte pages
    /// (otherwise 8-bit addressing with 8-byte pages), and the size field
    /// gives the word-size exponent relative to 64 words.
    pub fn spi_from_eecd(eecd: u32) -> Self {
        let wide = Eecd::from_bits_retain(eecd).contains(Eecd::ADDR_BITS);
        let (address_bits, page_size) = if wide { (16, 32) } else { (8, 8) };

        let size_ex = (eecd & EECD_SIZE_EX_MASK) >> EECD_SIZE_EX_SHIFT;
        let shift = (size_ex + NVM_WORD_SIZE_BASE_SHIFT).min(NVM_WORD_SIZE_MAX_SHIFT);

        Self::spi(1 << shift, address_bits, page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spi_from_eecd_small() {
        let info = NvmInfo::spi_from_eecd(0);
        assert_eq!(info.word_size, 64);
        assert_eq!(info.address_bits, 8);
        assert_eq!(info.page_size, 8);
        assert_eq!(info.opcode_bits, 8);
        assert_eq!(info.nvm_type, NvmType::EepromSpi);
    }

    #[test]
    fn test_spi_from_eecd_wide() {
        // size field 2 -> 256 words, 16-bit addressing
        let eecd = Eecd::ADDR_BITS.bits() | (2 << EECD_SIZE_EX_SHIFT);
        let info = NvmInfo::spi_from_eecd(eecd);
        assert_eq!(info.word_size, 256);
        assert_eq!(info.address_bits, 16);
        assert_eq!(info.page_size, 32);
    }

    #[test]
    fn test_spi_from_eecd_capped() {
        let info = NvmInfo::spi_from_eecd(EECD_SIZE_EX_MASK);
        assert_eq!(info.word_size, 1 << 14);
    }
}
