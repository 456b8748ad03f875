//! Controller register definitions
//!
//! Register offsets and bit definitions for the EEPROM interface of the
//! gigabit controller family, plus the fixed NVM word layout.
//!
//! # Register groups
//!
//! - EECD: direct EEPROM control (bit-banged lines and arbitration)
//! - EERD/EEWR: register-polled word access
//! - RAL/RAH: receive address registers loaded from NVM at reset

use bitflags::bitflags;

// ============================================================================
// Register offsets
// ============================================================================

/// Device Status register (read to flush posted writes)
pub const STATUS: u32 = 0x0_0008;
/// EEPROM/Flash Control register
pub const EECD: u32 = 0x0_0010;
/// EEPROM Read register
pub const EERD: u32 = 0x0_0014;
/// Extended Device Control register
pub const CTRL_EXT: u32 = 0x0_0018;
/// EEPROM Write register
pub const EEWR: u32 = 0x0_102C;

/// Receive Address Low register for slot `n`
pub const fn ral(n: u32) -> u32 {
    0x0_5400 + n * 8
}

/// Receive Address High register for slot `n`
pub const fn rah(n: u32) -> u32 {
    0x0_5404 + n * 8
}

/// Number of MAC address bytes held in RAL
pub const RAL_MAC_ADDR_LEN: usize = 4;
/// Number of MAC address bytes held in RAH
pub const RAH_MAC_ADDR_LEN: usize = 2;
/// Ethernet address length
pub const ETH_ADDR_LEN: usize = 6;

bitflags! {
    /// EECD register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Eecd: u32 {
        /// EEPROM clock
        const SK = 1 << 0;
        /// EEPROM chip select (set = deselected on SPI parts)
        const CS = 1 << 1;
        /// EEPROM data in (host to EEPROM)
        const DI = 1 << 2;
        /// EEPROM data out (EEPROM to host)
        const DO = 1 << 3;
        /// Software access request
        const REQ = 1 << 6;
        /// Software access grant
        const GNT = 1 << 7;
        /// EEPROM present
        const PRES = 1 << 8;
        /// Address width strap (set = 16-bit SPI addressing)
        const ADDR_BITS = 1 << 10;

        // Preserve bits this crate doesn't model
        const _ = !0;
    }
}

/// EECD size field mask
pub const EECD_SIZE_EX_MASK: u32 = 0x0000_7800;
/// EECD size field shift
pub const EECD_SIZE_EX_SHIFT: u32 = 11;
/// Base shift added to the EECD size field to get the word-size exponent
pub const NVM_WORD_SIZE_BASE_SHIFT: u32 = 6;
/// Largest supported word-size exponent
pub const NVM_WORD_SIZE_MAX_SHIFT: u32 = 14;

// EERD/EEWR fields
/// Start a register-polled access
pub const NVM_RW_REG_START: u32 = 1 << 0;
/// Register-polled access completed
pub const NVM_RW_REG_DONE: u32 = 1 << 1;
/// Word address field shift
pub const NVM_RW_ADDR_SHIFT: u32 = 2;
/// Data field shift
pub const NVM_RW_REG_DATA: u32 = 16;

/// CTRL_EXT: reinitialize from EEPROM
pub const CTRL_EXT_EE_RST: u32 = 1 << 13;

// ============================================================================
// SPI EEPROM protocol
// ============================================================================

/// Read data from memory array
pub const NVM_READ_OPCODE_SPI: u8 = 0x03;
/// Write data to memory array
pub const NVM_WRITE_OPCODE_SPI: u8 = 0x02;
/// Address bit 8 folded into the opcode on 8-bit address parts
pub const NVM_A8_OPCODE_SPI: u8 = 0x08;
/// Set write enable latch
pub const NVM_WREN_OPCODE_SPI: u8 = 0x06;
/// Read status register
pub const NVM_RDSR_OPCODE_SPI: u8 = 0x05;
/// Status register: write cycle in progress
pub const NVM_STATUS_RDY_SPI: u8 = 0x01;

// ============================================================================
// Polling budgets (each attempt waits 5 us)
// ============================================================================

/// Delay between polling attempts
pub const POLL_INTERVAL_US: u32 = 5;
/// Attempts to obtain the EECD grant
pub const NVM_GRANT_ATTEMPTS: u32 = 1000;
/// Attempts to see the SPI status register report ready
pub const NVM_MAX_RETRY_SPI: u32 = 5000;
/// Attempts to see EERD/EEWR report done
pub const NVM_RW_ATTEMPTS: u32 = 100_000;
/// Settle time after a SPI write sequence
pub const NVM_WRITE_SETTLE_MS: u32 = 10;

// ============================================================================
// NVM word layout
// ============================================================================

/// ID LED settings word
pub const NVM_ID_LED_SETTINGS: u16 = 0x0004;
/// First PBA word
pub const NVM_PBA_OFFSET_0: u16 = 0x0008;
/// Second PBA word (or pointer to the PBA string section)
pub const NVM_PBA_OFFSET_1: u16 = 0x0009;
/// First PBA word value marking the string layout
pub const NVM_PBA_PTR_GUARD: u16 = 0xFAFA;
/// Checksum word; the checksum region is `[0, NVM_CHECKSUM_REG]`
pub const NVM_CHECKSUM_REG: u16 = 0x003F;
/// Target sum of the checksum region
pub const NVM_SUM: u16 = 0xBABA;

/// ID LED word value that means "use the default"
pub const ID_LED_RESERVED_0000: u16 = 0x0000;
/// ID LED word value that means "use the default"
pub const ID_LED_RESERVED_FFFF: u16 = 0xFFFF;
/// Default ID LED configuration
pub const ID_LED_DEFAULT: u16 = 0x8911;

/// Pointer word value meaning "not allocated"
pub const NVM_POINTER_UNALLOCATED: u16 = 0xFFFF;
/// Word offset of the size field inside an iSCSI module structure
pub const ISCSI_BLOCK_SIZE_WORD_OFFSET: u16 = 0x0001;
