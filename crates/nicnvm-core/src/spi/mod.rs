//! Bit-banged SPI EEPROM access
//!
//! Controllers without a hardware word-access engine expose the EEPROM's
//! four wires directly in the EECD register: clock (SK), chip select (CS),
//! data to the part (DI) and data from the part (DO). This module drives
//! those lines one bit at a time.
//!
//! ## Transaction shape
//!
//! ```text
//! Idle -> Selected (ready poll) -> Opcode -> Address -> DataShift... -> Standby/Stop
//! ```
//!
//! - [`arbitration`] owns the request/grant handshake that keeps firmware
//!   off the bus while the host drives it
//! - [`bitbang`] holds the line-level primitives (clock edges, shifting,
//!   standby, stop, status-ready polling)
//! - [`eeprom`] composes those into word read and page write sequences and
//!   provides the [`SpiEeprom`] operation table

pub mod arbitration;
pub mod bitbang;
pub mod eeprom;

pub use arbitration::{acquire_nvm, release_nvm};
pub use bitbang::EecdBitbang;
pub use eeprom::{read_nvm_spi, write_nvm_spi, SpiEeprom};
