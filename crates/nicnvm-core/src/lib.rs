//! nicnvm-core - NVM access layer for network interface controllers
//!
//! This crate drives the serial EEPROM that sits behind a NIC's register
//! file. It is designed to be `no_std` compatible so it can run inside
//! firmware or a kernel driver as well as in host tooling.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`), plus TOML
//!   parsing of protected-block tables
//! - `alloc` - Enable boxed register buses and owned PBA strings
//!
//! # Example
//!
//! ```ignore
//! use nicnvm_core::nvm::{NvmDevice, NvmInfo, SpiEeprom};
//!
//! fn check<B: nicnvm_core::RegisterBus>(bus: B) -> nicnvm_core::Result<()> {
//!     let mut dev = NvmDevice::new(bus, NvmInfo::default(), SpiEeprom);
//!     dev.init_params()?;
//!     dev.validate_checksum()?;
//!     let mut pba = [0u8; 32];
//!     let len = dev.read_pba_string(&mut pba)?;
//!     println!("PBA: {}", core::str::from_utf8(&pba[..len]).unwrap_or("?"));
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod bus;
pub mod checksum;
pub mod derived;
pub mod eerd;
pub mod error;
pub mod nvm;
pub mod protected;
pub mod regs;
pub mod spi;

#[cfg(test)]
mod testutil;

pub use bus::RegisterBus;
pub use error::{Error, Result};
