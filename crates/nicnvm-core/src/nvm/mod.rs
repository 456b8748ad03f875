//! NVM operation table and device context
//!
//! This module ties the engine together:
//!
//! - [`NvmInfo`] describes the part (size, addressing, paging, timing)
//! - [`NvmHw`] is the per-call device context handed to every operation
//! - [`NvmOps`] is the operation table; one implementation per controller
//!   family is bound when the device is constructed
//! - [`NvmDevice`] owns the bus, the descriptor and the bound table and is
//!   the entry point used by a driver

mod device;
mod info;
mod ops;

pub use crate::eerd::EerdEeprom;
pub use crate::spi::SpiEeprom;
pub use device::{MacAddresses, NvmDevice};
pub use info::{NvmInfo, NvmType};
pub use ops::{NoOpNvm, NvmOps};

use crate::bus::RegisterBus;
use crate::error::{Error, Result};

/// Device context passed into every operation-table call
///
/// Borrows the register bus and the NVM descriptor for the duration of one
/// call. Operations hold no state of their own beyond what lives here.
pub struct NvmHw<'a> {
    /// Register access and delays
    pub bus: &'a mut dyn RegisterBus,
    /// Descriptor of the attached part
    pub nvm: &'a mut NvmInfo,
}

impl<'a> NvmHw<'a> {
    /// Create a context from its parts
    pub fn new(bus: &'a mut dyn RegisterBus, nvm: &'a mut NvmInfo) -> Self {
        Self { bus, nvm }
    }
}

/// Reject word accesses that fall outside the part
///
/// Fails if `offset` is past the end, `words` is zero, or the range runs
/// past the last word.
pub fn check_bounds(nvm: &NvmInfo, offset: u16, words: usize) -> Result<()> {
    if offset >= nvm.word_size || words == 0 || words > usize::from(nvm.word_size - offset) {
        log::debug!(
            "nvm parameter(s) out of bounds: offset {:#x}, {} words, size {}",
            offset,
            words,
            nvm.word_size
        );
        return Err(Error::InvalidArgument);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let nvm = NvmInfo::spi(64, 8, 8);
        assert!(check_bounds(&nvm, 0, 64).is_ok());
        assert!(check_bounds(&nvm, 63, 1).is_ok());
        assert_eq!(check_bounds(&nvm, 64, 1), Err(Error::InvalidArgument));
        assert_eq!(check_bounds(&nvm, 0, 0), Err(Error::InvalidArgument));
        assert_eq!(check_bounds(&nvm, 60, 5), Err(Error::InvalidArgument));
    }
}
