//! Operation table trait
//!
//! Every controller family binds exactly one [`NvmOps`] implementation when
//! its [`NvmDevice`](super::NvmDevice) is built. The word-level primitives
//! (`acquire`, `release`, `read`, `write`) are what distinguishes the
//! families; everything layered on top of them (checksum, reload, LED
//! default, protected blocks) ships as a generic provided method that a
//! family may override.

use super::NvmHw;
use crate::checksum;
use crate::derived;
use crate::error::Result;
use crate::protected::{self, BlockDescriptor, DeviceStore, ImageStore, ProtectedBlock};
use crate::regs::ID_LED_DEFAULT;

/// NVM operation table
///
/// Implementations must be stateless with respect to the part: all device
/// state lives in the [`NvmHw`] context so that one table value can serve
/// any number of devices.
pub trait NvmOps {
    /// Discover the part geometry and store it in `hw.nvm`
    ///
    /// Default implementation leaves the descriptor untouched.
    fn init_params(&self, _hw: &mut NvmHw<'_>) -> Result<()> {
        Ok(())
    }

    /// Acquire exclusive access to the NVM bus
    fn acquire(&self, hw: &mut NvmHw<'_>) -> Result<()>;

    /// Release the NVM bus
    ///
    /// Must be called exactly once after every successful `acquire`.
    fn release(&self, hw: &mut NvmHw<'_>);

    /// Read `data.len()` words starting at word `offset`
    fn read(&self, hw: &mut NvmHw<'_>, offset: u16, data: &mut [u16]) -> Result<()>;

    /// Write `data` starting at word `offset`
    ///
    /// The checksum word is not maintained; call `update` afterwards.
    fn write(&self, hw: &mut NvmHw<'_>, offset: u16, data: &[u16]) -> Result<()>;

    /// Recompute and store the checksum word
    fn update(&self, hw: &mut NvmHw<'_>) -> Result<()> {
        checksum::update_nvm_checksum(self, hw)
    }

    /// Verify that the checksum region sums to the expected constant
    fn validate(&self, hw: &mut NvmHw<'_>) -> Result<()> {
        checksum::validate_nvm_checksum(self, hw)
    }

    /// Ask the controller to reinitialize itself from NVM
    fn reload(&self, hw: &mut NvmHw<'_>) {
        derived::reload_nvm(hw)
    }

    /// Read the ID LED configuration, substituting the default for
    /// unprogrammed values
    fn valid_led_default(&self, hw: &mut NvmHw<'_>) -> Result<u16> {
        derived::valid_led_default(self, hw)
    }

    /// Resolve a block's size from NVM (or from `image` when given)
    fn get_protected_block_size(
        &self,
        hw: &mut NvmHw<'_>,
        block: &mut BlockDescriptor,
        image: Option<&mut [u16]>,
    ) -> Result<()> {
        match image {
            Some(words) => protected::resolve_block_size(&mut ImageStore::new(words), block),
            None => protected::resolve_block_size(&mut DeviceStore::new(self, hw), block),
        }
    }

    /// Read every block in `blocks` into its buffer
    fn read_protected_blocks(
        &self,
        hw: &mut NvmHw<'_>,
        blocks: &mut [ProtectedBlock<'_>],
        image: Option<&mut [u16]>,
    ) -> Result<()> {
        match image {
            Some(words) => protected::read_blocks(&mut ImageStore::new(words), blocks),
            None => protected::read_blocks(&mut DeviceStore::new(self, hw), blocks),
        }
    }

    /// Merge every block in `blocks` into NVM (or into `image` when given)
    fn write_protected_blocks(
        &self,
        hw: &mut NvmHw<'_>,
        blocks: &[ProtectedBlock<'_>],
        image: Option<&mut [u16]>,
    ) -> Result<()> {
        match image {
            Some(words) => protected::write_blocks(&mut ImageStore::new(words), blocks),
            None => protected::write_blocks(&mut DeviceStore::new(self, hw), blocks),
        }
    }
}

/// Operation table for devices without a usable NVM
///
/// Every call succeeds without touching the hardware, so an unconfigured
/// device stays callable. Reads leave the destination untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNvm;

impl NvmOps for NoOpNvm {
    fn acquire(&self, _hw: &mut NvmHw<'_>) -> Result<()> {
        Ok(())
    }

    fn release(&self, _hw: &mut NvmHw<'_>) {}

    fn read(&self, _hw: &mut NvmHw<'_>, _offset: u16, _data: &mut [u16]) -> Result<()> {
        Ok(())
    }

    fn write(&self, _hw: &mut NvmHw<'_>, _offset: u16, _data: &[u16]) -> Result<()> {
        Ok(())
    }

    fn update(&self, _hw: &mut NvmHw<'_>) -> Result<()> {
        Ok(())
    }

    fn validate(&self, _hw: &mut NvmHw<'_>) -> Result<()> {
        Ok(())
    }

    fn valid_led_default(&self, _hw: &mut NvmHw<'_>) -> Result<u16> {
        Ok(ID_LED_DEFAULT)
    }
}
