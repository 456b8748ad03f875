//! NVM word checksum
//!
//! Words `0..=NVM_CHECKSUM_REG` must sum (with 16-bit wraparound) to
//! `NVM_SUM`. The last word of that region is the checksum word and is
//! chosen to make the sum come out right.

use crate::error::{Error, Result};
use crate::nvm::{NvmHw, NvmOps};
use crate::regs::{NVM_CHECKSUM_REG, NVM_SUM};

const REGION_WORDS: usize = NVM_CHECKSUM_REG as usize + 1;

/// Wrapping 16-bit sum of `words`
pub fn sum_words(words: &[u16]) -> u16 {
    words.iter().fold(0u16, |acc, &w| acc.wrapping_add(w))
}

/// Checksum word that completes `words` (everything before the checksum
/// word) to `NVM_SUM`
pub fn checksum_for(words: &[u16]) -> u16 {
    NVM_SUM.wrapping_sub(sum_words(words))
}

/// Validate the checksum stored in NVM
///
/// Read failures are returned unchanged; a bad sum is
/// [`Error::ChecksumMismatch`].
pub fn validate_nvm_checksum<O: NvmOps + ?Sized>(ops: &O, hw: &mut NvmHw<'_>) -> Result<()> {
    let mut region = [0u16; REGION_WORDS];
    ops.read(hw, 0, &mut region).map_err(|e| {
        log::debug!("NVM read error while validating checksum");
        e
    })?;

    let sum = sum_words(&region);
    if sum != NVM_SUM {
        log::warn!("NVM checksum invalid: sum {:#06x}, expected {:#06x}", sum, NVM_SUM);
        return Err(Error::ChecksumMismatch);
    }

    Ok(())
}

/// Recompute the checksum word and write it to NVM
pub fn update_nvm_checksum<O: NvmOps + ?Sized>(ops: &O, hw: &mut NvmHw<'_>) -> Result<()> {
    let mut region = [0u16; REGION_WORDS - 1];
    ops.read(hw, 0, &mut region).map_err(|e| {
        log::debug!("NVM read error while updating checksum");
        e
    })?;

    let checksum = checksum_for(&region);
    ops.write(hw, NVM_CHECKSUM_REG, &[checksum]).map_err(|e| {
        log::debug!("NVM write error while updating checksum");
        e
    })?;

    log::debug!("NVM checksum updated to {:#06x}", checksum);
    Ok(())
}
