//! Checksum command implementation

use crate::device::Device;
use nicnvm_core::Error;

/// Validate the checksum, optionally repairing it
///
/// Returns whether the image changed.
pub fn run_checksum(dev: &mut Device, fix: bool) -> Result<bool, Box<dyn std::error::Error>> {
    match dev.validate_checksum() {
        Ok(()) => {
            println!("Checksum valid");
            Ok(false)
        }
        Err(Error::ChecksumMismatch) if fix => {
            dev.update_checksum()?;
            dev.validate_checksum()?;
            println!("Checksum was invalid; updated");
            Ok(true)
        }
        Err(e) => Err(e.into()),
    }
}
