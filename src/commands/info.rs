//! Info command implementation

use crate::device::Device;
use nicnvm_core::Error;

/// Print everything the engine can derive from the part
pub fn run_info(dev: &mut Device) -> Result<(), Box<dyn std::error::Error>> {
    let info = *dev.info();
    println!("Access:    {}", dev.ops().name());
    println!(
        "Part:      {} words, {}-bit addressing, {}-byte pages",
        info.word_size, info.address_bits, info.page_size
    );

    match dev.validate_checksum() {
        Ok(()) => println!("Checksum:  valid"),
        Err(Error::ChecksumMismatch) => println!("Checksum:  INVALID"),
        Err(e) => return Err(e.into()),
    }

    match dev.pba_string() {
        Ok(pba) => println!("PBA:       {}", pba),
        Err(Error::SectionInvalid) => println!("PBA:       (invalid section)"),
        Err(e) => return Err(e.into()),
    }

    // The receive address registers only pick up NVM contents on reload
    dev.reload();
    let mac = dev.read_mac_address()?;
    let mac: Vec<String> = mac.iter().map(|b| format!("{:02x}", b)).collect();
    println!("MAC:       {}", mac.join(":"));

    println!("ID LED:    {:#06x}", dev.valid_led_default()?);
    Ok(())
}
