//! Word read and write commands

use super::format_words;
use crate::device::Device;

/// Print `count` words starting at `offset`
pub fn run_read_words(
    dev: &mut Device,
    offset: u16,
    count: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let count = usize::try_from(count)?;
    let mut data = vec![0u16; count];
    dev.read(offset, &mut data)?;

    for line in format_words(offset, &data) {
        println!("{}", line);
    }
    Ok(())
}

/// Store one word, then refresh the checksum unless told not to
pub fn run_write_word(
    dev: &mut Device,
    offset: u16,
    value: u16,
    update_checksum: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    dev.write(offset, &[value])?;
    println!("Wrote {:#06x} to word {:#06x}", value, offset);

    if update_checksum {
        dev.update_checksum()?;
        println!("Checksum updated");
    }
    Ok(())
}
