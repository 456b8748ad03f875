//! Dump command implementation

use crate::device::Device;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Words read per engine call
const READ_CHUNK_WORDS: usize = 64;

/// Read every word through the engine and write the image to `output`
pub fn run_dump(dev: &mut Device, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let words = read_nvm_with_progress(dev)?;
    let bytes: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();

    let mut file = File::create(output)?;
    file.write_all(&bytes)?;

    println!("Wrote {} bytes to {:?}", bytes.len(), output);
    Ok(())
}

/// Read the whole part with a progress bar
pub fn read_nvm_with_progress(dev: &mut Device) -> Result<Vec<u16>, Box<dyn std::error::Error>> {
    let total = usize::from(dev.info().word_size);
    let mut data = vec![0u16; total];

    let pb = ProgressBar::new((total * 2) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")?
            .progress_chars("#>-"),
    );

    let mut offset = 0usize;
    while offset < total {
        let chunk_len = std::cmp::min(READ_CHUNK_WORDS, total - offset);
        dev.read(offset as u16, &mut data[offset..offset + chunk_len])?;

        offset += chunk_len;
        pb.set_position((offset * 2) as u64);
    }

    pb.finish_with_message("Read complete");
    Ok(data)
}
