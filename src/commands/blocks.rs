//! Protected block commands

use super::format_words;
use crate::device::Device;
use crate::error::CliError;
use nicnvm_core::protected::{BlockDescriptor, BlockTable, BlockType, ProtectedBlock, TableEntry};
use std::path::Path;

/// Name of the table entry a filtered descriptor came from
fn entry_name<'t>(table: &'t BlockTable, desc: &BlockDescriptor) -> &'t str {
    table
        .entries()
        .iter()
        .find(|e| {
            e.desc.block_type == desc.block_type
                && e.desc.has_pointer == desc.has_pointer
                && e.desc.word_address == desc.word_address
                && e.desc.pointed_word_offset == desc.pointed_word_offset
        })
        .map(|e| e.name.as_str())
        .unwrap_or("?")
}

fn describe(desc: &BlockDescriptor) -> String {
    if desc.has_pointer {
        format!(
            "via pointer at {:#06x} (+{})",
            desc.word_address, desc.pointed_word_offset
        )
    } else {
        format!("at {:#06x}", desc.word_address)
    }
}

/// List the allocated blocks of a table and print their contents
pub fn run_blocks(
    dev: &mut Device,
    table_path: &Path,
    mask: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = BlockTable::from_file(table_path)?;
    let descriptors = table.descriptors();
    let mask = mask.map_or(BlockType::all(), BlockType::from_bits_retain);

    let count = dev.get_protected_blocks_from_table(&descriptors, mask, None, None)?;
    let mut found = vec![BlockDescriptor::direct(BlockType::empty(), 0, 0); count];
    dev.get_protected_blocks_from_table(&descriptors, mask, Some(&mut found), None)?;

    println!(
        "{} of {} table entries allocated and matching",
        count,
        table.len()
    );

    for desc in &found {
        println!(
            "{} ({} words, mask {:#06x}) {}",
            entry_name(&table, desc),
            desc.block_size,
            desc.word_mask,
            describe(desc)
        );
        if desc.block_size == 0 {
            println!("  (empty)");
            continue;
        }

        let mut buf = vec![0u16; usize::from(desc.block_size)];
        let mut block = ProtectedBlock::new(*desc, &mut buf);
        dev.read_protected_block(&mut block, None)?;

        for line in format_words(0, &buf) {
            println!("  {}", line);
        }
    }
    Ok(())
}

fn find_entry<'t>(table: &'t BlockTable, name: &str) -> Result<&'t TableEntry, CliError> {
    table.find(name).ok_or_else(|| {
        let names: Vec<&str> = table.entries().iter().map(|e| e.name.as_str()).collect();
        CliError::InvalidArgument(format!(
            "no block named '{}' (available: {})",
            name,
            names.join(", ")
        ))
    })
}

/// Merge `data` into the named block, then refresh the checksum unless
/// told not to
pub fn run_write_block(
    dev: &mut Device,
    table_path: &Path,
    name: &str,
    data: &[u16],
    update_checksum: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = BlockTable::from_file(table_path)?;
    let mut desc = find_entry(&table, name)?.desc;

    dev.get_protected_block_size(&mut desc, None)?;
    if usize::from(desc.block_size) != data.len() {
        return Err(CliError::InvalidArgument(format!(
            "block '{}' holds {} words, got {}",
            name,
            desc.block_size,
            data.len()
        ))
        .into());
    }

    let mut buf = data.to_vec();
    dev.write_protected_block(&ProtectedBlock::new(desc, &mut buf), None)?;
    println!(
        "Merged {} words into '{}' under mask {:#06x}",
        data.len(),
        name,
        desc.word_mask
    );

    if update_checksum {
        dev.update_checksum()?;
        println!("Checksum updated");
    }
    Ok(())
}
