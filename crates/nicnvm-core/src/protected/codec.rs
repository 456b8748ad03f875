//! Protected-block resolution, read and masked write

use super::{BlockDescriptor, BlockType, ProtectedBlock, WordStore};
use crate::error::{Error, Result};
use crate::regs::{ISCSI_BLOCK_SIZE_WORD_OFFSET, NVM_POINTER_UNALLOCATED};

/// Resolve `block.block_size` from the store if it is still 0
///
/// An unallocated pointer resolves to size 0. Only iSCSI boot
/// configuration modules carry their own size field (in bytes); other
/// pointed types cannot be sized and fail with `InvalidArgument`, as does
/// an unsized direct block.
pub fn resolve_block_size<S: WordStore + ?Sized>(
    store: &mut S,
    block: &mut BlockDescriptor,
) -> Result<()> {
    if block.block_size != 0 {
        return Ok(());
    }
    if !block.has_pointer {
        log::debug!("direct block at {:#x} has no size", block.word_address);
        return Err(Error::InvalidArgument);
    }

    let pointer = store.read_word(block.word_address)?;
    if pointer == NVM_POINTER_UNALLOCATED {
        block.block_size = 0;
        return Ok(());
    }

    if block.block_type == BlockType::ISCSI_BOOT_CONFIG {
        let size_address = pointer
            .checked_add(ISCSI_BLOCK_SIZE_WORD_OFFSET)
            .ok_or(Error::InvalidArgument)?;
        let size_bytes = store.read_word(size_address)?;
        block.block_size = size_bytes / 2;
        Ok(())
    } else {
        log::debug!("cannot size block of type {:#x}", block.block_type.bits());
        Err(Error::InvalidArgument)
    }
}

/// Word address where the record itself starts
fn record_start<S: WordStore + ?Sized>(store: &mut S, desc: &BlockDescriptor) -> Result<u16> {
    if !desc.has_pointer {
        return Ok(desc.word_address);
    }

    let pointer = store.read_word(desc.word_address)?;
    if pointer == NVM_POINTER_UNALLOCATED {
        log::debug!("cannot access unallocated record at {:#x}", desc.word_address);
        return Err(Error::RecordUnallocated);
    }

    pointer
        .checked_add(desc.pointed_word_offset)
        .ok_or(Error::InvalidArgument)
}

/// Record buffer, checked against the resolved size
fn sized_buffer<'b>(desc: &BlockDescriptor, buffer: Option<&'b [u16]>) -> Result<&'b [u16]> {
    match buffer {
        Some(buf) if buf.len() >= usize::from(desc.block_size) => {
            Ok(&buf[..usize::from(desc.block_size)])
        }
        _ => Err(Error::InvalidArgument),
    }
}

/// Locate the record and validate its extent
///
/// The pointer is followed before the size is checked, so a block whose
/// size resolved to 0 because its pointer reads 0xFFFF reports
/// `RecordUnallocated`.
fn locate_record<S: WordStore + ?Sized>(store: &mut S, desc: &BlockDescriptor) -> Result<u16> {
    let start = record_start(store, desc)?;
    if desc.block_size == 0 {
        log::debug!("block at {:#x} has no resolved size", desc.word_address);
        return Err(Error::InvalidArgument);
    }
    store.check_range(u32::from(start), u32::from(desc.block_size))?;
    Ok(start)
}

/// Read one block into its buffer
pub fn read_block<S: WordStore + ?Sized>(store: &mut S, block: &mut ProtectedBlock<'_>) -> Result<()> {
    let desc = block.desc;
    sized_buffer(&desc, block.buffer.as_deref())?;

    let start = locate_record(store, &desc)?;

    let size = usize::from(desc.block_size);
    match block.buffer.as_deref_mut() {
        Some(buf) => store.read_words(start, &mut buf[..size]),
        None => Err(Error::InvalidArgument),
    }
}

/// Merge one block into the store under its word mask
///
/// Each covered word is read, the masked bits replaced with the buffer's,
/// and the result written back; bits outside the mask are preserved. The
/// whole record range is validated before the first word is written.
pub fn write_block<S: WordStore + ?Sized>(store: &mut S, block: &ProtectedBlock<'_>) -> Result<()> {
    let desc = block.desc;
    let data = sized_buffer(&desc, block.buffer.as_deref())?;

    let start = locate_record(store, &desc)?;

    let mask = desc.word_mask;
    for (i, &value) in data.iter().enumerate() {
        let address =
            u16::try_from(u32::from(start) + i as u32).map_err(|_| Error::InvalidArgument)?;
        let current = store.read_word(address)?;
        let merged = (current & !mask) | (value & mask);
        store.write_word(address, merged)?;
    }

    log::trace!(
        "merged {} words at {:#x} under mask {:#06x}",
        data.len(),
        start,
        mask
    );
    Ok(())
}

fn check_buffers(blocks: &[ProtectedBlock<'_>]) -> Result<()> {
    for block in blocks {
        sized_buffer(&block.desc, block.buffer.as_deref()).map_err(|e| {
            log::debug!("protected block at {:#x} has no usable buffer", block.desc.word_address);
            e
        })?;
    }
    Ok(())
}

/// Read a batch of blocks
///
/// Every block must have a buffer covering its size before anything is
/// read.
/// Stops at the first failing block.
pub fn read_blocks<S: WordStore + ?Sized>(
    store: &mut S,
    blocks: &mut [ProtectedBlock<'_>],
) -> Result<()> {
    check_buffers(blocks)?;
    for block in blocks.iter_mut() {
        read_block(store, block)?;
    }
    Ok(())
}

/// Write a batch of blocks
///
/// Every block must have a buffer covering its size before anything is
/// written. Stops at the first failing block; blocks written before it
/// stay written.
pub fn write_blocks<S: WordStore + ?Sized>(
    store: &mut S,
    blocks: &[ProtectedBlock<'_>],
) -> Result<()> {
    check_buffers(blocks)?;
    for block in blocks {
        write_block(store, block)?;
    }
    Ok(())
}

/// Select the allocated blocks of `table` whose type intersects `mask`
///
/// Pointed blocks whose pointer reads 0xFFFF are skipped. With `out` set
/// to `None` only the count is computed; otherwise matches are copied into
/// `out` with their sizes resolved, failing with `NoSpace` when `out` is
/// too short. Returns the number of matches.
pub fn blocks_from_table<S: WordStore + ?Sized>(
    store: &mut S,
    table: &[BlockDescriptor],
    mask: BlockType,
    mut out: Option<&mut [BlockDescriptor]>,
) -> Result<usize> {
    let mut count = 0usize;

    for entry in table {
        if !entry.block_type.intersects(mask) {
            continue;
        }

        if entry.has_pointer && store.read_word(entry.word_address)? == NVM_POINTER_UNALLOCATED {
            continue;
        }

        if let Some(out) = out.as_deref_mut() {
            let slot = out.get_mut(count).ok_or(Error::NoSpace)?;
            let mut desc = *entry;
            resolve_block_size(store, &mut desc)?;
            *slot = desc;
        }
        count += 1;
    }

    Ok(count)
}
