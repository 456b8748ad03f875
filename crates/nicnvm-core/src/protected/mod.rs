//! Protected NVM blocks
//!
//! A protected block is a structured record in NVM: either at a fixed word
//! address, or reached through a pointer word. Several records may share a
//! physical word, so every block carries a word mask and writes merge only
//! the masked bits.
//!
//! All codec logic runs against the [`WordStore`] seam, with two
//! implementations:
//!
//! - [`DeviceStore`] - the live part, through the bound operation table
//! - [`ImageStore`] - a caller-supplied snapshot of the whole NVM
//!
//! # Device-specific tables
//!
//! Which blocks exist is device-specific data. A driver supplies a table of
//! [`BlockDescriptor`]s and filters it by type with
//! [`blocks_from_table`]. With the `std` feature, tables can be loaded
//! from TOML files (see [`BlockTable`]).

mod codec;
mod store;
#[cfg(feature = "std")]
mod table;

pub use codec::{
    blocks_from_table, read_block, read_blocks, resolve_block_size, write_block, write_blocks,
};
pub use store::{DeviceStore, ImageStore, WordStore};
#[cfg(feature = "std")]
pub use table::{BlockTable, TableEntry, TableError};

use bitflags::bitflags;

bitflags! {
    /// Protected block type tags
    ///
    /// A descriptor carries one tag; table filtering takes any combination.
    /// Device-specific tags outside the named ones are preserved.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BlockType: u32 {
        /// iSCSI boot configuration module
        const ISCSI_BOOT_CONFIG = 1 << 0;

        const _ = !0;
    }
}

/// Location and shape of one protected record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// Type tag used for filtering and size resolution
    pub block_type: BlockType,
    /// `word_address` holds a pointer to the record rather than the record
    pub has_pointer: bool,
    /// Record offset, or offset of the pointer word
    pub word_address: u16,
    /// Added to the dereferenced pointer to reach the record start
    pub pointed_word_offset: u16,
    /// Record length in words; 0 until resolved
    pub block_size: u16,
    /// Bits of each word that belong to this record
    pub word_mask: u16,
}

impl BlockDescriptor {
    /// Describe a record stored at a fixed address
    pub const fn direct(block_type: BlockType, word_address: u16, block_size: u16) -> Self {
        Self {
            block_type,
            has_pointer: false,
            word_address,
            pointed_word_offset: 0,
            block_size,
            word_mask: 0xFFFF,
        }
    }

    /// Describe a record reached through the pointer at `pointer_address`
    ///
    /// The size is left unresolved.
    pub const fn pointed(block_type: BlockType, pointer_address: u16, offset: u16) -> Self {
        Self {
            block_type,
            has_pointer: true,
            word_address: pointer_address,
            pointed_word_offset: offset,
            block_size: 0,
            word_mask: 0xFFFF,
        }
    }

    /// Same descriptor with a different word mask
    pub const fn with_mask(mut self, word_mask: u16) -> Self {
        self.word_mask = word_mask;
        self
    }

    /// Same descriptor with a known size
    pub const fn with_size(mut self, block_size: u16) -> Self {
        self.block_size = block_size;
        self
    }
}

/// A descriptor paired with the caller's record buffer
///
/// The buffer is the destination of a read and the source of a write and
/// must hold at least `desc.block_size` words.
#[derive(Debug)]
pub struct ProtectedBlock<'a> {
    /// Where the record lives
    pub desc: BlockDescriptor,
    /// Record contents
    pub buffer: Option<&'a mut [u16]>,
}

impl<'a> ProtectedBlock<'a> {
    /// Pair a descriptor with a buffer
    pub fn new(desc: BlockDescriptor, buffer: &'a mut [u16]) -> Self {
        Self {
            desc,
            buffer: Some(buffer),
        }
    }
}
