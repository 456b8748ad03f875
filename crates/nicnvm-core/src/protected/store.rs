//! Word stores backing the protected-block codec

use crate::error::{Error, Result};
use crate::nvm::{NvmHw, NvmOps};

/// A flat array of 16-bit NVM words
pub trait WordStore {
    /// Fail with `InvalidArgument` unless `words` words starting at
    /// `offset` are addressable
    fn check_range(&self, offset: u32, words: u32) -> Result<()>;

    /// Read `data.len()` words starting at `offset`
    fn read_words(&mut self, offset: u16, data: &mut [u16]) -> Result<()>;

    /// Write one word
    fn write_word(&mut self, offset: u16, value: u16) -> Result<()>;

    /// Read one word
    fn read_word(&mut self, offset: u16) -> Result<u16> {
        let mut word = [0u16; 1];
        self.read_words(offset, &mut word)?;
        Ok(word[0])
    }
}

/// The live NVM, accessed through an operation table
pub struct DeviceStore<'s, 'a, O: NvmOps + ?Sized> {
    ops: &'s O,
    hw: &'s mut NvmHw<'a>,
}

impl<'s, 'a, O: NvmOps + ?Sized> DeviceStore<'s, 'a, O> {
    /// Wrap a table and its device context
    pub fn new(ops: &'s O, hw: &'s mut NvmHw<'a>) -> Self {
        Self { ops, hw }
    }
}

impl<O: NvmOps + ?Sized> WordStore for DeviceStore<'_, '_, O> {
    fn check_range(&self, offset: u32, words: u32) -> Result<()> {
        if offset + words > u32::from(self.hw.nvm.word_size) {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    fn read_words(&mut self, offset: u16, data: &mut [u16]) -> Result<()> {
        self.ops.read(self.hw, offset, data)
    }

    fn write_word(&mut self, offset: u16, value: u16) -> Result<()> {
        self.ops.write(self.hw, offset, &[value])
    }
}

/// An in-memory snapshot of the whole NVM
///
/// Every access is bounds-checked against the snapshot length.
pub struct ImageStore<'a> {
    words: &'a mut [u16],
}

const WORD_ADDRESS_SPACE: usize = 0x1_0000;

impl<'a> ImageStore<'a> {
    /// Wrap a snapshot
    pub fn new(words: &'a mut [u16]) -> Self {
        Self { words }
    }
}

impl WordStore for ImageStore<'_> {
    fn check_range(&self, offset: u32, words: u32) -> Result<()> {
        // Word addresses are 16 bits wide even when the snapshot is longer
        let limit = self.words.len().min(WORD_ADDRESS_SPACE);
        if offset as usize + words as usize > limit {
            log::debug!(
                "range {:#x}+{} outside {}-word image",
                offset,
                words,
                self.words.len()
            );
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    fn read_words(&mut self, offset: u16, data: &mut [u16]) -> Result<()> {
        self.check_range(u32::from(offset), data.len() as u32)?;
        let start = usize::from(offset);
        data.copy_from_slice(&self.words[start..start + data.len()]);
        Ok(())
    }

    fn write_word(&mut self, offset: u16, value: u16) -> Result<()> {
        self.check_range(u32::from(offset), 1)?;
        self.words[usize::from(offset)] = value;
        Ok(())
    }
}
