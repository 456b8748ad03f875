//! Device-level NVM entry point

use super::{NvmHw, NvmInfo, NvmOps};
use crate::bus::RegisterBus;
use crate::derived;
use crate::error::Result;
use crate::protected::{self, BlockDescriptor, BlockType, DeviceStore, ImageStore, ProtectedBlock};
use crate::regs::ETH_ADDR_LEN;

/// MAC addresses latched from the receive address registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacAddresses {
    /// Factory address as loaded from NVM
    pub perm_addr: [u8; ETH_ADDR_LEN],
    /// Address currently in use
    pub addr: [u8; ETH_ADDR_LEN],
}

/// A controller's NVM interface
///
/// Owns the register bus, the part descriptor and the operation table
/// bound at construction. Commands execute serially; callers sharing one
/// device must serialize externally.
pub struct NvmDevice<B: RegisterBus, O: NvmOps> {
    bus: B,
    info: NvmInfo,
    ops: O,
    mac: MacAddresses,
}

impl<B: RegisterBus, O: NvmOps> NvmDevice<B, O> {
    /// Bind an operation table to a register bus
    pub fn new(bus: B, info: NvmInfo, ops: O) -> Self {
        Self {
            bus,
            info,
            ops,
            mac: MacAddresses::default(),
        }
    }

    /// Get the part descriptor
    pub fn info(&self) -> &NvmInfo {
        &self.info
    }

    /// Get the bound operation table
    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Get the MAC addresses read by [`read_mac_address`](Self::read_mac_address)
    pub fn mac(&self) -> &MacAddresses {
        &self.mac
    }

    /// Get a reference to the register bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Get a mutable reference to the register bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    fn split(&mut self) -> (&O, NvmHw<'_>) {
        let Self { bus, info, ops, .. } = self;
        (ops, NvmHw::new(bus, info))
    }

    /// Discover the part geometry through the bound table
    pub fn init_params(&mut self) -> Result<()> {
        let (ops, mut hw) = self.split();
        ops.init_params(&mut hw)
    }

    /// Acquire exclusive access to the NVM bus
    pub fn acquire(&mut self) -> Result<()> {
        let (ops, mut hw) = self.split();
        ops.acquire(&mut hw)
    }

    /// Release the NVM bus
    pub fn release(&mut self) {
        let (ops, mut hw) = self.split();
        ops.release(&mut hw)
    }

    /// Read `data.len()` words starting at word `offset`
    pub fn read(&mut self, offset: u16, data: &mut [u16]) -> Result<()> {
        let (ops, mut hw) = self.split();
        ops.read(&mut hw, offset, data)
    }

    /// Write `data` starting at word `offset`
    ///
    /// The stored checksum becomes stale; follow up with
    /// [`update_checksum`](Self::update_checksum).
    pub fn write(&mut self, offset: u16, data: &[u16]) -> Result<()> {
        let (ops, mut hw) = self.split();
        ops.write(&mut hw, offset, data)
    }

    /// Verify the NVM checksum
    pub fn validate_checksum(&mut self) -> Result<()> {
        let (ops, mut hw) = self.split();
        ops.validate(&mut hw)
    }

    /// Recompute and store the NVM checksum
    pub fn update_checksum(&mut self) -> Result<()> {
        let (ops, mut hw) = self.split();
        ops.update(&mut hw)
    }

    /// Ask the controller to reload its configuration from NVM
    pub fn reload(&mut self) {
        let (ops, mut hw) = self.split();
        ops.reload(&mut hw)
    }

    /// Read the ID LED configuration word
    pub fn valid_led_default(&mut self) -> Result<u16> {
        let (ops, mut hw) = self.split();
        ops.valid_led_default(&mut hw)
    }

    /// Resolve `block.block_size` if it is still unknown
    pub fn get_protected_block_size(
        &mut self,
        block: &mut BlockDescriptor,
        image: Option<&mut [u16]>,
    ) -> Result<()> {
        let (ops, mut hw) = self.split();
        ops.get_protected_block_size(&mut hw, block, image)
    }

    /// Read one protected block into its buffer
    pub fn read_protected_block(
        &mut self,
        block: &mut ProtectedBlock<'_>,
        image: Option<&mut [u16]>,
    ) -> Result<()> {
        let (ops, mut hw) = self.split();
        match image {
            Some(words) => protected::read_block(&mut ImageStore::new(words), block),
            None => protected::read_block(&mut DeviceStore::new(ops, &mut hw), block),
        }
    }

    /// Read a batch of protected blocks
    pub fn read_protected_blocks(
        &mut self,
        blocks: &mut [ProtectedBlock<'_>],
        image: Option<&mut [u16]>,
    ) -> Result<()> {
        let (ops, mut hw) = self.split();
        ops.read_protected_blocks(&mut hw, blocks, image)
    }

    /// Merge one protected block into NVM under its word mask
    pub fn write_protected_block(
        &mut self,
        block: &ProtectedBlock<'_>,
        image: Option<&mut [u16]>,
    ) -> Result<()> {
        let (ops, mut hw) = self.split();
        match image {
            Some(words) => protected::write_block(&mut ImageStore::new(words), block),
            None => protected::write_block(&mut DeviceStore::new(ops, &mut hw), block),
        }
    }

    /// Merge a batch of protected blocks into NVM
    pub fn write_protected_blocks(
        &mut self,
        blocks: &[ProtectedBlock<'_>],
        image: Option<&mut [u16]>,
    ) -> Result<()> {
        let (ops, mut hw) = self.split();
        ops.write_protected_blocks(&mut hw, blocks, image)
    }

    /// Select the allocated blocks of `table` whose type intersects `mask`
    ///
    /// With `out` set to `None` only the number of matching blocks is
    /// returned. Otherwise matching descriptors are copied into `out` with
    /// their sizes resolved.
    pub fn get_protected_blocks_from_table(
        &mut self,
        table: &[BlockDescriptor],
        mask: BlockType,
        out: Option<&mut [BlockDescriptor]>,
        image: Option<&mut [u16]>,
    ) -> Result<usize> {
        let (ops, mut hw) = self.split();
        match image {
            Some(words) => {
                protected::blocks_from_table(&mut ImageStore::new(words), table, mask, out)
            }
            None => protected::blocks_from_table(
                &mut DeviceStore::new(ops, &mut hw),
                table,
                mask,
                out,
            ),
        }
    }

    /// Latch the MAC address from receive address slot 0
    pub fn read_mac_address(&mut self) -> Result<[u8; ETH_ADDR_LEN]> {
        let addr = derived::read_mac_addr(&mut self.bus);
        self.mac = MacAddresses {
            perm_addr: addr,
            addr,
        };
        Ok(addr)
    }

    /// Decode the PBA number into `buf`, NUL-terminated
    ///
    /// Returns the string length, not counting the terminator.
    pub fn read_pba_string(&mut self, buf: &mut [u8]) -> Result<usize> {
        let (ops, mut hw) = self.split();
        derived::read_pba_string(ops, &mut hw, buf)
    }

    /// Buffer size needed by [`read_pba_string`](Self::read_pba_string),
    /// terminator included
    pub fn read_pba_length(&mut self) -> Result<u32> {
        let (ops, mut hw) = self.split();
        derived::read_pba_length(ops, &mut hw)
    }

    /// Decode the PBA number into an owned string
    #[cfg(feature = "alloc")]
    pub fn pba_string(&mut self) -> Result<alloc::string::String> {
        let len = self.read_pba_length()?;
        let mut buf = alloc::vec![0u8; len as usize];
        let n = self.read_pba_string(&mut buf)?;
        buf.truncate(n);
        Ok(buf.iter().map(|&b| b as char).collect())
    }
}
