//! Bit-level SPI EEPROM model
//!
//! Follows the lines the host drives through EECD. A transaction starts
//! when chip select is asserted (CS cleared), bits are sampled from DI on
//! each rising clock edge, and data is presented on DO on rising edges of
//! the output phase. Page writes are buffered and committed when chip
//! select is released, after which the part reports busy for a configured
//! number of status reads.

use heapless::Vec;
use nicnvm_core::regs::{
    NVM_A8_OPCODE_SPI, NVM_RDSR_OPCODE_SPI, NVM_READ_OPCODE_SPI, NVM_STATUS_RDY_SPI,
    NVM_WREN_OPCODE_SPI, NVM_WRITE_OPCODE_SPI,
};

/// Largest page size a part can have
pub const MAX_PAGE_SIZE: usize = 32;

/// Status register: write enable latch
const STATUS_WEL: u8 = 1 << 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// Collecting the opcode
    Opcode { value: u8, bits: u8 },
    /// Collecting the address
    Address {
        access: Access,
        a8: bool,
        value: u16,
        bits: u8,
    },
    /// Streaming bytes out from `addr`
    Read { addr: usize, bit: u8 },
    /// Clocking the status register out
    Status { value: u8, bit: u8 },
    /// Collecting page data starting at `addr`
    Write { addr: usize, byte: u8, bits: u8 },
    /// Clocking bits nobody listens to
    Ignore,
}

impl State {
    const fn start() -> Self {
        Self::Opcode { value: 0, bits: 0 }
    }
}

/// Serial EEPROM behind the EECD lines
#[derive(Debug)]
pub struct SpiEepromModel {
    address_bits: u8,
    page_size: usize,
    selected: bool,
    state: State,
    write_enabled: bool,
    page: Vec<u8, MAX_PAGE_SIZE>,
    busy_polls: u32,
    busy_remaining: u32,
    data_out: bool,
    commits: usize,
}

impl SpiEepromModel {
    /// Create a deselected, idle part
    pub fn new(address_bits: u8, page_size: usize, busy_polls: u32) -> Self {
        Self {
            address_bits,
            page_size: page_size.min(MAX_PAGE_SIZE),
            selected: false,
            state: State::start(),
            write_enabled: false,
            page: Vec::new(),
            busy_polls,
            busy_remaining: 0,
            data_out: false,
            commits: 0,
        }
    }

    /// Number of status reads that report busy after each page commit
    pub fn set_busy_polls(&mut self, polls: u32) {
        self.busy_polls = polls;
    }

    /// Current DO level
    pub fn data_out(&self) -> bool {
        self.data_out
    }

    /// Number of page writes committed so far
    pub fn commits(&self) -> usize {
        self.commits
    }

    /// Whether a committed write is still in progress
    pub fn is_busy(&self) -> bool {
        self.busy_remaining > 0
    }

    /// Apply a chip select change; `selected` is true while CS is low
    pub fn set_selected(&mut self, selected: bool, mem: &mut [u8]) {
        if selected == self.selected {
            return;
        }
        self.selected = selected;

        if !selected {
            if let State::Write { addr, .. } = self.state {
                self.commit(addr, mem);
            }
            self.data_out = false;
        }
        self.state = State::start();
    }

    /// Handle one rising clock edge with DI at `data_in`
    pub fn clock(&mut self, data_in: bool, mem: &mut [u8]) {
        if !self.selected {
            return;
        }

        let bit = u8::from(data_in);
        self.state = match core::mem::replace(&mut self.state, State::Ignore) {
            State::Opcode { value, bits } => {
                let value = (value << 1) | bit;
                if bits + 1 < 8 {
                    State::Opcode {
                        value,
                        bits: bits + 1,
                    }
                } else {
                    self.decode(value)
                }
            }
            State::Address {
                access,
                a8,
                value,
                bits,
            } => {
                let value = (value << 1) | u16::from(bit);
                if bits + 1 < self.address_bits {
                    State::Address {
                        access,
                        a8,
                        value,
                        bits: bits + 1,
                    }
                } else {
                    let mut addr = usize::from(value);
                    if a8 && self.address_bits == 8 {
                        addr |= 0x100;
                    }
                    let addr = addr % mem.len().max(1);
                    match access {
                        Access::Read => State::Read { addr, bit: 0 },
                        Access::Write => {
                            self.page.clear();
                            State::Write {
                                addr,
                                byte: 0,
                                bits: 0,
                            }
                        }
                    }
                }
            }
            State::Read { addr, bit } => {
                let byte = mem.get(addr).copied().unwrap_or(0xFF);
                self.data_out = byte & (0x80 >> bit) != 0;
                if bit + 1 < 8 {
                    State::Read { addr, bit: bit + 1 }
                } else {
                    // The part auto-increments and wraps at the end of the array
                    State::Read {
                        addr: (addr + 1) % mem.len().max(1),
                        bit: 0,
                    }
                }
            }
            State::Status { value, bit } => {
                self.data_out = value & (0x80 >> bit) != 0;
                if bit + 1 < 8 {
                    State::Status {
                        value,
                        bit: bit + 1,
                    }
                } else {
                    self.busy_remaining = self.busy_remaining.saturating_sub(1);
                    State::Status {
                        value: self.status(),
                        bit: 0,
                    }
                }
            }
            State::Write { addr, byte, bits } => {
                let byte = (byte << 1) | bit;
                if bits + 1 < 8 {
                    State::Write {
                        addr,
                        byte,
                        bits: bits + 1,
                    }
                } else {
                    if self.page.len() < self.page_size {
                        // Capacity is MAX_PAGE_SIZE and page_size never exceeds it
                        let _ = self.page.push(byte);
                    } else {
                        log::warn!("dummy EEPROM: page overrun at {:#x}, byte dropped", addr);
                    }
                    State::Write {
                        addr,
                        byte: 0,
                        bits: 0,
                    }
                }
            }
            State::Ignore => State::Ignore,
        };
    }

    fn status(&self) -> u8 {
        let mut status = 0;
        if self.is_busy() {
            status |= NVM_STATUS_RDY_SPI;
        }
        if self.write_enabled {
            status |= STATUS_WEL;
        }
        status
    }

    fn decode(&mut self, opcode: u8) -> State {
        if opcode == NVM_RDSR_OPCODE_SPI {
            return State::Status {
                value: self.status(),
                bit: 0,
            };
        }
        if self.is_busy() {
            log::debug!("dummy EEPROM: opcode {:#04x} ignored while busy", opcode);
            return State::Ignore;
        }

        let a8 = opcode & NVM_A8_OPCODE_SPI != 0 && self.address_bits == 8;
        let base = if self.address_bits == 8 {
            opcode & !NVM_A8_OPCODE_SPI
        } else {
            opcode
        };

        match base {
            NVM_WREN_OPCODE_SPI => {
                self.write_enabled = true;
                State::Ignore
            }
            NVM_READ_OPCODE_SPI => State::Address {
                access: Access::Read,
                a8,
                value: 0,
                bits: 0,
            },
            NVM_WRITE_OPCODE_SPI => State::Address {
                access: Access::Write,
                a8,
                value: 0,
                bits: 0,
            },
            _ => {
                log::debug!("dummy EEPROM: unsupported opcode {:#04x}", opcode);
                State::Ignore
            }
        }
    }

    fn commit(&mut self, start: usize, mem: &mut [u8]) {
        if self.page.is_empty() {
            return;
        }
        if !self.write_enabled {
            log::warn!("dummy EEPROM: write at {:#x} without WREN ignored", start);
            self.page.clear();
            return;
        }

        // Bytes past the end of the page wrap to its start
        let page_size = self.page_size.max(1);
        let base = start - start % page_size;
        for (i, &byte) in self.page.iter().enumerate() {
            let addr = base + (start % page_size + i) % page_size;
            if let Some(cell) = mem.get_mut(addr) {
                *cell = byte;
            }
        }

        log::trace!("dummy EEPROM: committed {} bytes at {:#x}", self.page.len(), start);
        self.page.clear();
        self.write_enabled = false;
        self.busy_remaining = self.busy_polls;
        self.commits += 1;
    }
}
