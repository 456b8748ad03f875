//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a string as a hex or decimal u16
fn parse_hex_u16(s: &str) -> Result<u16, String> {
    let value = parse_hex_u32(s)?;
    u16::try_from(value).map_err(|_| format!("Value {:#x} does not fit in 16 bits", value))
}

#[derive(Parser)]
#[command(name = "nicnvm")]
#[command(author, version, about = "NIC EEPROM inspection and editing tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// How the engine reaches the EEPROM
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    /// Bit-banged SPI over EECD with request/grant arbitration
    #[default]
    Spi,
    /// Register-polled EERD/EEWR word engine
    Eerd,
}

/// Image and emulated part options shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct DeviceArgs {
    /// EEPROM image file (16-bit little-endian words)
    #[arg(short, long)]
    pub image: PathBuf,

    /// Access path used to reach the EEPROM
    #[arg(long, value_enum, default_value_t = Access::Spi)]
    pub access: Access,

    /// EECD size field of the emulated part (word size is 64 << N);
    /// derived from the image length when omitted
    #[arg(long)]
    pub size_ex: Option<u8>,

    /// SPI page size in bytes: 8 (8-bit addressing) or 32 (16-bit addressing)
    #[arg(long)]
    pub page_size: Option<u16>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show part geometry, checksum status, PBA, MAC and LED configuration
    Info {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Validate the checksum word
    Checksum {
        #[command(flatten)]
        device: DeviceArgs,

        /// Recompute and store the checksum, then validate again
        #[arg(long)]
        fix: bool,
    },

    /// Print words as hex
    ReadWords {
        #[command(flatten)]
        device: DeviceArgs,

        /// First word (hex, e.g., 0x3F)
        #[arg(long, value_parser = parse_hex_u16)]
        offset: u16,

        /// Number of words
        #[arg(long, default_value = "1", value_parser = parse_hex_u32)]
        count: u32,
    },

    /// Write one word and update the checksum
    WriteWord {
        #[command(flatten)]
        device: DeviceArgs,

        /// Word offset (hex or decimal)
        #[arg(long, value_parser = parse_hex_u16)]
        offset: u16,

        /// Value to store (hex or decimal)
        #[arg(long, value_parser = parse_hex_u16)]
        value: u16,

        /// Leave the checksum word alone
        #[arg(long)]
        no_checksum: bool,
    },

    /// Read every word through the engine and save it to a file
    Dump {
        #[command(flatten)]
        device: DeviceArgs,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List and read the protected blocks of a block table
    Blocks {
        #[command(flatten)]
        device: DeviceArgs,

        /// Block table (TOML format)
        #[arg(long)]
        table: PathBuf,

        /// Only show blocks whose type intersects this mask (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        mask: Option<u32>,
    },

    /// Merge data into one protected block under its word mask
    WriteBlock {
        #[command(flatten)]
        device: DeviceArgs,

        /// Block table (TOML format)
        #[arg(long)]
        table: PathBuf,

        /// Name of the block in the table
        #[arg(long)]
        name: String,

        /// Block words (comma-separated, hex or decimal)
        #[arg(long, value_delimiter = ',', value_parser = parse_hex_u16)]
        data: Vec<u16>,

        /// Leave the checksum word alone
        #[arg(long)]
        no_checksum: bool,
    },
}
