//! TOML protected-block table parsing
//!
//! Parses device block tables in TOML format:
//!
//! ```toml
//! [[block]]
//! name = "iscsi"
//! type = "iscsi-boot-config"
//! pointer = true
//! word_address = "0x3D"
//!
//! [[block]]
//! name = "vendor-flags"
//! type = 0x100
//! word_address = 0x30
//! block_size = 2
//! word_mask = "0x00FF"
//! ```
//!
//! Numbers may be integers or `0x`-prefixed hex strings. `type` is either
//! a known block type name or a raw numeric tag.

use std::fmt;
use std::format;
use std::fs;
use std::path::Path;
use std::string::{String, ToString};
use std::vec::Vec;

use super::{BlockDescriptor, BlockType};

/// Errors produced while loading a block table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The table file could not be read
    IoError,
    /// The TOML is malformed or a field has the wrong shape
    ParseError(String),
    /// `type` names no known block type
    UnknownBlockType(String),
    /// Two entries share a name
    DuplicateName(String),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IoError => write!(f, "failed to read block table"),
            Self::ParseError(msg) => write!(f, "invalid block table: {}", msg),
            Self::UnknownBlockType(name) => write!(f, "unknown block type: {}", name),
            Self::DuplicateName(name) => write!(f, "duplicate block name: {}", name),
        }
    }
}

impl std::error::Error for TableError {}

/// One named table entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    /// Name used to select the block
    pub name: String,
    /// Where the block lives
    pub desc: BlockDescriptor,
}

/// A device's protected-block table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockTable {
    entries: Vec<TableEntry>,
}

/// TOML table file structure
#[derive(Debug, serde::Deserialize)]
struct TomlTableFile {
    #[serde(default)]
    block: Vec<TomlBlock>,
}

/// Block definition in TOML
#[derive(Debug, serde::Deserialize)]
struct TomlBlock {
    name: String,
    #[serde(rename = "type")]
    block_type: TypeTag,
    #[serde(default)]
    pointer: bool,
    #[serde(deserialize_with = "deserialize_hex_u16")]
    word_address: u16,
    #[serde(default, deserialize_with = "deserialize_hex_u16")]
    pointed_word_offset: u16,
    #[serde(default, deserialize_with = "deserialize_hex_u16")]
    block_size: u16,
    #[serde(default = "full_mask", deserialize_with = "deserialize_hex_u16")]
    word_mask: u16,
}

#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum TypeTag {
    Int(u32),
    Str(String),
}

fn full_mask() -> u16 {
    0xFFFF
}

/// Deserialize a u16 that can be hex (0x...) or decimal
fn deserialize_hex_u16<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HexOrInt {
        Int(u32),
        Str(String),
    }

    let value = match HexOrInt::deserialize(deserializer)? {
        HexOrInt::Int(n) => n,
        HexOrInt::Str(s) => parse_number(&s).map_err(serde::de::Error::custom)?,
    };
    u16::try_from(value)
        .map_err(|_| serde::de::Error::custom(format!("{:#x} exceeds 16 bits", value)))
}

/// Parse a number that can be hex (0x...) or decimal
fn parse_number(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex: {}", e))
    } else {
        s.parse().map_err(|e| format!("invalid number: {}", e))
    }
}

fn parse_block_type(tag: &TypeTag) -> Result<BlockType, TableError> {
    match tag {
        TypeTag::Int(n) => Ok(BlockType::from_bits_retain(*n)),
        TypeTag::Str(s) => match s.trim() {
            "iscsi-boot-config" | "iscsi" => Ok(BlockType::ISCSI_BOOT_CONFIG),
            other => parse_number(other)
                .map(BlockType::from_bits_retain)
                .map_err(|_| TableError::UnknownBlockType(other.to_string())),
        },
    }
}

impl BlockTable {
    /// Load a table from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let content = fs::read_to_string(path).map_err(|_| TableError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parse a table from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, TableError> {
        let file: TomlTableFile = toml::from_str(content)
            .map_err(|e| TableError::ParseError(e.message().to_string()))?;

        let mut entries: Vec<TableEntry> = Vec::with_capacity(file.block.len());
        for block in file.block {
            if entries.iter().any(|e| e.name == block.name) {
                return Err(TableError::DuplicateName(block.name));
            }

            let block_type = parse_block_type(&block.block_type)?;
            let desc = BlockDescriptor {
                block_type,
                has_pointer: block.pointer,
                word_address: block.word_address,
                pointed_word_offset: block.pointed_word_offset,
                block_size: block.block_size,
                word_mask: block.word_mask,
            };
            entries.push(TableEntry {
                name: block.name,
                desc,
            });
        }

        Ok(Self { entries })
    }

    /// All entries in file order
    pub fn entries(&self) -> &[TableEntry] {
        &self.entries
    }

    /// Descriptors in file order, for the table filter
    pub fn descriptors(&self) -> Vec<BlockDescriptor> {
        self.entries.iter().map(|e| e.desc).collect()
    }

    /// Find an entry by name
    pub fn find(&self, name: &str) -> Option<&TableEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
