//! Error types for nicnvm-core
//!
//! This module provides a no_std compatible error type shared by every
//! layer of the NVM engine. Lower layers return these kinds unchanged and
//! upper layers propagate them verbatim.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Offset, word count, descriptor or buffer is out of range or missing
    InvalidArgument,
    /// Destination buffer is smaller than the data to be returned
    NoSpace,
    /// A bounded polling loop exhausted its attempt budget
    ///
    /// Covers the arbitration grant, the SPI status-ready poll and the
    /// register-polled completion flag.
    Timeout,
    /// The PBA string section length word is absent or corrupt
    SectionInvalid,
    /// A pointer-indirected record was never allocated (pointer reads 0xFFFF)
    RecordUnallocated,
    /// The NVM word checksum does not sum to the expected constant
    ChecksumMismatch,
    /// Generic failure reported by the underlying read/write primitive
    NvmIo,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::NoSpace => write!(f, "destination buffer too small"),
            Self::Timeout => write!(f, "NVM operation timed out"),
            Self::SectionInvalid => write!(f, "PBA section has an invalid length"),
            Self::RecordUnallocated => write!(f, "NVM record is not allocated"),
            Self::ChecksumMismatch => write!(f, "NVM checksum is invalid"),
            Self::NvmIo => write!(f, "NVM I/O error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
