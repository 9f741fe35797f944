use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

/// Rejected configuration. Raised before any table is built.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("address_space_bits should be between 1 and 32, got {0}")]
    AddressSpaceBits(u32),

    #[error("page_bytes should be between 1 and 4096, got {0}")]
    PageBytes(u32),

    #[error("page_bytes must be a power of two, got {0}")]
    NotPowerOfTwo(u32),

    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

/// Failure to produce a page table.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("page table with {entries} entries cannot be allocated")]
    ResourceExhaustion {
        entries: u64,
        #[source]
        source: TryReserveError,
    },

    #[error("page table with {entries} entries does not fit the host address space")]
    TooLarge { entries: u64 },
}

/// Why a translation produced no physical address.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    #[error("segmentation fault")]
    NotValid,

    #[error("protection fault")]
    NotAccessible,

    #[error("address out of range")]
    OutOfRange,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty query")]
    Empty,

    #[error("invalid hexadecimal address: {0}")]
    InvalidHex(String),
}
