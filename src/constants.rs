// PTE bit layout: frame number above a 12-bit field, status bits at the bottom
pub const PFN_SHIFT: u32 = 12;
pub const VALID_MASK: u64 = 0b01;
pub const ACCESS_MASK: u64 = 0b10;

pub const MIN_ADDRESS_SPACE_BITS: u32 = 1;
pub const MAX_ADDRESS_SPACE_BITS: u32 = 32;
pub const MIN_PAGE_BYTES: u32 = 1;
pub const MAX_PAGE_BYTES: u32 = 4096;

/// `-1` read as an unsigned 32-bit value ends the query stream.
pub const EXIT_SENTINEL: u32 = 0xFFFF_FFFF;

/// Batch output value for any faulted translation.
pub const INVALID_ADDRESS: i64 = -1;
