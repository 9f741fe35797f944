//! Page-table entries and the single-level page table.

use bitflags::bitflags;
use tracing::debug;

use crate::config::MmuConfig;
use crate::constants::*;
use crate::error::BuildError;

bitflags! {
    /// Status bits held in the low field of a page-table entry.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct PteFlags: u64 {
        const VALID = VALID_MASK;
        const ACCESSIBLE = ACCESS_MASK;
    }
}

/// One page-table entry: frame number in bits [63:12], status bits in [1:0].
///
/// The all-zero entry is "not present".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct PageTableEntry(u64);

impl PageTableEntry {
    #[inline]
    pub fn new(frame: u64, flags: PteFlags) -> Self {
        PageTableEntry((frame << PFN_SHIFT) | flags.bits())
    }

    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        PageTableEntry(raw)
    }

    #[inline]
    pub fn raw(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.0 >> PFN_SHIFT
    }

    #[inline]
    pub fn flags(&self) -> PteFlags {
        PteFlags::from_bits_truncate(self.0)
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.flags().contains(PteFlags::VALID)
    }

    /// Only meaningful when [`is_valid`](Self::is_valid) holds.
    #[inline]
    pub fn is_accessible(&self) -> bool {
        self.flags().contains(PteFlags::ACCESSIBLE)
    }
}

impl std::fmt::Display for PageTableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PTE({:#x}) = (frame={}, valid={}, accessible={})",
            self.0,
            self.frame(),
            self.is_valid() as u8,
            self.is_accessible() as u8
        )
    }
}

/// Fallibly allocate `entries` not-present entries.
fn zeroed(entries: u64) -> Result<Vec<PageTableEntry>, BuildError> {
    let len = usize::try_from(entries).map_err(|_| BuildError::TooLarge { entries })?;

    let mut storage = Vec::new();
    storage
        .try_reserve_exact(len)
        .map_err(|source| BuildError::ResourceExhaustion { entries, source })?;
    storage.resize(len, PageTableEntry::default());
    Ok(storage)
}

/// Page table indexed by virtual page number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTable {
    entries: Vec<PageTableEntry>,
}

impl PageTable {
    /// Allocate a zero-filled table sized for `config`. Every entry is not present.
    pub fn empty(config: &MmuConfig) -> Result<Self, BuildError> {
        Ok(PageTable { entries: zeroed(config.table_len())? })
    }

    /// Allocate and seed a table for `config`.
    ///
    /// The first half of the VPNs map to frame `vpn * 2`; those whose VPN is a
    /// multiple of 4 are valid but inaccessible. The upper half stays unmapped.
    pub fn build(config: &MmuConfig) -> Result<Self, BuildError> {
        let mut table = Self::empty(config)?;
        debug!(
            entries = table.len(),
            entry_bytes = config.entry_bytes(),
            "allocated page table"
        );

        let populated = table.len() / 2;
        for (vpn, entry) in table.entries[..populated].iter_mut().enumerate() {
            let mut flags = PteFlags::VALID;
            if vpn % 4 != 0 {
                flags |= PteFlags::ACCESSIBLE;
            }
            *entry = PageTableEntry::new(vpn as u64 * 2, flags);
        }
        debug!(populated, "seeded page table");

        Ok(table)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `vpn`, or `None` past the end of the table.
    #[inline]
    pub fn get(&self, vpn: usize) -> Option<PageTableEntry> {
        self.entries.get(vpn).copied()
    }

    /// Replace the entry for `vpn`. Returns the previous entry, or `None` if
    /// `vpn` is out of range (the table is left untouched).
    pub fn set(&mut self, vpn: usize, entry: PageTableEntry) -> Option<PageTableEntry> {
        let slot = self.entries.get_mut(vpn)?;
        Some(std::mem::replace(slot, entry))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageTableEntry> {
        self.entries.iter()
    }

    pub fn mapped_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_valid()).count()
    }
}
