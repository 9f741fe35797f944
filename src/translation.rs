use tracing::trace;

use crate::config::MmuConfig;
use crate::constants::*;
use crate::error::{BuildError, Fault};
use crate::memory::PageTable;

/// Per-configuration constants used to split a virtual address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationConstants {
    /// Width of the in-page offset, log2(page_bytes).
    pub shift: u32,
    pub offset_mask: u32,
    /// Every bit above the offset. Bits beyond the address space are kept so
    /// that oversized addresses land past the end of the table.
    pub vpn_mask: u32,
}

impl TranslationConstants {
    pub fn new(config: &MmuConfig) -> Self {
        let shift = config.offset_bits();
        let offset_mask = (1u32 << shift) - 1;
        TranslationConstants { shift, offset_mask, vpn_mask: !offset_mask }
    }
}

/// Represents the decomposed components of a virtual address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub va: u32,
    pub vpn: u32,
    pub offset: u32,
}

impl VirtualAddress {
    /// Split `va` into VPN and offset. The VPN bits are masked before shifting.
    #[inline]
    pub fn decompose(va: u32, consts: &TranslationConstants) -> Self {
        let vpn = (va & consts.vpn_mask) >> consts.shift;
        let offset = va & consts.offset_mask;
        VirtualAddress { va, vpn, offset }
    }
}

impl std::fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VA({:#x}) = (vpn={}, offset={:#x})", self.va, self.vpn, self.offset)
    }
}

/// Translate a virtual address to a physical address.
///
/// Checks run in a fixed order: bounds, validity, then accessibility. An
/// invalid entry is reported as [`Fault::NotValid`] without looking at its
/// other bits.
pub fn translate(
    table: &PageTable,
    consts: &TranslationConstants,
    virtual_address: u32,
) -> Result<u32, Fault> {
    let va = VirtualAddress::decompose(virtual_address, consts);

    let Some(pte) = table.get(va.vpn as usize) else {
        trace!(va = va.va, vpn = va.vpn, len = table.len(), "vpn past end of table");
        return Err(Fault::OutOfRange);
    };

    if !pte.is_valid() {
        trace!(va = va.va, vpn = va.vpn, "entry not valid");
        return Err(Fault::NotValid);
    }
    if !pte.is_accessible() {
        trace!(va = va.va, vpn = va.vpn, "entry not accessible");
        return Err(Fault::NotAccessible);
    }

    // physical addresses are 32 bits wide
    let pa = ((pte.frame() << consts.shift) | va.offset as u64) as u32;
    trace!(va = va.va, vpn = va.vpn, frame = pte.frame(), pa, "translated");
    Ok(pa)
}

/// Outcome of translating one query address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    pub virtual_address: VirtualAddress,
    pub outcome: Result<u32, Fault>,
}

impl Translation {
    /// Batch output value: the physical address, or -1 for any fault.
    pub fn to_output(&self) -> i64 {
        match self.outcome {
            Ok(pa) => pa as i64,
            Err(_) => INVALID_ADDRESS,
        }
    }
}

impl std::fmt::Display for Translation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Virtual address: {:#x} -> ", self.virtual_address.va)?;
        match self.outcome {
            Ok(pa) => write!(f, "Physical address: {:#x}", pa),
            Err(Fault::NotValid) => write!(f, "Segmentation Fault."),
            Err(Fault::NotAccessible) => write!(f, "Protection Fault."),
            Err(Fault::OutOfRange) => write!(f, "Address Out Of Range."),
        }
    }
}

/// Immutable translation context: the configuration, its page table and the
/// derived constants.
#[derive(Debug, Clone)]
pub struct Mmu {
    config: MmuConfig,
    table: PageTable,
    consts: TranslationConstants,
}

impl Mmu {
    /// Build the seeded page table for `config`.
    pub fn new(config: MmuConfig) -> Result<Self, BuildError> {
        let table = PageTable::build(&config)?;
        Ok(Self::with_table(config, table))
    }

    /// Wrap an existing table. `table` must have been sized for `config`.
    pub fn with_table(config: MmuConfig, table: PageTable) -> Self {
        let consts = TranslationConstants::new(&config);
        Mmu { config, table, consts }
    }

    #[inline]
    pub fn translate(&self, virtual_address: u32) -> Result<u32, Fault> {
        translate(&self.table, &self.consts, virtual_address)
    }

    pub fn query(&self, virtual_address: u32) -> Translation {
        Translation {
            virtual_address: VirtualAddress::decompose(virtual_address, &self.consts),
            outcome: self.translate(virtual_address),
        }
    }

    pub fn translate_batch(&self, vas: &[u32]) -> Vec<Translation> {
        vas.iter().map(|&va| self.query(va)).collect()
    }

    pub fn config(&self) -> &MmuConfig {
        &self.config
    }

    pub fn table(&self) -> &PageTable {
        &self.table
    }

    pub fn constants(&self) -> &TranslationConstants {
        &self.consts
    }
}
