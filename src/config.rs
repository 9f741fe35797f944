//! MMU configuration: the `(address_space_bits, page_bytes)` pair and the
//! page-table geometry derived from it.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::constants::*;
use crate::error::ConfigError;
use crate::memory::PageTableEntry;

/// A validated configuration. Cannot be constructed out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmuConfig {
    address_space_bits: u32,
    page_bytes: u32,
}

impl MmuConfig {
    pub fn new(address_space_bits: u32, page_bytes: u32) -> Result<Self, ConfigError> {
        if !(MIN_ADDRESS_SPACE_BITS..=MAX_ADDRESS_SPACE_BITS).contains(&address_space_bits) {
            return Err(ConfigError::AddressSpaceBits(address_space_bits));
        }
        if !(MIN_PAGE_BYTES..=MAX_PAGE_BYTES).contains(&page_bytes) {
            return Err(ConfigError::PageBytes(page_bytes));
        }
        if !page_bytes.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo(page_bytes));
        }
        Ok(MmuConfig { address_space_bits, page_bytes })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        PartialConfig::from_toml_str(content)?.resolve()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        PartialConfig::from_file(path)?.resolve()
    }

    pub fn address_space_bits(&self) -> u32 {
        self.address_space_bits
    }

    pub fn page_bytes(&self) -> u32 {
        self.page_bytes
    }

    /// log2(page_bytes): width of the in-page offset.
    #[inline]
    pub fn offset_bits(&self) -> u32 {
        self.page_bytes.trailing_zeros()
    }

    /// Number of VPN bits. Zero when a page covers the whole address space.
    #[inline]
    pub fn vpn_bits(&self) -> u32 {
        self.address_space_bits.saturating_sub(self.offset_bits())
    }

    /// Number of page-table entries, `2^vpn_bits`.
    #[inline]
    pub fn table_len(&self) -> u64 {
        1u64 << self.vpn_bits()
    }

    pub fn entry_bytes(&self) -> usize {
        size_of::<PageTableEntry>()
    }

    pub fn table_bytes(&self) -> u64 {
        self.table_len() * self.entry_bytes() as u64
    }
}

impl std::fmt::Display for MmuConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-bit address space, {}-byte pages ({} entries x {} bytes)",
            self.address_space_bits,
            self.page_bytes,
            self.table_len(),
            self.entry_bytes()
        )
    }
}

/// Configuration as read from a file or the command line, before validation.
/// Later sources override earlier ones through [`PartialConfig::merge`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub address_space_bits: Option<u32>,
    pub page_bytes: Option<u32>,
}

impl PartialConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn merge(self, other: PartialConfig) -> PartialConfig {
        PartialConfig {
            address_space_bits: other.address_space_bits.or(self.address_space_bits),
            page_bytes: other.page_bytes.or(self.page_bytes),
        }
    }

    pub fn resolve(self) -> Result<MmuConfig, ConfigError> {
        let bits = self
            .address_space_bits
            .ok_or(ConfigError::Missing("address_space_bits"))?;
        let page_bytes = self.page_bytes.ok_or(ConfigError::Missing("page_bytes"))?;
        MmuConfig::new(bits, page_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn test_accepts_bounds() {
        assert!(MmuConfig::new(1, 1).is_ok());
        assert!(MmuConfig::new(32, 4096).is_ok());
        assert!(MmuConfig::new(16, 256).is_ok());
    }

    #[test]
    fn test_rejects_address_space_bits_out_of_range() {
        assert!(matches!(MmuConfig::new(0, 4096), Err(ConfigError::AddressSpaceBits(0))));
        assert!(matches!(MmuConfig::new(33, 4096), Err(ConfigError::AddressSpaceBits(33))));
    }

    #[test]
    fn test_rejects_page_bytes_out_of_range() {
        assert!(matches!(MmuConfig::new(32, 0), Err(ConfigError::PageBytes(0))));
        assert!(matches!(MmuConfig::new(32, 8192), Err(ConfigError::PageBytes(8192))));
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(matches!(MmuConfig::new(32, 3000), Err(ConfigError::NotPowerOfTwo(3000))));
        assert!(matches!(MmuConfig::new(32, 6), Err(ConfigError::NotPowerOfTwo(6))));
    }

    #[test]
    fn test_range_checked_before_power_of_two() {
        // 5000 is neither in range nor a power of two
        assert!(matches!(MmuConfig::new(32, 5000), Err(ConfigError::PageBytes(5000))));
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    #[test]
    fn test_geometry_default_case() {
        let config = MmuConfig::new(32, 4096).unwrap();
        assert_eq!(config.offset_bits(), 12);
        assert_eq!(config.vpn_bits(), 20);
        assert_eq!(config.table_len(), 1 << 20);
        assert_eq!(config.entry_bytes(), 8);
        assert_eq!(config.table_bytes(), 8 << 20);
    }

    #[test]
    fn test_geometry_byte_pages() {
        let config = MmuConfig::new(8, 1).unwrap();
        assert_eq!(config.offset_bits(), 0);
        assert_eq!(config.table_len(), 256);
    }

    #[test]
    fn test_page_larger_than_address_space_has_single_entry() {
        let config = MmuConfig::new(4, 4096).unwrap();
        assert_eq!(config.vpn_bits(), 0);
        assert_eq!(config.table_len(), 1);
    }

    // =========================================================================
    // File / layering
    // =========================================================================

    #[test]
    fn test_from_toml_str() {
        let config = MmuConfig::from_toml_str("address_space_bits = 16\npage_bytes = 256\n").unwrap();
        assert_eq!(config.address_space_bits(), 16);
        assert_eq!(config.page_bytes(), 256);
    }

    #[test]
    fn test_from_toml_str_validates() {
        let err = MmuConfig::from_toml_str("address_space_bits = 40\npage_bytes = 256\n").unwrap_err();
        assert!(matches!(err, ConfigError::AddressSpaceBits(40)));
    }

    #[test]
    fn test_from_toml_str_missing_field() {
        let err = MmuConfig::from_toml_str("page_bytes = 256\n").unwrap_err();
        assert!(matches!(err, ConfigError::Missing("address_space_bits")));
    }

    #[test]
    fn test_from_toml_str_rejects_unknown_keys() {
        let err = MmuConfig::from_toml_str("page_size = 256\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_merge_prefers_later_source() {
        let file = PartialConfig { address_space_bits: Some(16), page_bytes: Some(256) };
        let cli = PartialConfig { address_space_bits: None, page_bytes: Some(4096) };
        let merged = file.merge(cli);
        assert_eq!(merged.address_space_bits, Some(16));
        assert_eq!(merged.page_bytes, Some(4096));
    }

    #[test]
    fn test_from_file_missing_is_io_error() {
        let err = MmuConfig::from_file("/nonexistent/mmu.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
