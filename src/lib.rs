pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod memory;
pub mod translation;

// Re-export commonly used items for convenience
pub use config::MmuConfig;
pub use error::{BuildError, ConfigError, Fault};
pub use memory::{PageTable, PageTableEntry, PteFlags};
pub use translation::{translate, Mmu, Translation, TranslationConstants, VirtualAddress};
