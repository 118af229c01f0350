pub mod address;
pub mod store;

pub use address::{Address, AddressSpace, DataType};
pub use store::{MemoryStore, StoreGuard, Value};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressingMode {
    Bit,
    Byte,
    Word,
    #[serde(rename = "doubleword")]
    DoubleWord,
}

/// A named partition of the simulated address space with its own
/// addressing rules. Every valid address resolves into exactly one area and
/// is bounds-checked against `size_bytes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryArea {
    /// Symbolic area identifier (`"I"`, `"Q"`, `"M"`, `"DB1"`, `"HR"`, ...).
    pub code: String,

    /// Addressing granularities this area accepts.
    pub modes: Vec<AddressingMode>,

    /// Capacity in bytes.
    pub size_bytes: usize,

    /// Whether values would survive a power cycle on real hardware.
    /// Informational only; the simulator never persists anything.
    #[serde(default)]
    pub retentive: bool,

    /// Legacy data areas expose whole registers only: bit decomposition is
    /// rejected at the protocol layer even though the raw store could do it.
    #[serde(default)]
    pub word_only: bool,

    /// Plain numeric offsets in symbolic addresses count 16-bit words
    /// instead of bytes (FINS `D100` / Modbus holding-register style).
    #[serde(default)]
    pub word_addressed: bool,
}

impl MemoryArea {
    pub fn supports(&self, mode: AddressingMode) -> bool {
        self.modes.contains(&mode)
    }
}
