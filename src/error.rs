use crate::memory::DataType;
use thiserror::Error;

/// Error taxonomy for the register engine.
///
/// Everything except `AccessDenied` belongs to the invalid-address family:
/// caller fault, returned synchronously, never retried. Clamping of simulated
/// quantities is normal operation and never surfaces here, and `tick()` has
/// no failure path at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("unknown area code in `{0}`")]
    UnknownArea(String),

    #[error("offset {offset}+{len} exceeds area `{area}` size of {size} bytes")]
    OffsetOutOfRange {
        area: String,
        offset: usize,
        len: usize,
        size: usize,
    },

    #[error("data type {data_type:?} not supported by area `{area}`")]
    UnsupportedMode { area: String, data_type: DataType },

    #[error("bit index {0} outside 0..=7")]
    BitIndexOutOfRange(u8),

    #[error("area `{0}` is word-addressed only, bit access rejected")]
    WordOnlyArea(String),

    #[error("malformed address `{0}`")]
    Syntax(String),

    #[error("unknown tag `{0}`")]
    UnknownTag(String),

    #[error("tag `{0}` is read-only")]
    AccessDenied(String),

    #[error("expected {expected} bytes for {data_type:?}, got {got}")]
    ValueSize {
        data_type: DataType,
        expected: usize,
        got: usize,
    },
}

impl SimError {
    /// True for the whole invalid-address family of the error taxonomy.
    pub fn is_invalid_address(&self) -> bool {
        !matches!(self, SimError::AccessDenied(_))
    }

    /// Stable classification string used by protocol adapters.
    pub fn kind(&self) -> &'static str {
        if self.is_invalid_address() {
            "invalid_address"
        } else {
            "access_denied"
        }
    }
}
