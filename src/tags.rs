use crate::error::SimError;
use crate::memory::{Address, StoreGuard, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// A symbolic, typed, scaled binding from a human-meaningful name to a raw
/// address. Built once at startup from configuration; only the underlying
/// memory values mutate afterwards.
///
/// Scaling convention follows the point maps of the emulated devices:
/// `engineering = raw * scale`. A register holding tenths of a volt carries
/// `scale = 0.1`.
#[derive(Debug, Clone)]
pub struct Tag {
    pub name: String,
    pub address: Address,
    pub access: AccessMode,
    pub scale: f64,
    pub default: f64,
}

impl Tag {
    pub fn engineering_from_raw(&self, raw: Value) -> f64 {
        raw.as_f64() * self.scale
    }

    pub fn raw_from_engineering(&self, engineering: f64) -> Value {
        Value::from_f64(self.address.data_type(), engineering / self.scale)
    }
}

/// Name-indexed tag registry.
#[derive(Debug, Clone, Default)]
pub struct TagTable {
    tags: Vec<Tag>,
    by_name: HashMap<String, usize>,
}

impl TagTable {
    pub fn new(tags: Vec<Tag>) -> Self {
        let by_name = tags
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.clone(), i))
            .collect();
        Self { tags, by_name }
    }

    pub fn get(&self, name: &str) -> Result<&Tag, SimError> {
        self.by_name
            .get(name)
            .map(|&i| &self.tags[i])
            .ok_or_else(|| SimError::UnknownTag(name.into()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// The read-only tag (if any) whose backing storage overlaps `address`.
    /// The adapter contract rejects raw writes that would land on one.
    pub fn read_only_overlap(&self, address: &Address) -> Option<&Tag> {
        self.tags
            .iter()
            .find(|t| t.access == AccessMode::ReadOnly && t.address.overlaps(address))
    }

    /// Project each tag's default engineering value onto freshly
    /// zero-initialized memory.
    pub fn apply_defaults(&self, guard: &mut StoreGuard<'_>) {
        for tag in &self.tags {
            if tag.default != 0.0 {
                guard.write_typed(&tag.address, tag.raw_from_engineering(tag.default));
            }
        }
    }
}
