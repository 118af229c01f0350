use super::address::{Address, AddressSpace, DataType};
use crate::error::SimError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// A typed register value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    F32(f32),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Bool(_) => DataType::Bool,
            Value::U8(_) => DataType::Uint8,
            Value::I16(_) => DataType::Int16,
            Value::U16(_) => DataType::Uint16,
            Value::I32(_) => DataType::Int32,
            Value::U32(_) => DataType::Uint32,
            Value::F32(_) => DataType::Float32,
        }
    }

    pub fn as_bool(&self) -> bool {
        match *self {
            Value::Bool(b) => b,
            other => other.as_f64() != 0.0,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Bool(b) => f64::from(u8::from(b)),
            Value::U8(v) => f64::from(v),
            Value::I16(v) => f64::from(v),
            Value::U16(v) => f64::from(v),
            Value::I32(v) => f64::from(v),
            Value::U32(v) => f64::from(v),
            Value::F32(v) => f64::from(v),
        }
    }

    /// Convert a numeric value into the representation a data type expects.
    /// Integer targets round; out-of-range inputs saturate (`as` casts).
    pub fn from_f64(data_type: DataType, v: f64) -> Value {
        match data_type {
            DataType::Bool => Value::Bool(v != 0.0),
            DataType::Uint8 => Value::U8(v.round() as u8),
            DataType::Int16 => Value::I16(v.round() as i16),
            DataType::Uint16 => Value::U16(v.round() as u16),
            DataType::Int32 => Value::I32(v.round() as i32),
            DataType::Uint32 => Value::U32(v.round() as u32),
            DataType::Float32 => Value::F32(v as f32),
        }
    }

    /// The forced-safe value for a data type: false or zero.
    pub fn zero(data_type: DataType) -> Value {
        Value::from_f64(data_type, 0.0)
    }
}

/// The mutable backing store: one zero-initialized byte buffer per area.
///
/// The store is mechanism, not policy: any caller holding an `Address` may
/// write; read-only tag enforcement happens at the engine/adapter layer. A
/// single store-wide lock backs both the ad hoc accessors and the exclusive
/// guard used for composite updates, so a reader can never observe a torn
/// multi-byte value.
#[derive(Debug)]
pub struct MemoryStore {
    buffers: RwLock<Vec<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new(space: &AddressSpace) -> Self {
        let buffers = space
            .areas()
            .iter()
            .map(|area| vec![0u8; area.size_bytes])
            .collect();
        Self {
            buffers: RwLock::new(buffers),
        }
    }

    /// Exclusive critical section for composite updates (a full simulation
    /// tick, or a packed multi-field register write). Hold only for memory
    /// mutation; no I/O under the lock.
    pub fn lock(&self) -> StoreGuard<'_> {
        StoreGuard {
            buffers: self.buffers.write(),
        }
    }

    pub fn read_typed(&self, address: &Address) -> Value {
        read_typed(&self.buffers.read(), address)
    }

    pub fn write_typed(&self, address: &Address, value: Value) {
        write_typed(&mut self.buffers.write(), address, value);
    }

    /// Raw big-endian bytes at an address, as a protocol adapter would
    /// put them on the wire.
    pub fn read_bytes(&self, address: &Address) -> Vec<u8> {
        address.data_type().encode(self.read_typed(address))
    }

    /// Raw big-endian write; the byte count must match the data type.
    pub fn write_bytes(&self, address: &Address, bytes: &[u8]) -> Result<(), SimError> {
        let value = address.data_type().decode(bytes)?;
        self.write_typed(address, value);
        Ok(())
    }
}

/// Write access to every area buffer under the store-wide exclusive lock.
#[derive(Debug)]
pub struct StoreGuard<'a> {
    buffers: parking_lot::RwLockWriteGuard<'a, Vec<Vec<u8>>>,
}

impl StoreGuard<'_> {
    pub fn read_typed(&self, address: &Address) -> Value {
        read_typed(&self.buffers, address)
    }

    pub fn write_typed(&mut self, address: &Address, value: Value) {
        write_typed(&mut self.buffers, address, value);
    }

    /// Pack two 8-bit sub-fields (day/month, hour/minute style) into one
    /// 16-bit register in a single exclusive section, so the composed word
    /// is never observable half-written.
    pub fn write_packed_word(&mut self, address: &Address, high: u8, low: u8) {
        debug_assert_eq!(address.data_type().size_bytes(), 2);
        let buf = &mut self.buffers[address.area_index()];
        buf[address.byte_offset()] = high;
        buf[address.byte_offset() + 1] = low;
    }
}

fn read_typed(buffers: &[Vec<u8>], address: &Address) -> Value {
    let buf = &buffers[address.area_index()];
    let range = address.byte_range();
    match address.bit_index() {
        Some(bit) => Value::Bool(buf[address.byte_offset()] & (1 << bit) != 0),
        None => address
            .data_type()
            .decode(&buf[range])
            .unwrap_or(Value::U8(0)),
    }
}

fn write_typed(buffers: &mut [Vec<u8>], address: &Address, value: Value) {
    let buf = &mut buffers[address.area_index()];
    match address.bit_index() {
        Some(bit) => {
            // Mask/set a single bit; sibling bits stay untouched.
            let byte = &mut buf[address.byte_offset()];
            if value.as_bool() {
                *byte |= 1 << bit;
            } else {
                *byte &= !(1 << bit);
            }
        }
        None => {
            let encoded = address.data_type().encode(value);
            buf[address.byte_range()].copy_from_slice(&encoded);
        }
    }
}
