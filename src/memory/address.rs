use super::store::Value;
use super::{AddressingMode, MemoryArea};
use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Register data types. All multi-byte types are laid out big-endian on the
/// wire and in the store, matching both emulated protocol families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Bool,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
}

impl DataType {
    pub fn size_bytes(&self) -> usize {
        match self {
            DataType::Bool | DataType::Uint8 => 1,
            DataType::Int16 | DataType::Uint16 => 2,
            DataType::Int32 | DataType::Uint32 | DataType::Float32 => 4,
        }
    }

    /// Addressing granularity an area must support for this type.
    pub fn required_mode(&self) -> AddressingMode {
        match self {
            DataType::Bool => AddressingMode::Bit,
            DataType::Uint8 => AddressingMode::Byte,
            DataType::Int16 | DataType::Uint16 => AddressingMode::Word,
            DataType::Int32 | DataType::Uint32 | DataType::Float32 => AddressingMode::DoubleWord,
        }
    }

    /// Big-endian encoding. Booleans encode as a single 0/1 byte; the
    /// bit-level mask/set path lives in the store, not here.
    pub fn encode(&self, value: Value) -> Vec<u8> {
        match (self, value) {
            (DataType::Bool, v) => vec![u8::from(v.as_bool())],
            (DataType::Uint8, v) => vec![v.as_f64() as u8],
            (DataType::Int16, v) => (v.as_f64() as i16).to_be_bytes().to_vec(),
            (DataType::Uint16, v) => (v.as_f64() as u16).to_be_bytes().to_vec(),
            (DataType::Int32, v) => (v.as_f64() as i32).to_be_bytes().to_vec(),
            (DataType::Uint32, v) => (v.as_f64() as u32).to_be_bytes().to_vec(),
            (DataType::Float32, v) => (v.as_f64() as f32).to_be_bytes().to_vec(),
        }
    }

    /// Big-endian decoding. Fails only on a length mismatch.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value, SimError> {
        let expected = self.size_bytes();
        if bytes.len() != expected {
            return Err(SimError::ValueSize {
                data_type: *self,
                expected,
                got: bytes.len(),
            });
        }
        Ok(match self {
            DataType::Bool => Value::Bool(bytes[0] != 0),
            DataType::Uint8 => Value::U8(bytes[0]),
            DataType::Int16 => Value::I16(i16::from_be_bytes([bytes[0], bytes[1]])),
            DataType::Uint16 => Value::U16(u16::from_be_bytes([bytes[0], bytes[1]])),
            DataType::Int32 => Value::I32(i32::from_be_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ])),
            DataType::Uint32 => Value::U32(u32::from_be_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ])),
            DataType::Float32 => Value::F32(f32::from_be_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
            ])),
        })
    }
}

/// A fully resolved location: area handle, byte offset, optional bit index
/// and data type. Only `AddressSpace` constructs these, so downstream code
/// can rely on bounds and addressing-mode checks having already happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Address {
    area: usize,
    byte_offset: usize,
    bit_index: Option<u8>,
    data_type: DataType,
}

impl Address {
    pub fn area_index(&self) -> usize {
        self.area
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn bit_index(&self) -> Option<u8> {
        self.bit_index
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Byte range this address occupies within its area.
    pub fn byte_range(&self) -> core::ops::Range<usize> {
        self.byte_offset..self.byte_offset + self.data_type.size_bytes()
    }

    /// Whether two addresses touch overlapping storage. Bit-level addresses
    /// in the same byte only collide when they name the same bit.
    pub fn overlaps(&self, other: &Address) -> bool {
        if self.area != other.area {
            return false;
        }
        let a = self.byte_range();
        let b = other.byte_range();
        if a.start >= b.end || b.start >= a.end {
            return false;
        }
        match (self.bit_index, other.bit_index) {
            (Some(x), Some(y)) => x == y,
            _ => true,
        }
    }
}

/// The set of configured memory areas plus the symbolic-address parser.
///
/// Symbolic syntax follows the S7 family with a FINS/Modbus extension for
/// word-addressed areas:
///
/// - `I0.3`, `Q1.0`, `M10.1` — bit within a byte
/// - `MW10`, `DB1.DBW4` — 16-bit word at a byte offset
/// - `DB1.DBD0` — 32-bit word (int or float, per requested type)
/// - `DB1.DBB6` — single byte
/// - `DB1.DBX6.0` — bit within a data block
/// - `D100`, `HR4097` — plain numeric offset; counts 16-bit words when the
///   area is flagged `word_addressed`, bytes otherwise
#[derive(Debug, Clone)]
pub struct AddressSpace {
    areas: Vec<MemoryArea>,
}

impl AddressSpace {
    pub fn new(areas: Vec<MemoryArea>) -> Self {
        Self { areas }
    }

    pub fn areas(&self) -> &[MemoryArea] {
        &self.areas
    }

    pub fn area(&self, index: usize) -> &MemoryArea {
        &self.areas[index]
    }

    fn find_area(&self, code: &str) -> Option<usize> {
        self.areas
            .iter()
            .position(|a| a.code.eq_ignore_ascii_case(code))
    }

    /// Longest configured area code that prefixes `symbol`.
    fn match_prefix(&self, symbol: &str) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        for (idx, area) in self.areas.iter().enumerate() {
            let code = &area.code;
            if symbol.len() >= code.len()
                && symbol[..code.len()].eq_ignore_ascii_case(code)
                && best.map_or(true, |(_, len)| code.len() > len)
            {
                best = Some((idx, code.len()));
            }
        }
        best
    }

    /// Parse and validate a symbolic address against the requested data type.
    pub fn resolve(&self, symbol: &str, data_type: DataType) -> Result<Address, SimError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(SimError::Syntax(symbol.into()));
        }

        // Dotted form with an explicit area prefix, e.g. `DB1.DBW4`.
        if let Some(dot) = symbol.find('.') {
            let head = &symbol[..dot];
            if let Some(area_idx) = self.find_area(head) {
                let rest = &symbol[dot + 1..];
                let tail = if rest.len() >= 2 && rest[..2].eq_ignore_ascii_case("DB") {
                    &rest[2..]
                } else {
                    rest
                };
                let loc = parse_locator(symbol, tail)?;
                return self.build(symbol, area_idx, loc, data_type, false);
            }
        }

        // Prefix form, e.g. `I0.3`, `MW10`, `D100`.
        let (area_idx, code_len) = self
            .match_prefix(symbol)
            .ok_or_else(|| SimError::UnknownArea(symbol.into()))?;
        let loc = parse_locator(symbol, &symbol[code_len..])?;
        let plain = loc.width.is_none();
        self.build(symbol, area_idx, loc, data_type, plain)
    }

    /// Construct a pre-parsed address, running the same validation as
    /// `resolve`. Offsets are byte offsets.
    pub fn make_address(
        &self,
        code: &str,
        byte_offset: usize,
        bit_index: Option<u8>,
        data_type: DataType,
    ) -> Result<Address, SimError> {
        let area_idx = self
            .find_area(code)
            .ok_or_else(|| SimError::UnknownArea(code.into()))?;
        self.validate(area_idx, byte_offset, bit_index, data_type)
    }

    fn build(
        &self,
        symbol: &str,
        area_idx: usize,
        loc: Locator,
        data_type: DataType,
        word_scaled: bool,
    ) -> Result<Address, SimError> {
        // Width specifiers must agree with the requested type.
        if let Some(width) = loc.width {
            let matches = match width {
                'X' => data_type == DataType::Bool,
                'B' => data_type.size_bytes() == 1 && data_type != DataType::Bool,
                'W' => data_type.size_bytes() == 2,
                'D' => data_type.size_bytes() == 4,
                _ => false,
            };
            if !matches {
                return Err(SimError::Syntax(symbol.into()));
            }
        }

        if data_type == DataType::Bool && loc.bit.is_none() {
            return Err(SimError::Syntax(symbol.into()));
        }
        if data_type != DataType::Bool && loc.bit.is_some() {
            return Err(SimError::Syntax(symbol.into()));
        }

        let area = &self.areas[area_idx];
        let byte_offset = if word_scaled && area.word_addressed {
            // A word offset large enough to overflow the byte conversion
            // cannot be in bounds for any area.
            loc.offset
                .checked_mul(2)
                .ok_or_else(|| SimError::OffsetOutOfRange {
                    area: area.code.clone(),
                    offset: loc.offset,
                    len: data_type.size_bytes(),
                    size: area.size_bytes,
                })?
        } else {
            loc.offset
        };
        self.validate(area_idx, byte_offset, loc.bit, data_type)
    }

    fn validate(
        &self,
        area_idx: usize,
        byte_offset: usize,
        bit_index: Option<u8>,
        data_type: DataType,
    ) -> Result<Address, SimError> {
        let area = &self.areas[area_idx];

        if let Some(bit) = bit_index {
            if bit > 7 {
                return Err(SimError::BitIndexOutOfRange(bit));
            }
        }

        // Bit access to a whole-register-only legacy area is rejected
        // outright rather than degraded to read-modify-write.
        if data_type == DataType::Bool && area.word_only {
            return Err(SimError::WordOnlyArea(area.code.clone()));
        }

        if !area.supports(data_type.required_mode()) {
            return Err(SimError::UnsupportedMode {
                area: area.code.clone(),
                data_type,
            });
        }

        let len = data_type.size_bytes();
        let in_bounds = byte_offset
            .checked_add(len)
            .map_or(false, |end| end <= area.size_bytes);
        if !in_bounds {
            return Err(SimError::OffsetOutOfRange {
                area: area.code.clone(),
                offset: byte_offset,
                len,
                size: area.size_bytes,
            });
        }

        let bit_index = if data_type == DataType::Bool {
            Some(bit_index.unwrap_or(0))
        } else {
            None
        };

        Ok(Address {
            area: area_idx,
            byte_offset,
            bit_index,
            data_type,
        })
    }
}

struct Locator {
    width: Option<char>,
    offset: usize,
    bit: Option<u8>,
}

/// Parse the locator tail of a symbolic address: optional width letter
/// (`X`/`B`/`W`/`D`), decimal offset, optional `.bit`.
fn parse_locator(symbol: &str, tail: &str) -> Result<Locator, SimError> {
    let syntax = || SimError::Syntax(symbol.into());
    let mut rest = tail;

    let width = match rest.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => {
            let upper = c.to_ascii_uppercase();
            if !matches!(upper, 'X' | 'B' | 'W' | 'D') {
                return Err(syntax());
            }
            rest = &rest[1..];
            Some(upper)
        }
        _ => None,
    };

    let (num, bit) = match rest.split_once('.') {
        Some((num, bit_str)) => {
            let bit: u8 = bit_str.parse().map_err(|_| syntax())?;
            (num, Some(bit))
        }
        None => (rest, None),
    };

    if num.is_empty() || !num.bytes().all(|b| b.is_ascii_digit()) {
        return Err(syntax());
    }
    let offset: usize = num.parse().map_err(|_| syntax())?;

    Ok(Locator { width, offset, bit })
}
