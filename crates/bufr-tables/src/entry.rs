//! Table B and Table D entries.

use std::fmt;

use bufr_model::Descriptor;
use serde::Serialize;

/// Concrete value type implied by a Table B encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    String,
    Int32,
    Int64,
    Float32,
    Float64,
}

/// Coarse classification used when interpreting search keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValueClass {
    String,
    Integer,
    Float,
}

impl ValueType {
    pub fn class(self) -> ValueClass {
        match self {
            ValueType::String => ValueClass::String,
            ValueType::Int32 | ValueType::Int64 => ValueClass::Integer,
            ValueType::Float32 | ValueType::Float64 => ValueClass::Float,
        }
    }
}

impl fmt::Display for ValueClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueClass::String => "string",
            ValueClass::Integer => "integer",
            ValueClass::Float => "float",
        };
        write!(f, "{name}")
    }
}

/// How an element is encoded in the data section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Encoding {
    pub unit: String,
    /// Decimal scale: the stored integer is `value * 10^scale`.
    pub scale: i32,
    pub reference: i64,
    /// Width in bits.
    pub width: u16,
}

impl Encoding {
    pub fn is_string(&self) -> bool {
        is_string_unit(&self.unit)
    }

    /// Value type of decoded values.
    ///
    /// Character units decode to strings, positive scales to floats and
    /// everything else to integers; wide fields use the 64-bit variants.
    pub fn value_type(&self) -> ValueType {
        if self.is_string() {
            ValueType::String
        } else if self.scale > 0 {
            if self.width > 32 {
                ValueType::Float64
            } else {
                ValueType::Float32
            }
        } else if self.width > 32 {
            ValueType::Int64
        } else {
            ValueType::Int32
        }
    }

    /// Raw value reserved for "missing" (all bits set).
    pub fn missing_raw(&self) -> u64 {
        all_ones(self.width)
    }
}

pub(crate) fn is_string_unit(unit: &str) -> bool {
    let unit = unit.trim();
    unit.eq_ignore_ascii_case("CCITT IA5") || unit.eq_ignore_ascii_case("CCITT_IA5")
}

pub(crate) fn all_ones(width: u16) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableBEntry {
    pub descriptor: Descriptor,
    pub name: String,
    pub encoding: Encoding,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDEntry {
    pub descriptor: Descriptor,
    pub name: String,
    pub members: Vec<Descriptor>,
}
