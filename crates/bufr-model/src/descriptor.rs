//! BUFR descriptors (FXXYYY).
//!
//! A descriptor is stored as its six-digit decimal value, so `001002`
//! (WMO station number) is `Descriptor(1002)` and the sequence `301011`
//! is `Descriptor(301011)`. On the wire it is packed into 16 bits:
//! F in 2 bits, X in 6 bits, Y in 8 bits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// Descriptor class, taken from the F digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DescriptorKind {
    /// F=0: Table B element.
    Element,
    /// F=1: replication.
    Replication,
    /// F=2: operator.
    Operator,
    /// F=3: Table D sequence.
    Sequence,
}

impl DescriptorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptorKind::Element => "element",
            DescriptorKind::Replication => "replication",
            DescriptorKind::Operator => "operator",
            DescriptorKind::Sequence => "sequence",
        }
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Descriptor(u32);

impl Descriptor {
    /// Build a descriptor from its F, X and Y parts.
    ///
    /// Returns `None` when a part is out of range (F ≤ 3, X ≤ 63, Y ≤ 255).
    pub fn from_fxy(f: u8, x: u8, y: u8) -> Option<Self> {
        if f > 3 || x > 63 {
            return None;
        }
        Some(Self(u32::from(f) * 100_000 + u32::from(x) * 1_000 + u32::from(y)))
    }

    /// Build a descriptor from its six-digit decimal value.
    pub fn from_code(code: u32) -> Option<Self> {
        let f = code / 100_000;
        let x = (code / 1_000) % 100;
        let y = code % 1_000;
        if f > 3 || x > 63 || y > 255 {
            return None;
        }
        Some(Self(code))
    }

    /// Unpack a descriptor from its 16-bit wire form.
    pub fn from_packed(packed: u16) -> Self {
        let f = (packed >> 14) as u32;
        let x = ((packed >> 8) & 0x3f) as u32;
        let y = (packed & 0xff) as u32;
        Self(f * 100_000 + x * 1_000 + y)
    }

    /// Pack into the 16-bit wire form.
    pub fn packed(self) -> u16 {
        (u16::from(self.f()) << 14) | (u16::from(self.x()) << 8) | u16::from(self.y())
    }

    pub fn code(self) -> u32 {
        self.0
    }

    pub fn f(self) -> u8 {
        (self.0 / 100_000) as u8
    }

    pub fn x(self) -> u8 {
        ((self.0 / 1_000) % 100) as u8
    }

    pub fn y(self) -> u8 {
        (self.0 % 1_000) as u8
    }

    pub fn kind(self) -> DescriptorKind {
        match self.f() {
            0 => DescriptorKind::Element,
            1 => DescriptorKind::Replication,
            2 => DescriptorKind::Operator,
            _ => DescriptorKind::Sequence,
        }
    }

    pub fn is_element(self) -> bool {
        self.kind() == DescriptorKind::Element
    }

    pub fn is_sequence(self) -> bool {
        self.kind() == DescriptorKind::Sequence
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

impl FromStr for Descriptor {
    type Err = ModelError;

    /// Parse `FXXYYY` digits (leading zeros optional) or the dashed
    /// `F-XX-YYY` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ModelError::invalid_descriptor(s, "empty"));
        }
        let parts: Vec<&str> = trimmed.split('-').collect();
        if parts.len() == 3 {
            let parse_part = |part: &str| {
                part.parse::<u8>()
                    .map_err(|_| ModelError::invalid_descriptor(s, "non-numeric part"))
            };
            let (f, x, y) = (parse_part(parts[0])?, parse_part(parts[1])?, parse_part(parts[2])?);
            return Descriptor::from_fxy(f, x, y)
                .ok_or_else(|| ModelError::invalid_descriptor(s, "part out of range"));
        }
        if trimmed.len() > 6 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ModelError::invalid_descriptor(
                s,
                "expected up to six decimal digits",
            ));
        }
        let code: u32 = trimmed
            .parse()
            .map_err(|_| ModelError::invalid_descriptor(s, "not a number"))?;
        Descriptor::from_code(code).ok_or_else(|| ModelError::invalid_descriptor(s, "out of range"))
    }
}
