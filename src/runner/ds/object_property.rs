use std::fmt;
use std::fmt::{Display, Formatter};

use bitflags::bitflags;

use crate::runner::ds::value::JsValue;

/// Property identifier. Canonical array-index strings ("0", "17") are always stored as `Int`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Str(String),
    Int(u32),
}
impl PropertyKey {
    pub fn from_name(name: &str) -> Self {
        match name.parse::<u32>() {
            Ok(i) if i != u32::MAX && i.to_string() == name => PropertyKey::Int(i),
            _ => PropertyKey::Str(name.to_string()),
        }
    }

    /// Integral, non-negative numbers below 2^32-1 become index keys.
    pub fn from_number(n: f64) -> Self {
        if n >= 0.0 && n < u32::MAX as f64 && n.fract() == 0.0 {
            PropertyKey::Int(n as u32)
        } else {
            PropertyKey::from_name(&crate::runner::ds::operations::type_conversion::number_to_string(n))
        }
    }

    pub fn as_index(&self) -> Option<u32> {
        match self {
            PropertyKey::Int(i) => Some(*i),
            PropertyKey::Str(_) => None,
        }
    }
}
impl Display for PropertyKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Str(s) => write!(f, "{}", s),
            PropertyKey::Int(i) => write!(f, "{}", i),
        }
    }
}
impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        PropertyKey::from_name(name)
    }
}
impl From<String> for PropertyKey {
    fn from(name: String) -> Self {
        PropertyKey::from_name(&name)
    }
}
impl From<u32> for PropertyKey {
    fn from(i: u32) -> Self {
        PropertyKey::Int(i)
    }
}

bitflags! {
    /// Per-property attribute bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PropertyAttributes: u8 {
        /// Assignment is silently ignored.
        const READONLY = 0x01;
        /// Skipped by enumeration.
        const DONTENUM = 0x02;
        /// Deletion is refused.
        const PERMANENT = 0x04;
    }
}

#[derive(Debug, Clone)]
pub struct PropertySlot {
    pub value: JsValue,
    pub attributes: PropertyAttributes,
}
impl PropertySlot {
    pub fn new(value: JsValue, attributes: PropertyAttributes) -> Self {
        PropertySlot { value, attributes }
    }

    pub fn is_enumerable(&self) -> bool {
        !self.attributes.contains(PropertyAttributes::DONTENUM)
    }
}
