// crates/canopen-rs/src/od/value.rs

use crate::types::{
    BOOLEAN, INTEGER8, INTEGER16, INTEGER32, INTEGER64, REAL32, REAL64, UNSIGNED8, UNSIGNED16,
    UNSIGNED32, UNSIGNED64,
};
use alloc::{string::String, vec::Vec};
use core::cmp::Ordering;
use core::mem;

/// Represents any value that can be stored in an Object Dictionary entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectValue {
    Boolean(BOOLEAN), // Actually u8
    Integer8(INTEGER8),
    Integer16(INTEGER16),
    Integer32(INTEGER32),
    Integer64(INTEGER64),
    Unsigned8(UNSIGNED8),
    Unsigned16(UNSIGNED16),
    Unsigned32(UNSIGNED32),
    Unsigned64(UNSIGNED64),
    Real32(REAL32),
    Real64(REAL64),
    VisibleString(String),
    OctetString(Vec<u8>),
    Domain(Vec<u8>), // Large binary data
}

impl ObjectValue {
    /// Serializes the inner value into a little-endian byte vector.
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            ObjectValue::Boolean(v) => v.to_le_bytes().to_vec(),
            ObjectValue::Integer8(v) => v.to_le_bytes().to_vec(),
            ObjectValue::Integer16(v) => v.to_le_bytes().to_vec(),
            ObjectValue::Integer32(v) => v.to_le_bytes().to_vec(),
            ObjectValue::Integer64(v) => v.to_le_bytes().to_vec(),
            ObjectValue::Unsigned8(v) => v.to_le_bytes().to_vec(),
            ObjectValue::Unsigned16(v) => v.to_le_bytes().to_vec(),
            ObjectValue::Unsigned32(v) => v.to_le_bytes().to_vec(),
            ObjectValue::Unsigned64(v) => v.to_le_bytes().to_vec(),
            ObjectValue::Real32(v) => v.to_le_bytes().to_vec(),
            ObjectValue::Real64(v) => v.to_le_bytes().to_vec(),

            ObjectValue::VisibleString(v) => v.as_bytes().to_vec(),
            ObjectValue::OctetString(v) => v.clone(),
            ObjectValue::Domain(v) => v.clone(),
        }
    }

    /// True if both values are the same CANopen data type.
    pub fn same_type(&self, other: &ObjectValue) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }

    /// Orders two numeric values of the same type. Returns `None` for
    /// mismatched or non-numeric types.
    pub fn compare(&self, other: &ObjectValue) -> Option<Ordering> {
        match (self, other) {
            (ObjectValue::Boolean(a), ObjectValue::Boolean(b)) => a.partial_cmp(b),
            (ObjectValue::Integer8(a), ObjectValue::Integer8(b)) => a.partial_cmp(b),
            (ObjectValue::Integer16(a), ObjectValue::Integer16(b)) => a.partial_cmp(b),
            (ObjectValue::Integer32(a), ObjectValue::Integer32(b)) => a.partial_cmp(b),
            (ObjectValue::Integer64(a), ObjectValue::Integer64(b)) => a.partial_cmp(b),
            (ObjectValue::Unsigned8(a), ObjectValue::Unsigned8(b)) => a.partial_cmp(b),
            (ObjectValue::Unsigned16(a), ObjectValue::Unsigned16(b)) => a.partial_cmp(b),
            (ObjectValue::Unsigned32(a), ObjectValue::Unsigned32(b)) => a.partial_cmp(b),
            (ObjectValue::Unsigned64(a), ObjectValue::Unsigned64(b)) => a.partial_cmp(b),
            (ObjectValue::Real32(a), ObjectValue::Real32(b)) => a.partial_cmp(b),
            (ObjectValue::Real64(a), ObjectValue::Real64(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}
