// crates/canopen-rs/src/od/error_history.rs
//! Read-only EMCY views over the dictionary: the pre-defined error field
//! (0x1003) and the emergency consumer list (0x1028). Both are computed on
//! every call and never stored separately.

use super::constants::{
    COB_ID_INVALID_BIT, COB_ID_MASK, IDX_EMCY_CONSUMER_AU32, IDX_PREDEFINED_ERROR_FIELD_AU32,
    MAX_EMCY_HISTORY,
};
use super::{AccessType, Object, ObjectDictionary, ObjectEntry, ObjectValue, notify_listeners};
use crate::CanOpenError;
use crate::log::my_debug;
use crate::types::CAN_MAX_STD_ID;
use alloc::vec::Vec;

/// One slot of the pre-defined error field.
///
/// CiA 301 packs the EMCY error code into the low word and
/// manufacturer-specific additional information into the high word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmcyHistoryEntry {
    pub code: u16,
    pub info: u16,
}

impl EmcyHistoryEntry {
    pub fn from_raw(raw: u32) -> Self {
        Self {
            code: (raw & 0xFFFF) as u16,
            info: (raw >> 16) as u16,
        }
    }

    pub fn to_raw(self) -> u32 {
        (self.info as u32) << 16 | self.code as u32
    }
}

impl ObjectDictionary {
    /// Resizes the pre-defined error field (0x1003) to hold `length` entries,
    /// creating the object if it does not exist yet.
    ///
    /// Stored history up to the new length is kept. Afterwards sub-index 0
    /// reads `length` and `sub_number(0x1003)` reports `length + 1`.
    pub fn set_emcy_history_length(&mut self, length: u8) -> Result<(), CanOpenError> {
        if length > MAX_EMCY_HISTORY {
            return Err(CanOpenError::RangeError);
        }
        if !self.contains(IDX_PREDEFINED_ERROR_FIELD_AU32) {
            self.insert(
                IDX_PREDEFINED_ERROR_FIELD_AU32,
                ObjectEntry::array(
                    "Pre-defined error field",
                    Vec::new(),
                    AccessType::ReadOnly,
                ),
            );
        }
        self.resize_array(
            IDX_PREDEFINED_ERROR_FIELD_AU32,
            length,
            ObjectValue::Unsigned32(0),
        )
    }

    /// Stores a new error as the most recent history entry (sub-index 1).
    /// Older entries move up one sub-index and the oldest falls off the end.
    /// Listeners on every shifted sub-index then see their new value.
    /// Does nothing if the history object is absent or has zero length.
    pub fn record_emcy_history(&mut self, entry: EmcyHistoryEntry) {
        // Bypasses the read-only access class: the device owns this object.
        let Some(target) = self.entries.get_mut(&IDX_PREDEFINED_ERROR_FIELD_AU32) else {
            return;
        };
        let Object::Array(values) = &mut target.object else {
            my_debug!("Pre-defined error field (0x1003) is not an ARRAY.");
            return;
        };
        if values.is_empty() {
            return;
        }
        values.pop();
        values.insert(0, ObjectValue::Unsigned32(entry.to_raw()));

        let len = values.len() as u8;
        for sub_index in 1..=len {
            notify_listeners(target, sub_index);
        }
    }

    /// The recorded history in ascending sub-index order, so the most
    /// recent error comes first. Empty (zero) slots are skipped.
    pub fn emcy_history(&self) -> Vec<EmcyHistoryEntry> {
        let Some(Object::Array(values)) = self.read_object(IDX_PREDEFINED_ERROR_FIELD_AU32) else {
            return Vec::new();
        };
        values
            .iter()
            .filter_map(|v| match v {
                ObjectValue::Unsigned32(raw) if *raw != 0 => Some(EmcyHistoryEntry::from_raw(*raw)),
                _ => None,
            })
            .collect()
    }

    /// COB-IDs this device consumes EMCY frames from (0x1028), in
    /// sub-index order. Entries with the invalid bit (31) set are skipped.
    pub fn emcy_consumers(&self) -> Vec<u16> {
        let Some(Object::Array(values)) = self.read_object(IDX_EMCY_CONSUMER_AU32) else {
            return Vec::new();
        };
        values
            .iter()
            .filter_map(|v| match v {
                ObjectValue::Unsigned32(raw) if raw & COB_ID_INVALID_BIT == 0 => {
                    Some((raw & COB_ID_MASK) as u16)
                }
                _ => None,
            })
            .collect()
    }

    /// Appends a valid consumer COB-ID to 0x1028, creating the object if
    /// needed. Returns the sub-index it was stored at.
    pub fn add_emcy_consumer(&mut self, cob_id: u16) -> Result<u8, CanOpenError> {
        if cob_id > CAN_MAX_STD_ID {
            return Err(CanOpenError::InvalidCobId(cob_id));
        }
        if !self.contains(IDX_EMCY_CONSUMER_AU32) {
            self.insert(
                IDX_EMCY_CONSUMER_AU32,
                ObjectEntry::array(
                    "Emergency consumer object",
                    Vec::new(),
                    AccessType::ReadWrite,
                ),
            );
        }
        self.push_sub_entry(IDX_EMCY_CONSUMER_AU32, ObjectValue::Unsigned32(cob_id as u32))
    }
}
