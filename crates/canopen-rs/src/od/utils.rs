//! Utility functions for creating default Object Dictionaries.

use super::constants::{
    IDX_DEVICE_TYPE_U32, IDX_EMCY_COB_ID_U32, IDX_EMCY_INHIBIT_TIME_U16,
    IDX_ERROR_REGISTER_U8, IDX_SYNC_COB_ID_U32, IDX_SYNC_CYCLE_PERIOD_U32, IDX_SYNC_OVERFLOW_U8,
};
use super::{AccessType, Category, ObjectDictionary, ObjectEntry, ObjectValue};
use crate::CanOpenError;
use crate::types::{COB_ID_EMCY_BASE, COB_ID_SYNC_DEFAULT, NodeId};

/// Creates an Object Dictionary holding the communication objects the
/// EMCY and SYNC services consume, set to their CiA 301 defaults.
///
/// SYNC generation is disabled (consumer only), EMCY production uses
/// `0x80 + node_id` with no inhibit time. The pre-defined error field and
/// the consumer list are not created; see `set_emcy_history_length` and
/// `add_emcy_consumer`.
pub fn new_device_default(node_id: NodeId) -> Result<ObjectDictionary, CanOpenError> {
    let node_id = NodeId::try_from(node_id.0)?;
    let mut od = ObjectDictionary::new();
    populate_communication_objects(&mut od, node_id);
    Ok(od)
}

/// Inserts (or replaces) the default communication objects.
pub fn populate_communication_objects(od: &mut ObjectDictionary, node_id: NodeId) {
    // 0x1000: Device type. 0 = no standardized device profile.
    od.insert(
        IDX_DEVICE_TYPE_U32,
        ObjectEntry::variable("Device type", ObjectValue::Unsigned32(0), AccessType::Constant)
            .with_category(Category::Mandatory),
    );

    // 0x1001: Error register, written by the device itself.
    od.insert(
        IDX_ERROR_REGISTER_U8,
        ObjectEntry::variable("Error register", ObjectValue::Unsigned8(0), AccessType::ReadOnly)
            .with_category(Category::Mandatory),
    );

    // 0x1005: COB-ID SYNC
    od.insert(
        IDX_SYNC_COB_ID_U32,
        ObjectEntry::variable(
            "COB-ID SYNC",
            ObjectValue::Unsigned32(COB_ID_SYNC_DEFAULT as u32),
            AccessType::ReadWrite,
        )
        .with_category(Category::Conditional),
    );

    // 0x1006: Communication cycle period (us). 0 = not used.
    od.insert(
        IDX_SYNC_CYCLE_PERIOD_U32,
        ObjectEntry::variable(
            "Communication cycle period",
            ObjectValue::Unsigned32(0),
            AccessType::ReadWrite,
        )
        .with_category(Category::Conditional),
    );

    // 0x1014: COB-ID EMCY
    od.insert(
        IDX_EMCY_COB_ID_U32,
        ObjectEntry::variable(
            "COB-ID EMCY",
            ObjectValue::Unsigned32((COB_ID_EMCY_BASE + node_id.0 as u16) as u32),
            AccessType::ReadWrite,
        )
        .with_category(Category::Conditional),
    );

    // 0x1015: Inhibit time EMCY (multiples of 100us)
    od.insert(
        IDX_EMCY_INHIBIT_TIME_U16,
        ObjectEntry::variable(
            "Inhibit time EMCY",
            ObjectValue::Unsigned16(0),
            AccessType::ReadWrite,
        ),
    );

    // 0x1019: Synchronous counter overflow value. 0 = no counter,
    // 1 is reserved, 2..=240 are valid.
    od.insert(
        IDX_SYNC_OVERFLOW_U8,
        ObjectEntry::variable(
            "Synchronous counter overflow value",
            ObjectValue::Unsigned8(0),
            AccessType::ReadWrite,
        )
        .with_range(ObjectValue::Unsigned8(0), ObjectValue::Unsigned8(240)),
    );
}
