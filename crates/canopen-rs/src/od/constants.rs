// crates/canopen-rs/src/od/constants.rs
//! Central repository for standard Object Dictionary indices and sub-indices.
//!
//! This module provides `pub const` definitions for the well-known object
//! indices from the CANopen communication profile (CiA 301) that the
//! protocol services read, using the `IDX_` naming convention.

// --- 0x1000 - 0x1FFF: Communication Profile Area ---

pub const IDX_DEVICE_TYPE_U32: u16 = 0x1000;
pub const IDX_ERROR_REGISTER_U8: u16 = 0x1001;
pub const IDX_PREDEFINED_ERROR_FIELD_AU32: u16 = 0x1003;

// SYNC
pub const IDX_SYNC_COB_ID_U32: u16 = 0x1005;
pub const IDX_SYNC_CYCLE_PERIOD_U32: u16 = 0x1006;
pub const IDX_SYNC_OVERFLOW_U8: u16 = 0x1019;

// EMCY
pub const IDX_EMCY_COB_ID_U32: u16 = 0x1014;
pub const IDX_EMCY_INHIBIT_TIME_U16: u16 = 0x1015;
pub const IDX_EMCY_CONSUMER_AU32: u16 = 0x1028;

// --- COB-ID bit layout ---

/// Low 11 bits of a COB-ID object carry the CAN identifier.
pub const COB_ID_MASK: u32 = 0x7FF;
/// 0x1014 / 0x1028: set when the EMCY object does NOT exist / is not valid.
pub const COB_ID_INVALID_BIT: u32 = 1 << 31;
/// 0x1005: set when this device generates SYNC frames.
pub const COB_ID_SYNC_GENERATE_BIT: u32 = 1 << 30;

/// CiA 301 caps the pre-defined error field at 254 entries.
pub const MAX_EMCY_HISTORY: u8 = 254;
