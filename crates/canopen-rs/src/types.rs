use core::convert::TryFrom;
use core::fmt;

// --- Primitive Types (Based on CiA 301 Section 7.1) ---
// These aliases keep object dictionary definitions readable (UNSIGNEDn)

/// Alias for BOOLEAN (stored as a byte on the wire)
pub type BOOLEAN = u8;
/// Alias for INTEGER8 (8-bit signed integer)
pub type INTEGER8 = i8;
/// Alias for INTEGER16 (16-bit signed integer)
pub type INTEGER16 = i16;
/// Alias for INTEGER32 (32-bit signed integer)
pub type INTEGER32 = i32;
/// Alias for INTEGER64 (64-bit signed integer)
pub type INTEGER64 = i64;
/// Alias for UNSIGNED8 (8-bit unsigned integer)
pub type UNSIGNED8 = u8;
/// Alias for UNSIGNED16 (16-bit unsigned integer)
pub type UNSIGNED16 = u16;
/// Alias for UNSIGNED32 (32-bit unsigned integer)
pub type UNSIGNED32 = u32;
/// Alias for UNSIGNED64 (64-bit unsigned integer)
pub type UNSIGNED64 = u64;
/// Alias for REAL32 (IEEE 754 single precision)
pub type REAL32 = f32;
/// Alias for REAL64 (IEEE 754 double precision)
pub type REAL64 = f64;

/// Represents a CANopen Node ID, wrapping a `u8` to ensure type safety.
///
/// Valid Node IDs are in the range 1-127. Node ID 0 is reserved for
/// broadcast NMT commands and is never assigned to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u8);

// --- Protocol Constants (CiA 301, predefined connection set) ---

/// Highest identifier representable in an 11-bit base frame.
pub const CAN_MAX_STD_ID: u16 = 0x7FF;

/// Maximum payload of a classic CAN data frame.
pub const CAN_MAX_DLC: usize = 8;

/// Highest assignable Node ID.
pub const MAX_NODE_ID: u8 = 127;

/// Default COB-ID of the SYNC object.
pub const COB_ID_SYNC_DEFAULT: u16 = 0x080;

/// Function code base for EMCY; the producer COB-ID is this plus the Node ID.
pub const COB_ID_EMCY_BASE: u16 = 0x080;

/// Error type for invalid Node ID creation.
#[derive(Debug, PartialEq, Eq)]
pub enum NodeIdError {
    /// Node ID is outside the valid range (1-127).
    InvalidRange(u8),
}

impl fmt::Display for NodeIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeIdError::InvalidRange(value) => {
                write!(f, "Invalid NodeId value: {}. Valid range is 1-127.", value)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NodeIdError {}

impl TryFrom<u8> for NodeId {
    type Error = NodeIdError;

    /// Creates a `NodeId` from a `u8`, returning an error if the value is not a valid
    /// CANopen node identifier.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1..=MAX_NODE_ID => Ok(NodeId(value)),
            _ => Err(NodeIdError::InvalidRange(value)),
        }
    }
}

impl From<NodeId> for u8 {
    /// Converts a `NodeId` back into its underlying `u8` representation.
    fn from(node_id: NodeId) -> Self {
        node_id.0
    }
}
