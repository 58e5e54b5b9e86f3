use crate::frame::CanFrame;
use crate::types::NodeIdError;
use core::array::TryFromSliceError;
use core::fmt;

/// Defines a portable, descriptive Error type for the CANopen stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanOpenError {
    /// A service or message was set up with invalid parameters
    /// (e.g., an EMCY info buffer longer than 5 bytes).
    ConfigurationError(&'static str),
    /// A producer was asked to transmit while its COB-ID is unset or zero.
    ProductionDisabled,
    /// An attempt was made to write a value with an incorrect data type to an object.
    TypeMismatch,
    /// The written value lies outside the object's declared value range.
    RangeError,
    /// The object's access class forbids the write (read-only or constant).
    AccessDenied,
    /// The requested Object Dictionary index does not exist.
    ObjectNotFound,
    /// The requested sub-index does not exist for the given object.
    SubObjectNotFound,
    /// The provided buffer is too small for the operation.
    BufferTooShort,
    /// A frame payload exceeds the 8 bytes of a classic CAN frame.
    FrameTooLarge(usize),
    /// An identifier does not fit into an 11-bit base frame.
    InvalidCobId(u16),
    /// A multi-byte value could not be parsed from a slice.
    SliceConversion,
    /// A value is not a valid Node ID.
    InvalidNodeId(u8),
}

impl fmt::Display for CanOpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigurationError(s) => write!(f, "Configuration error: {}", s),
            Self::ProductionDisabled => write!(f, "Production is disabled (COB-ID unset)"),
            Self::TypeMismatch => write!(f, "The provided value's type does not match the object's type"),
            Self::RangeError => write!(f, "The provided value is outside the object's value range"),
            Self::AccessDenied => write!(f, "The object's access type does not permit writing"),
            Self::ObjectNotFound => write!(f, "The requested Object Dictionary index was not found"),
            Self::SubObjectNotFound => write!(f, "The requested sub-index was not found for this object"),
            Self::BufferTooShort => write!(f, "Buffer is too short for the frame"),
            Self::FrameTooLarge(len) => write!(f, "Frame payload of {len} bytes exceeds the CAN maximum of 8"),
            Self::InvalidCobId(id) => write!(f, "Invalid COB-ID value: {id:#05x}"),
            Self::SliceConversion => write!(f, "Failed to convert slice to a fixed-size array"),
            Self::InvalidNodeId(v) => write!(f, "Invalid NodeId value: {v}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CanOpenError {}

// --- From Implementations for Error Conversion ---

impl From<TryFromSliceError> for CanOpenError {
    fn from(_: TryFromSliceError) -> Self {
        CanOpenError::SliceConversion
    }
}

impl From<NodeIdError> for CanOpenError {
    fn from(err: NodeIdError) -> Self {
        match err {
            NodeIdError::InvalidRange(val) => CanOpenError::InvalidNodeId(val),
        }
    }
}

/// Hardware Abstraction Layer (HAL) for CAN frame transmission.
///
/// This trait abstracts the driver that puts frames on the bus, keeping the
/// protocol logic platform-agnostic (no_std). Services never call it
/// themselves: they hand out `ServiceEvent::Message` frames and the device
/// layer forwards them here.
pub trait CanInterface {
    /// Queues a frame for transmission. Must not block waiting for the bus.
    fn send_frame(&mut self, frame: &CanFrame) -> Result<(), CanOpenError>;

    /// Returns the next received frame, or `None` if nothing is pending.
    fn receive_frame(&mut self) -> Result<Option<CanFrame>, CanOpenError>;
}
