use crate::CanOpenError;

/// A trait for messages that can be serialized into and deserialized from
/// a CAN frame payload.
pub trait Codec: Sized {
    /// Serializes the message into the provided buffer.
    /// Returns the number of payload bytes written.
    fn serialize(&self, buffer: &mut [u8]) -> Result<usize, CanOpenError>;

    /// Deserializes a message from a frame payload.
    fn deserialize(buffer: &[u8]) -> Result<Self, CanOpenError>;
}
