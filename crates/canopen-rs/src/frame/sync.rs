// crates/canopen-rs/src/frame/sync.rs

use crate::CanOpenError;
use crate::frame::codec::Codec;

/// A SYNC frame payload: empty, or a single counter byte when the
/// synchronous counter overflow (0x1019) is configured.
/// (Reference: CiA 301, Section 7.2.5.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncMessage {
    pub counter: Option<u8>,
}

impl Codec for SyncMessage {
    fn serialize(&self, buffer: &mut [u8]) -> Result<usize, CanOpenError> {
        match self.counter {
            None => Ok(0),
            Some(counter) => {
                let slot = buffer.first_mut().ok_or(CanOpenError::BufferTooShort)?;
                *slot = counter;
                Ok(1)
            }
        }
    }

    /// Any extra bytes beyond the counter are ignored.
    fn deserialize(buffer: &[u8]) -> Result<Self, CanOpenError> {
        Ok(Self {
            counter: buffer.first().copied(),
        })
    }
}
