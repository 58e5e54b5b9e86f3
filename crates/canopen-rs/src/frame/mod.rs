// crates/canopen-rs/src/frame/mod.rs

pub mod codec;
pub mod emcy;
pub mod sync;

pub use codec::Codec;
pub use emcy::{EmcyMessage, ErrorRegister};
pub use sync::SyncMessage;

use crate::CanOpenError;
use crate::types::{CAN_MAX_DLC, CAN_MAX_STD_ID};
use alloc::vec::Vec;

/// A classic CAN data frame with an 11-bit identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanFrame {
    pub id: u16,
    pub data: Vec<u8>,
}

impl CanFrame {
    /// Creates a frame, validating the identifier range and payload length.
    pub fn new(id: u16, data: &[u8]) -> Result<Self, CanOpenError> {
        if id > CAN_MAX_STD_ID {
            return Err(CanOpenError::InvalidCobId(id));
        }
        if data.len() > CAN_MAX_DLC {
            return Err(CanOpenError::FrameTooLarge(data.len()));
        }
        Ok(Self {
            id,
            data: data.to_vec(),
        })
    }

    /// Serializes a message into a new frame on `id`.
    pub fn from_message<M: Codec>(id: u16, message: &M) -> Result<Self, CanOpenError> {
        let mut buffer = [0u8; CAN_MAX_DLC];
        let len = message.serialize(&mut buffer)?;
        Self::new(id, &buffer[..len])
    }

    pub fn dlc(&self) -> usize {
        self.data.len()
    }
}
