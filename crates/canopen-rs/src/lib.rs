#![cfg_attr(not(feature = "std"), no_std)]


// 'alloc' is used for dynamic allocation (e.g., Vec<u8> in frames, boxed listeners)
extern crate alloc;

// --- Foundation Modules ---
pub mod types;
pub mod hal;
pub(crate) mod log;
pub mod timer;

// --- Object Dictionary ---
pub mod od;

// --- Frames and Codecs ---
pub mod frame;

// --- Protocol Services ---
pub mod service;

// --- Top-level Exports ---
pub use types::NodeId;
pub use hal::{CanInterface, CanOpenError};
pub use frame::{CanFrame, Codec, EmcyMessage, SyncMessage};
pub use od::{ListenerHandle, ObjectDictionary, ObjectEntry, ObjectValue};
pub use service::{Emcy, EmcyWrite, Service, ServiceEvent, SyncService};
