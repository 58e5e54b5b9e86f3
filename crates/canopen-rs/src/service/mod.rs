// crates/canopen-rs/src/service/mod.rs
//! Producer/consumer protocol services built on the Object Dictionary.
//!
//! Services own no dictionary data. Every configuration value is read
//! through from the dictionary passed into each call, so writes to the
//! dictionary take effect on the next operation without a restart.

mod emcy;
mod sync;

pub use emcy::{Emcy, EmcyWrite};
pub use sync::SyncService;

use crate::frame::{CanFrame, EmcyMessage};
use crate::log::my_warn;
use crate::od::ObjectDictionary;
use core::sync::atomic::{AtomicBool, Ordering};

/// Something a service hands back to the device layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    /// An outbound frame ready for the transport.
    Message(CanFrame),
    /// An EMCY frame was received from a configured consumer COB-ID.
    Emergency { cob_id: u16, message: EmcyMessage },
    /// A SYNC frame was received, with its counter byte if present.
    Sync { counter: Option<u8> },
}

/// The common lifecycle of all producer/consumer services.
///
/// The host drives time: it calls `tick` from its event loop with a
/// monotonic timestamp and forwards every received frame to `receive`.
pub trait Service {
    /// Arms the service's producer timer, if its configuration calls for one.
    /// Calling `start` on a running service does nothing.
    fn start(&mut self, od: &ObjectDictionary, now_us: u64);

    /// Cancels the producer timer. Safe to call when nothing is running.
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Advances the producer timer. Returns at most one event per call.
    fn tick(&mut self, od: &ObjectDictionary, now_us: u64) -> Option<ServiceEvent>;

    /// Filters and decodes an inbound frame.
    fn receive(&mut self, od: &ObjectDictionary, frame: &CanFrame) -> Option<ServiceEvent>;
}

/// Logs a deprecation notice the first time `flag` is seen.
pub(crate) fn warn_deprecated(flag: &AtomicBool, message: &str) {
    if !flag.swap(true, Ordering::Relaxed) {
        my_warn!("DeprecationWarning: {}", message);
    }
}
