// crates/canopen-rs/src/service/emcy.rs
//! Emergency (EMCY) producer and consumer.
//! (Reference: CiA 301, Section 7.2.7)

use super::{Service, ServiceEvent, warn_deprecated};
use crate::CanOpenError;
use crate::frame::{CanFrame, EmcyMessage};
use crate::frame::emcy::EMCY_FRAME_LEN;
use crate::log::{ServiceContext, my_debug, my_trace};
use crate::od::constants::{
    COB_ID_INVALID_BIT, COB_ID_MASK, IDX_EMCY_COB_ID_U32, IDX_EMCY_INHIBIT_TIME_U16,
    IDX_ERROR_REGISTER_U8,
};
use crate::od::{EmcyHistoryEntry, ObjectDictionary};
use crate::timer::IntervalTimer;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::sync::atomic::AtomicBool;

static INIT_DEPRECATED: AtomicBool = AtomicBool::new(false);
static SET_HISTORY_LENGTH_DEPRECATED: AtomicBool = AtomicBool::new(false);

/// Parameters of a single EMCY production request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmcyWrite<'a> {
    pub code: u16,
    /// Up to 5 bytes of manufacturer-specific information.
    pub info: Option<&'a [u8]>,
}

impl From<u16> for EmcyWrite<'_> {
    fn from(code: u16) -> Self {
        Self { code, info: None }
    }
}

impl<'a> From<(u16, &'a [u8])> for EmcyWrite<'a> {
    fn from((code, info): (u16, &'a [u8])) -> Self {
        Self {
            code,
            info: Some(info),
        }
    }
}

impl<'a> From<(u16, Option<&'a [u8]>)> for EmcyWrite<'a> {
    fn from((code, info): (u16, Option<&'a [u8]>)) -> Self {
        Self { code, info }
    }
}

/// The EMCY service.
///
/// With a non-zero inhibit time (0x1015) and a started service, produced
/// frames are queued and released one per inhibit period, oldest first.
/// Otherwise `write` returns the frame immediately.
#[derive(Debug, Default)]
pub struct Emcy {
    send_queue: VecDeque<CanFrame>,
    send_timer: Option<IntervalTimer>,
}

impl Emcy {
    pub fn new() -> Self {
        Self::default()
    }

    fn context(&self, od: &ObjectDictionary) -> ServiceContext {
        ServiceContext {
            service: "EMCY",
            cob_id: self.cob_id(od),
        }
    }

    // --- Read-through configuration ---

    /// Error register (0x1001), or `None` if the object is missing.
    pub fn register(&self, od: &ObjectDictionary) -> Option<u8> {
        od.read_u8(IDX_ERROR_REGISTER_U8, 0)
    }

    /// Pre-defined error field (0x1003).
    pub fn history(&self, od: &ObjectDictionary) -> Vec<EmcyHistoryEntry> {
        od.emcy_history()
    }

    /// True if production is enabled, i.e. bit 31 of 0x1014 is clear.
    pub fn valid(&self, od: &ObjectDictionary) -> bool {
        od.read_u32(IDX_EMCY_COB_ID_U32, 0)
            .is_some_and(|raw| raw & COB_ID_INVALID_BIT == 0)
    }

    /// Producer COB-ID: the low 11 bits of 0x1014.
    pub fn cob_id(&self, od: &ObjectDictionary) -> Option<u16> {
        od.read_u32(IDX_EMCY_COB_ID_U32, 0)
            .map(|raw| (raw & COB_ID_MASK) as u16)
    }

    /// Inhibit time (0x1015) in microseconds. 0 if missing.
    pub fn inhibit_time_us(&self, od: &ObjectDictionary) -> u64 {
        od.read_u16(IDX_EMCY_INHIBIT_TIME_U16, 0)
            .map_or(0, |raw| raw as u64 * 100)
    }

    /// Inhibit time in milliseconds (the raw value counts 100us units).
    pub fn inhibit_time(&self, od: &ObjectDictionary) -> f64 {
        od.read_u16(IDX_EMCY_INHIBIT_TIME_U16, 0)
            .map_or(0.0, |raw| raw as f64 / 10.0)
    }

    /// EMCY consumer COB-IDs (0x1028).
    pub fn consumers(&self, od: &ObjectDictionary) -> Vec<u16> {
        od.emcy_consumers()
    }

    /// Number of frames waiting for the inhibit timer.
    pub fn pending(&self) -> usize {
        self.send_queue.len()
    }

    // --- Production ---

    /// Produces an emergency frame with the current error register.
    ///
    /// Returns `Ok(Some(Message))` when the frame should be sent now, or
    /// `Ok(None)` when it was queued behind the inhibit timer.
    pub fn write<'a>(
        &mut self,
        od: &ObjectDictionary,
        request: impl Into<EmcyWrite<'a>>,
    ) -> Result<Option<ServiceEvent>, CanOpenError> {
        let EmcyWrite { code, info } = request.into();
        let cob_id = match self.cob_id(od) {
            Some(id) if id != 0 => id,
            _ => return Err(CanOpenError::ProductionDisabled),
        };

        // An absent register encodes as 0.
        let message = EmcyMessage::new(code, self.register(od).unwrap_or(0), info)?;
        let frame = CanFrame::from_message(cob_id, &message)?;

        if self.send_timer.is_some() {
            self.send_queue.push_back(frame);
            my_trace!(
                self.context(od),
                "Queued EMCY {:#06X} ({} pending)",
                code,
                self.send_queue.len()
            );
            Ok(None)
        } else {
            my_trace!(self.context(od), "Producing EMCY {:#06X}", code);
            Ok(Some(ServiceEvent::Message(frame)))
        }
    }

    // --- Deprecated entry points ---

    #[deprecated(note = "use `start()` instead")]
    pub fn init(&mut self, od: &ObjectDictionary, now_us: u64) {
        warn_deprecated(&INIT_DEPRECATED, "Emcy::init() is deprecated. Use start() instead.");
        self.start(od, now_us);
    }

    #[deprecated(note = "use `ObjectDictionary::set_emcy_history_length()` instead")]
    pub fn set_history_length(
        &self,
        od: &mut ObjectDictionary,
        length: u8,
    ) -> Result<(), CanOpenError> {
        warn_deprecated(
            &SET_HISTORY_LENGTH_DEPRECATED,
            "Emcy::set_history_length() is deprecated. Use ObjectDictionary::set_emcy_history_length() instead.",
        );
        od.set_emcy_history_length(length)
    }
}

impl Service for Emcy {
    fn start(&mut self, od: &ObjectDictionary, now_us: u64) {
        if self.send_timer.is_some() {
            return;
        }
        let period_us = self.inhibit_time_us(od);
        self.send_timer = IntervalTimer::arm(period_us, now_us);
        if self.send_timer.is_some() {
            my_debug!(self.context(od), "Inhibit timer armed at {}us", period_us);
        }
    }

    fn stop(&mut self) {
        if self.send_timer.take().is_some() {
            my_debug!("[EMCY] Inhibit timer cancelled, {} frame(s) left queued", self.send_queue.len());
        }
    }

    fn is_running(&self) -> bool {
        self.send_timer.is_some()
    }

    fn tick(&mut self, _od: &ObjectDictionary, now_us: u64) -> Option<ServiceEvent> {
        let timer = self.send_timer.as_mut()?;
        if !timer.poll(now_us) {
            return None;
        }
        self.send_queue.pop_front().map(ServiceEvent::Message)
    }

    fn receive(&mut self, od: &ObjectDictionary, frame: &CanFrame) -> Option<ServiceEvent> {
        if frame.data.len() != EMCY_FRAME_LEN {
            return None;
        }
        // Only the first matching consumer entry counts.
        let cob_id = od
            .emcy_consumers()
            .into_iter()
            .find(|id| *id == frame.id)?;
        let payload: &[u8; EMCY_FRAME_LEN] = frame.data.as_slice().try_into().ok()?;
        let message = EmcyMessage::decode(payload);
        my_trace!("[EMCY] Received {} from {:#05x}", message, cob_id);
        Some(ServiceEvent::Emergency { cob_id, message })
    }
}
