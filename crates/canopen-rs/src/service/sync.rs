// crates/canopen-rs/src/service/sync.rs
//! Synchronization (SYNC) producer and consumer.
//! (Reference: CiA 301, Section 7.2.5)

use super::{Service, ServiceEvent};
use crate::CanOpenError;
use crate::frame::{CanFrame, Codec, SyncMessage};
use crate::log::{ServiceContext, my_debug, my_info, my_trace, my_warn};
use crate::od::constants::{
    COB_ID_MASK, COB_ID_SYNC_GENERATE_BIT, IDX_SYNC_COB_ID_U32, IDX_SYNC_CYCLE_PERIOD_U32,
    IDX_SYNC_OVERFLOW_U8,
};
use crate::od::ObjectDictionary;
use crate::timer::IntervalTimer;

/// Raw values of 0x1005 and 0x1019 as last seen by the service.
type SyncConfig = (Option<u32>, Option<u8>);

/// The SYNC service.
///
/// Any change to the SYNC COB-ID (0x1005) or counter overflow (0x1019),
/// whether written or replaced, restarts the counter at 1 on the next
/// `write`, `tick` or `start`. The cyclic timer re-checks the generate bit
/// on every expiry and stops once it is cleared.
#[derive(Debug)]
pub struct SyncService {
    /// Counter value carried by the next produced frame (1..=overflow).
    counter: u8,
    cyclic_timer: Option<IntervalTimer>,
    last_config: Option<SyncConfig>,
}

impl Default for SyncService {
    fn default() -> Self {
        Self {
            counter: 1,
            cyclic_timer: None,
            last_config: None,
        }
    }
}

impl SyncService {
    pub fn new() -> Self {
        Self::default()
    }

    fn context(&self, od: &ObjectDictionary) -> ServiceContext {
        ServiceContext {
            service: "SYNC",
            cob_id: self.cob_id(od),
        }
    }

    /// SYNC COB-ID: the low 11 bits of 0x1005.
    pub fn cob_id(&self, od: &ObjectDictionary) -> Option<u16> {
        od.read_u32(IDX_SYNC_COB_ID_U32, 0)
            .map(|raw| (raw & COB_ID_MASK) as u16)
    }

    /// True if bit 30 of 0x1005 marks this device as the SYNC producer.
    pub fn generate(&self, od: &ObjectDictionary) -> bool {
        od.read_u32(IDX_SYNC_COB_ID_U32, 0)
            .is_some_and(|raw| raw & COB_ID_SYNC_GENERATE_BIT != 0)
    }

    /// Communication cycle period (0x1006) in microseconds. 0 if missing.
    pub fn cycle_period(&self, od: &ObjectDictionary) -> u32 {
        od.read_u32(IDX_SYNC_CYCLE_PERIOD_U32, 0).unwrap_or(0)
    }

    /// Synchronous counter overflow value (0x1019). 0 disables the counter.
    pub fn overflow(&self, od: &ObjectDictionary) -> u8 {
        od.read_u8(IDX_SYNC_OVERFLOW_U8, 0).unwrap_or(0)
    }

    /// The counter value the next frame will carry when overflow is enabled.
    pub fn counter(&self) -> u8 {
        self.counter
    }

    fn apply_config_changes(&mut self, od: &ObjectDictionary) {
        let current = (
            od.read_u32(IDX_SYNC_COB_ID_U32, 0),
            od.read_u8(IDX_SYNC_OVERFLOW_U8, 0),
        );
        let previous = self.last_config.replace(current);
        if previous.is_some_and(|seen| seen != current) {
            my_debug!(self.context(od), "Configuration changed, counter restarted");
            self.counter = 1;
        }
    }

    /// Produces a SYNC frame immediately.
    pub fn write(&mut self, od: &ObjectDictionary) -> Result<ServiceEvent, CanOpenError> {
        self.apply_config_changes(od);
        let cob_id = match self.cob_id(od) {
            Some(id) if id != 0 => id,
            _ => return Err(CanOpenError::ProductionDisabled),
        };

        let overflow = self.overflow(od);
        let counter = if overflow == 0 {
            None
        } else {
            if self.counter > overflow {
                self.counter = 1;
            }
            let current = self.counter;
            self.counter = if current >= overflow { 1 } else { current + 1 };
            Some(current)
        };

        let frame = CanFrame::from_message(cob_id, &SyncMessage { counter })?;
        my_trace!(self.context(od), "Producing SYNC, counter {:?}", counter);
        Ok(ServiceEvent::Message(frame))
    }
}

impl Service for SyncService {
    fn start(&mut self, od: &ObjectDictionary, now_us: u64) {
        self.apply_config_changes(od);
        if self.cyclic_timer.is_some() || !self.generate(od) {
            return;
        }
        let period_us = self.cycle_period(od);
        self.cyclic_timer = IntervalTimer::arm(period_us as u64, now_us);
        if self.cyclic_timer.is_some() {
            my_info!(self.context(od), "Producing every {}us", period_us);
        }
    }

    fn stop(&mut self) {
        if self.cyclic_timer.take().is_some() {
            my_debug!("[SYNC] Cyclic timer cancelled");
        }
    }

    fn is_running(&self) -> bool {
        self.cyclic_timer.is_some()
    }

    fn tick(&mut self, od: &ObjectDictionary, now_us: u64) -> Option<ServiceEvent> {
        let timer = self.cyclic_timer.as_mut()?;
        if !timer.poll(now_us) {
            return None;
        }
        if !self.generate(od) {
            self.cyclic_timer = None;
            my_info!(self.context(od), "Generation disabled, cyclic timer stopped");
            return None;
        }
        match self.write(od) {
            Ok(event) => Some(event),
            Err(e) => {
                my_warn!(self.context(od), "Cyclic SYNC not produced: {}", e);
                None
            }
        }
    }

    fn receive(&mut self, od: &ObjectDictionary, frame: &CanFrame) -> Option<ServiceEvent> {
        if self.cob_id(od) != Some(frame.id) {
            return None;
        }
        let SyncMessage { counter } = SyncMessage::deserialize(&frame.data).ok()?;
        Some(ServiceEvent::Sync { counter })
    }
}
