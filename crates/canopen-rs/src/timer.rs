//! Deadline-based repeating timer used by the protocol services.
//!
//! The core never sleeps or spawns: the host calls `tick(now_us)` on each
//! service from its event loop and the service asks its `IntervalTimer`
//! whether a period has elapsed.

/// A repeating timer armed at a fixed period, expressed in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    period_us: u64,
    next_deadline_us: u64,
}

impl IntervalTimer {
    /// Arms a timer whose first expiry is one period after `now_us`.
    /// Returns `None` for a zero period, which cannot be armed.
    pub fn arm(period_us: u64, now_us: u64) -> Option<Self> {
        if period_us == 0 {
            return None;
        }
        Some(Self {
            period_us,
            next_deadline_us: now_us.saturating_add(period_us),
        })
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    pub fn next_deadline_us(&self) -> u64 {
        self.next_deadline_us
    }

    /// Returns `true` at most once per call when the deadline has passed.
    ///
    /// Missed periods are skipped rather than replayed, so a late caller
    /// never sees a burst of expiries.
    pub fn poll(&mut self, now_us: u64) -> bool {
        if now_us < self.next_deadline_us {
            return false;
        }
        let next = self.next_deadline_us.saturating_add(self.period_us);
        self.next_deadline_us = if next > now_us {
            next
        } else {
            now_us.saturating_add(self.period_us)
        };
        true
    }
}
