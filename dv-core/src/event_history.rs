//! Per-slot event history and call-activity watchdogs (§4.9).
//!
//! Each traffic slot (P25 single FDMA voice channel, or one of two DMR TDMA
//! slots) keeps a bounded ring of recent [`EventRecord`]s for UI/history
//! display, plus a watchdog that synthesizes a `CallTimeout` event if no
//! real traffic has been seen for longer than the configured window —
//! otherwise a dead carrier with no further signaling would leave the last
//! real event showing forever.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

const DEFAULT_HISTORY_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    CallStart { talkgroup: u32, source: Option<u32> },
    CallEnd,
    CallTimeout,
    Encrypted,
    PatchActivated { super_group: u32 },
    ChannelGrant { channel: u16 },
}

#[derive(Debug, Clone)]
pub struct EventRecord {
    pub when: DateTime<Utc>,
    pub kind: EventKind,
}

#[derive(Debug, Clone)]
pub struct SlotHistory {
    events: VecDeque<EventRecord>,
    capacity: usize,
    last_activity: Option<DateTime<Utc>>,
}

impl Default for SlotHistory {
    fn default() -> Self {
        Self {
            events: VecDeque::with_capacity(DEFAULT_HISTORY_LEN),
            capacity: DEFAULT_HISTORY_LEN,
            last_activity: None,
        }
    }
}

impl SlotHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            last_activity: None,
        }
    }

    pub fn record(&mut self, kind: EventKind, when: DateTime<Utc>) {
        self.last_activity = Some(when);
        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(EventRecord { when, kind });
    }

    pub fn recent(&self, count: usize) -> Vec<&EventRecord> {
        self.events.iter().rev().take(count).collect()
    }

    pub fn last(&self) -> Option<&EventRecord> {
        self.events.back()
    }

    /// If no activity has been recorded within `timeout_s`, synthesizes a
    /// `CallTimeout` event and returns it.
    pub fn watchdog_check(&mut self, now: DateTime<Utc>, timeout_s: f64) -> Option<EventRecord> {
        let last = self.last_activity?;
        let elapsed = (now - last).num_milliseconds() as f64 / 1000.0;
        if elapsed <= timeout_s {
            return None;
        }
        if matches!(self.last().map(|e| &e.kind), Some(EventKind::CallTimeout)) {
            return None;
        }
        self.record(EventKind::CallTimeout, now);
        self.last().cloned()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventHistory {
    pub slots: Vec<SlotHistory>,
}

impl EventHistory {
    pub fn with_slots(n: usize) -> Self {
        Self {
            slots: (0..n).map(|_| SlotHistory::default()).collect(),
        }
    }

    pub fn slot_mut(&mut self, idx: usize) -> Option<&mut SlotHistory> {
        self.slots.get_mut(idx)
    }

    pub fn run_watchdogs(&mut self, now: DateTime<Utc>, timeout_s: f64) -> Vec<(usize, EventRecord)> {
        let mut fired = Vec::new();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if let Some(event) = slot.watchdog_check(now, timeout_s) {
                fired.push((idx, event));
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn records_are_bounded_to_capacity() {
        let mut slot = SlotHistory::new(3);
        let t = Utc::now();
        for i in 0..5 {
            slot.record(EventKind::CallEnd, t + Duration::seconds(i));
        }
        assert_eq!(slot.recent(10).len(), 3);
    }

    #[test]
    fn watchdog_fires_once_after_timeout() {
        let mut slot = SlotHistory::default();
        let t0 = Utc::now();
        slot.record(
            EventKind::CallStart {
                talkgroup: 100,
                source: None,
            },
            t0,
        );
        let later = t0 + Duration::seconds(10);
        let fired = slot.watchdog_check(later, 5.0);
        assert!(fired.is_some());
        // Second check shouldn't refire immediately since the synthesized
        // timeout event is now the most recent one.
        let again = slot.watchdog_check(later, 5.0);
        assert!(again.is_none());
    }

    #[test]
    fn watchdog_stays_quiet_within_window() {
        let mut slot = SlotHistory::default();
        let t0 = Utc::now();
        slot.record(EventKind::CallEnd, t0);
        assert!(slot.watchdog_check(t0 + Duration::seconds(1), 5.0).is_none());
    }

    #[test]
    fn history_tracks_multiple_slots_independently() {
        let mut history = EventHistory::with_slots(2);
        let t0 = Utc::now();
        history.slot_mut(0).unwrap().record(EventKind::CallEnd, t0);
        assert!(history.slot_mut(1).unwrap().last().is_none());
    }
}
