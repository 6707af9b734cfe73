//! P25 trunking state machine (§4.6).
//!
//! Four states: `Idle` (no control channel found yet), `OnCc` (parked on the
//! control channel, watching for grants), `Tuned` (following a granted
//! voice/data channel), and `Hunting` (control channel lost, cycling
//! candidate frequencies). Grant admission is policy-gated by
//! [`TunePolicy`](crate::config::TunePolicy); channel numbers are resolved
//! to frequencies through an [`IdenTable`].
//!
//! A tuned channel carries one or two logical slots (FDMA: slot 0 only;
//! TDMA: slots 0 and 1). Each slot tracks its own substate so a P25 Phase 2
//! TDMA channel can end one slot's call without releasing the other.

use chrono::{DateTime, Utc};

use crate::config::{DecoderOptions, TunePolicy};
use crate::errors::{DvError, TrunkError};
use crate::logging::SignalLogger;
use crate::trunk::iden::{IdenBandType, IdenTable};
use crate::trunk::patch::PatchTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmState {
    Idle,
    OnCc,
    Tuned,
    Hunting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    Group,
    Private,
    Data,
}

#[derive(Debug, Clone, Copy)]
pub struct GrantRequest {
    pub channel: u16,
    pub talkgroup: u32,
    pub call_type: CallType,
    pub encrypted: bool,
}

/// Per-slot runtime substate (§3): whether the slot currently carries
/// voice, when it was last active or keyed, and whether audio is currently
/// allowed out of this slot (the audio gate a handler consults before
/// emitting PCM).
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotSubstate {
    pub voice_active: bool,
    pub last_active_m: Option<DateTime<Utc>>,
    pub last_ptt_m: Option<DateTime<Utc>>,
    pub audio_allowed_latch: bool,
}

const SLOT_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmEvent {
    ControlChannelSync,
    ControlChannelLost,
    /// Push-to-talk / start of transmission detected on the given slot.
    Ptt(u8),
    /// Continuing voice activity on the given slot.
    Active(u8),
    /// Explicit end-of-transmission signaled on the given slot.
    End(u8),
    /// The given slot reported idle (no explicit end signaled).
    Idle(u8),
    /// Control channel broadcast a neighbor/candidate frequency.
    NeighborUpdate(u64),
    /// Unconditional release back to the control channel.
    Release,
    Tick,
}

pub struct P25TrunkStateMachine {
    pub state: SmState,
    pub iden_table: IdenTable,
    pub patches: PatchTracker,
    tune_policy: TunePolicy,
    trunking_enabled: bool,
    hangtime_s: f64,
    grant_timeout_s: f64,
    cc_grace_s: f64,
    force_release_window_s: f64,
    retune_backoff_s: f64,

    tuned_channel: Option<u16>,
    tuned_since: Option<DateTime<Utc>>,
    cc_last_seen: Option<DateTime<Utc>>,
    last_retune_attempt: Option<DateTime<Utc>>,
    slots: [SlotSubstate; SLOT_COUNT],

    cc_candidates: Vec<u64>,
    hunt_index: usize,
}

impl P25TrunkStateMachine {
    pub fn new(options: &DecoderOptions) -> Self {
        let timing = &options.trunk_timing;
        Self {
            state: SmState::Idle,
            iden_table: IdenTable::new(),
            patches: PatchTracker::new(),
            tune_policy: options.tune_policy.clone(),
            trunking_enabled: options.trunking_enabled,
            hangtime_s: timing.hangtime_s(),
            grant_timeout_s: timing.grant_timeout_s(),
            cc_grace_s: timing.cc_grace_s(),
            force_release_window_s: timing.force_release_window_s(),
            retune_backoff_s: timing.retune_backoff_s(),
            tuned_channel: None,
            tuned_since: None,
            cc_last_seen: None,
            last_retune_attempt: None,
            slots: [SlotSubstate::default(); SLOT_COUNT],
            cc_candidates: Vec::new(),
            hunt_index: 0,
        }
    }

    /// Admission predicates (§8 "Admission"): trunking must be on, the call
    /// kind must be allowed, encryption policy must permit it, and the
    /// allow-list (when active) must permit the talkgroup. Channel
    /// resolution is checked separately in `admit_grant`.
    fn policy_allows(&self, grant: &GrantRequest) -> bool {
        if !self.trunking_enabled {
            return false;
        }
        let type_allowed = match grant.call_type {
            CallType::Group => self.tune_policy.tune_group_calls,
            CallType::Private => self.tune_policy.tune_private_calls,
            CallType::Data => self.tune_policy.tune_data_calls,
        };
        if !type_allowed {
            return false;
        }
        if grant.encrypted && !self.tune_policy.tune_encrypted_calls {
            return false;
        }
        if self.tune_policy.use_allow_list && !self.tune_policy.allow_list.contains(&grant.talkgroup) {
            return false;
        }
        true
    }

    /// Admits or refuses a voice/data channel grant, resolving the channel
    /// number to a frequency when admitted (§4.6 grant admission).
    pub fn admit_grant(
        &mut self,
        grant: GrantRequest,
        now: DateTime<Utc>,
        log: &mut SignalLogger,
    ) -> Result<u64, DvError> {
        if !self.policy_allows(&grant) {
            return Err(TrunkError::PolicyRejected {
                reason: format!("{:?} call policy disabled", grant.call_type),
            }
            .into());
        }

        let iden = ((grant.channel >> 12) & 0xF) as u8;
        let freq = self.iden_table.resolve_tx_freq(grant.channel).ok_or(
            TrunkError::ChannelUnresolved {
                channel: grant.channel,
                iden,
            },
        )?;

        self.state = SmState::Tuned;
        self.tuned_channel = Some(grant.channel);
        self.tuned_since = Some(now);
        self.slots = [SlotSubstate::default(); SLOT_COUNT];
        self.slots[0] = SlotSubstate {
            voice_active: true,
            last_active_m: Some(now),
            last_ptt_m: Some(now),
            audio_allowed_latch: true,
        };
        log.info("SM", format!("tuned to channel {:#06x} ({} Hz)", grant.channel, freq));
        Ok(freq)
    }

    fn tuned_is_tdma(&self) -> bool {
        let Some(channel) = self.tuned_channel else {
            return false;
        };
        let iden = ((channel >> 12) & 0xF) as u8;
        matches!(
            self.iden_table.get(iden).map(|e| e.band_type),
            Some(IdenBandType::Tdma { .. })
        )
    }

    fn any_slot_active(&self) -> bool {
        self.slots.iter().any(|s| s.voice_active)
    }

    pub fn slot(&self, slot: u8) -> Option<&SlotSubstate> {
        self.slots.get(slot as usize)
    }

    pub fn audio_allowed(&self, slot: u8) -> bool {
        self.slots.get(slot as usize).map(|s| s.audio_allowed_latch).unwrap_or(false)
    }

    fn slot_mut(&mut self, slot: u8) -> Option<&mut SlotSubstate> {
        self.slots.get_mut(slot as usize)
    }

    pub fn on_event(&mut self, event: SmEvent, now: DateTime<Utc>, log: &mut SignalLogger) {
        match event {
            SmEvent::ControlChannelSync => {
                self.cc_last_seen = Some(now);
                if self.state == SmState::Idle || self.state == SmState::Hunting {
                    self.state = SmState::OnCc;
                    self.cc_candidates.clear();
                    self.hunt_index = 0;
                    log.info("SM", "control channel acquired");
                }
            }
            SmEvent::ControlChannelLost => {
                if self.state == SmState::OnCc {
                    self.state = SmState::Hunting;
                    log.warn("SM", "control channel lost, hunting");
                }
            }
            SmEvent::NeighborUpdate(freq) => {
                if !self.cc_candidates.contains(&freq) {
                    self.cc_candidates.push(freq);
                }
            }
            SmEvent::Ptt(slot) => {
                if self.state == SmState::Tuned {
                    if let Some(s) = self.slot_mut(slot) {
                        s.voice_active = true;
                        s.audio_allowed_latch = true;
                        s.last_ptt_m = Some(now);
                        s.last_active_m = Some(now);
                    }
                }
            }
            SmEvent::Active(slot) => {
                if self.state == SmState::Tuned {
                    if let Some(s) = self.slot_mut(slot) {
                        s.voice_active = true;
                        s.audio_allowed_latch = true;
                        s.last_active_m = Some(now);
                    }
                }
            }
            SmEvent::End(slot) => self.handle_end(slot, now, log, true),
            SmEvent::Idle(slot) => self.handle_end(slot, now, log, false),
            SmEvent::Release => {
                if self.state == SmState::Tuned {
                    self.return_to_cc(log, "release requested");
                }
            }
            SmEvent::Tick => self.evaluate_timeouts(now, log),
        }
    }

    /// Handles an END or IDLE event on a slot (§8 "Explicit END on FDMA",
    /// "P25P2 TDMA partial END"). `explicit` distinguishes a signaled END
    /// from a silently-idle slot: an explicit END on a single-slot FDMA
    /// channel releases immediately regardless of hangtime; on TDMA it only
    /// releases once every slot is inactive, so one slot's END doesn't
    /// preempt audio still flowing on the other slot.
    fn handle_end(&mut self, slot: u8, now: DateTime<Utc>, log: &mut SignalLogger, explicit: bool) {
        if self.state != SmState::Tuned {
            return;
        }
        if let Some(s) = self.slot_mut(slot) {
            s.voice_active = false;
            s.audio_allowed_latch = false;
            s.last_active_m = Some(now);
        }
        if !explicit {
            return;
        }
        if !self.tuned_is_tdma() {
            self.return_to_cc(log, "explicit end");
        } else if !self.any_slot_active() {
            self.return_to_cc(log, "explicit end, all slots idle");
        } else {
            log.debug("SM", format!("slot {slot} ended, other slot still active"));
        }
    }

    fn evaluate_timeouts(&mut self, now: DateTime<Utc>, log: &mut SignalLogger) {
        if self.state == SmState::Tuned {
            let last_activity_any = self.slots.iter().filter_map(|s| s.last_active_m).max();
            let since_activity = last_activity_any
                .map(|t| (now - t).num_milliseconds() as f64 / 1000.0)
                .unwrap_or(f64::MAX);
            let tuned_duration = self
                .tuned_since
                .map(|t| (now - t).num_milliseconds() as f64 / 1000.0)
                .unwrap_or(0.0);

            if since_activity > self.hangtime_s {
                self.return_to_cc(log, "hangtime expired");
            } else if tuned_duration > self.force_release_window_s {
                self.return_to_cc(log, "force-release window exceeded");
            }
        }

        if self.state == SmState::OnCc {
            let since_cc = self
                .cc_last_seen
                .map(|t| (now - t).num_milliseconds() as f64 / 1000.0)
                .unwrap_or(f64::MAX);
            if since_cc > self.cc_grace_s {
                self.state = SmState::Hunting;
                log.warn("SM", "control channel grace period exceeded, hunting");
            }
        }

        self.patches.sweep_expired(now);
    }

    fn return_to_cc(&mut self, log: &mut SignalLogger, reason: &str) {
        log.info("SM", format!("returning to control channel: {reason}"));
        self.state = SmState::OnCc;
        self.tuned_channel = None;
        self.tuned_since = None;
        self.slots = [SlotSubstate::default(); SLOT_COUNT];
    }

    /// Advances the hunting candidate cycle, returning the next frequency
    /// to try, or `None` if no candidates have been broadcast yet. Wraps
    /// back to the start of the list once exhausted (§4.6 HUNTING).
    pub fn next_cc_candidate(&mut self, log: &mut SignalLogger) -> Option<u64> {
        if self.cc_candidates.is_empty() {
            return None;
        }
        if self.hunt_index >= self.cc_candidates.len() {
            self.hunt_index = 0;
            log.debug("SM", "CC candidates exhausted, recycling");
        }
        let freq = self.cc_candidates[self.hunt_index];
        self.hunt_index += 1;
        Some(freq)
    }

    /// Whether a retune attempt is currently allowed under the backoff
    /// window (§4.6 retune backoff), recording the attempt if so.
    pub fn try_begin_retune(&mut self, now: DateTime<Utc>) -> bool {
        let allowed = match self.last_retune_attempt {
            Some(last) => (now - last).num_milliseconds() as f64 / 1000.0 >= self.retune_backoff_s,
            None => true,
        };
        if allowed {
            self.last_retune_attempt = Some(now);
        }
        allowed
    }

    pub fn tuned_channel(&self) -> Option<u16> {
        self.tuned_channel
    }
}
