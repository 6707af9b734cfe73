//! Runtime decoder state (§3): the mutable workspace the engine loop
//! threads through every symbol. Kept as one struct (rather than scattering
//! fields across modules) because the slicer, frame synchronizer, trunking
//! state machine, and handlers all read and write the same session's worth
//! of state on every symbol, and §3 specifies it as a single coherent data
//! model.

use chrono::{DateTime, Utc};

use crate::config::DecoderOptions;
use crate::event_history::EventHistory;
use crate::frame_sync::{FrameSynchronizer, SyncType};
use crate::keystream::KeystreamAlgorithm;
use crate::symbol_buffers::SymbolBuffers;
use crate::threshold::{RfMod, ThresholdTracker};
use crate::trunk::P25TrunkStateMachine;

/// Per-slot runtime state (one per active P25/DMR traffic slot, §3).
#[derive(Debug, Clone)]
pub struct SlotState {
    pub slot_id: u8,
    pub active: bool,
    pub talkgroup: Option<u32>,
    pub source_unit: Option<u32>,
    pub encrypted: bool,
    pub keystream_algorithm: Option<KeystreamAlgorithm>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl SlotState {
    pub fn new(slot_id: u8) -> Self {
        Self {
            slot_id,
            active: false,
            talkgroup: None,
            source_unit: None,
            encrypted: false,
            keystream_algorithm: None,
            last_activity: None,
        }
    }

    pub fn reset(&mut self) {
        let slot_id = self.slot_id;
        *self = Self::new(slot_id);
    }
}

/// The full decoder workspace (§3).
pub struct DecoderState {
    pub options: DecoderOptions,
    pub threshold: ThresholdTracker,
    pub symbols: SymbolBuffers,
    pub frame_sync: FrameSynchronizer,
    pub trunk_sm: P25TrunkStateMachine,
    pub event_history: EventHistory,

    pub rf_mod: RfMod,
    pub last_sync: SyncType,
    pub slots: Vec<SlotState>,

    /// `p25_chan_iden/type/tdma/spac/base_freq/iden_trust[16]` (§3): flattened
    /// into the IDEN table owned by `trunk_sm`; kept here only as the
    /// derived "currently tuned" view handlers read from.
    pub tuned_freq_hz: Option<u64>,
    pub has_carrier: bool,
}

impl DecoderState {
    pub fn new(options: DecoderOptions) -> Self {
        let frame_sync = FrameSynchronizer::new(options.protocols, false);
        let trunk_sm = P25TrunkStateMachine::new(&options);
        let num_slots = if options.protocols.dmr || options.protocols.x2tdma { 2 } else { 1 };
        Self {
            threshold: ThresholdTracker::default(),
            symbols: SymbolBuffers::new(),
            frame_sync,
            trunk_sm,
            event_history: EventHistory::with_slots(num_slots),
            rf_mod: RfMod::C4fm,
            last_sync: SyncType::None,
            slots: (0..num_slots as u8).map(SlotState::new).collect(),
            tuned_freq_hz: None,
            has_carrier: false,
            options,
        }
    }

    /// `noCarrier` transition (§3): resets gain tracking and sync state
    /// without losing trunking/IDEN knowledge already learned.
    pub fn on_carrier_lost(&mut self) {
        self.threshold.reset();
        self.symbols.clear();
        self.last_sync = SyncType::None;
        self.has_carrier = false;
        for slot in &mut self.slots {
            slot.reset();
        }
    }

    pub fn slot_mut(&mut self, id: u8) -> Option<&mut SlotState> {
        self.slots.iter_mut().find(|s| s.slot_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_has_one_slot_per_fdma_protocol() {
        let mut options = DecoderOptions::default();
        options.protocols.dmr = false;
        options.protocols.x2tdma = false;
        let state = DecoderState::new(options);
        assert_eq!(state.slots.len(), 1);
    }

    #[test]
    fn dmr_enabled_gets_two_slots() {
        let state = DecoderState::new(DecoderOptions::default());
        assert_eq!(state.slots.len(), 2);
    }

    #[test]
    fn carrier_loss_resets_slots_and_sync() {
        let mut state = DecoderState::new(DecoderOptions::default());
        state.last_sync = SyncType::P25p1Pos;
        state.slots[0].active = true;
        state.on_carrier_lost();
        assert_eq!(state.last_sync, SyncType::None);
        assert!(!state.slots[0].active);
    }
}
