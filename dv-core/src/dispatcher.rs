//! Per-protocol frame dispatcher (§4.5).
//!
//! Each protocol implements [`FrameHandler`] against the shared symbol
//! rings; [`ProtocolDispatcher`] owns the registry and hands a recognized
//! [`SyncType`] to whichever handler claims it, most-specific first. Sync
//! patterns can collide within a tolerance budget (e.g. a near-miss on a
//! DMR pattern also satisfying a looser NXDN tolerance), so registration
//! order matters: narrower, more specific protocols are tried before
//! broader ones.

use crate::errors::DvError;
use crate::frame_sync::{ProtocolKind, SyncType};
use crate::symbol_buffers::SymbolBuffers;
use crate::trunk::GrantRequest;

/// Outcome of a handler processing one recognized frame.
#[derive(Debug, Clone, Default)]
pub struct FrameOutcome {
    pub consumed_symbols: usize,
    pub talkgroup: Option<u32>,
    pub source_unit: Option<u32>,
    pub encrypted: bool,
    pub log_message: Option<String>,
    /// Populated by P25 handlers when a frame carries a channel grant the
    /// trunking state machine should act on (§4.6).
    pub grant: Option<GrantRequest>,
    /// Populated when a frame carries an IDEN broadcast (§4.7) the caller
    /// should feed into the IDEN table: (iden, base_freq_hz, spacing_hz,
    /// tx_offset_hz).
    pub iden_update: Option<(u8, u64, u32, i64)>,
}

pub trait FrameHandler {
    fn protocol_kind(&self) -> ProtocolKind;

    /// Whether this handler claims the given sync tag.
    fn claims(&self, sync: SyncType) -> bool;

    /// Consume symbols from `buffers` starting at the sync detection point
    /// and produce a [`FrameOutcome`].
    fn handle(&mut self, sync: SyncType, buffers: &SymbolBuffers) -> Result<FrameOutcome, DvError>;
}

/// Specificity-ordered handler registry (§4.5): NXDN, D-STAR, DMR,
/// X2-TDMA, ProVoice, EDACS, YSF, M17, P25 Phase 2, dPMR, P25 Phase 1.
pub struct ProtocolDispatcher {
    handlers: Vec<Box<dyn FrameHandler>>,
}

impl Default for ProtocolDispatcher {
    fn default() -> Self {
        Self { handlers: Vec::new() }
    }
}

impl ProtocolDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers handlers in the specificity order prescribed by §4.5;
    /// later registrations are tried only if earlier ones decline.
    pub fn register(&mut self, handler: Box<dyn FrameHandler>) {
        self.handlers.push(handler);
    }

    pub fn dispatch(
        &mut self,
        sync: SyncType,
        buffers: &SymbolBuffers,
    ) -> Option<Result<FrameOutcome, DvError>> {
        if sync.is_none() {
            return None;
        }
        for handler in self.handlers.iter_mut() {
            if handler.claims(sync) {
                return Some(handler.handle(sync, buffers));
            }
        }
        None
    }

    pub fn registered_kinds(&self) -> Vec<ProtocolKind> {
        self.handlers.iter().map(|h| h.protocol_kind()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubHandler {
        kind: ProtocolKind,
        claims_fn: fn(SyncType) -> bool,
    }

    impl FrameHandler for StubHandler {
        fn protocol_kind(&self) -> ProtocolKind {
            self.kind
        }
        fn claims(&self, sync: SyncType) -> bool {
            (self.claims_fn)(sync)
        }
        fn handle(&mut self, _sync: SyncType, _buffers: &SymbolBuffers) -> Result<FrameOutcome, DvError> {
            Ok(FrameOutcome {
                log_message: Some(format!("{:?} handled", self.kind)),
                ..Default::default()
            })
        }
    }

    #[test]
    fn dispatches_to_first_claiming_handler() {
        let mut dispatcher = ProtocolDispatcher::new();
        dispatcher.register(Box::new(StubHandler {
            kind: ProtocolKind::Nxdn,
            claims_fn: |s| s.protocol_kind() == ProtocolKind::Nxdn,
        }));
        dispatcher.register(Box::new(StubHandler {
            kind: ProtocolKind::P25p1,
            claims_fn: |s| s.protocol_kind() == ProtocolKind::P25p1,
        }));

        let buffers = SymbolBuffers::new();
        let result = dispatcher.dispatch(SyncType::P25p1Pos, &buffers).unwrap().unwrap();
        assert_eq!(result.log_message.unwrap(), "P25p1 handled");
    }

    #[test]
    fn none_sync_is_never_dispatched() {
        let mut dispatcher = ProtocolDispatcher::new();
        dispatcher.register(Box::new(StubHandler {
            kind: ProtocolKind::Dmr,
            claims_fn: |_| true,
        }));
        let buffers = SymbolBuffers::new();
        assert!(dispatcher.dispatch(SyncType::None, &buffers).is_none());
    }

    #[test]
    fn unclaimed_sync_returns_none() {
        let mut dispatcher = ProtocolDispatcher::new();
        dispatcher.register(Box::new(StubHandler {
            kind: ProtocolKind::Dmr,
            claims_fn: |s| s.protocol_kind() == ProtocolKind::Dmr,
        }));
        let buffers = SymbolBuffers::new();
        assert!(dispatcher.dispatch(SyncType::YsfPos, &buffers).is_none());
    }
}
