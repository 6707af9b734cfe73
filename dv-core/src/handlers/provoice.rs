//! ProVoice (Motorola/GE-Ericsson analog-replacement trunking) frame
//! handler: a single-frame-type protocol, so the handler's job is mostly
//! reporting the frame boundary for the vocoder layer.

use crate::dispatcher::{FrameHandler, FrameOutcome};
use crate::errors::DvError;
use crate::frame_sync::{ProtocolKind, SyncType};
use crate::symbol_buffers::SymbolBuffers;

#[derive(Default)]
pub struct ProvoiceHandler;

impl FrameHandler for ProvoiceHandler {
    fn protocol_kind(&self) -> ProtocolKind {
        ProtocolKind::Provoice
    }

    fn claims(&self, sync: SyncType) -> bool {
        matches!(sync, SyncType::ProvoicePos | SyncType::ProvoiceNeg)
    }

    fn handle(&mut self, _sync: SyncType, _buffers: &SymbolBuffers) -> Result<FrameOutcome, DvError> {
        Ok(FrameOutcome {
            log_message: Some("ProVoice frame".to_string()),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_provoice_sync_only() {
        let handler = ProvoiceHandler::default();
        assert!(handler.claims(SyncType::ProvoicePos));
        assert!(!handler.claims(SyncType::EdacsPos));
    }
}
