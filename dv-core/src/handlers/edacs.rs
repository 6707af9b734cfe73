//! EDACS (Ericsson/GE trunking) frame handler.

use crate::dispatcher::{FrameHandler, FrameOutcome};
use crate::errors::DvError;
use crate::frame_sync::{ProtocolKind, SyncType};
use crate::symbol_buffers::SymbolBuffers;

#[derive(Default)]
pub struct EdacsHandler;

impl FrameHandler for EdacsHandler {
    fn protocol_kind(&self) -> ProtocolKind {
        ProtocolKind::Edacs
    }

    fn claims(&self, sync: SyncType) -> bool {
        matches!(sync, SyncType::EdacsPos | SyncType::EdacsNeg)
    }

    fn handle(&mut self, _sync: SyncType, _buffers: &SymbolBuffers) -> Result<FrameOutcome, DvError> {
        Ok(FrameOutcome {
            log_message: Some("EDACS frame".to_string()),
            ..Default::default()
        })
    }
}
