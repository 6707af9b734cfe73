//! dPMR (ETSI TS 102 658) frame handler: four distinct frame-sync variants
//! (FS1..FS4) mark header, voice, data, and end-of-transmission frames.

use crate::dispatcher::{FrameHandler, FrameOutcome};
use crate::errors::DvError;
use crate::frame_sync::{ProtocolKind, SyncType};
use crate::symbol_buffers::SymbolBuffers;

#[derive(Default)]
pub struct DpmrHandler;

impl FrameHandler for DpmrHandler {
    fn protocol_kind(&self) -> ProtocolKind {
        ProtocolKind::Dpmr
    }

    fn claims(&self, sync: SyncType) -> bool {
        sync.protocol_kind() == ProtocolKind::Dpmr
    }

    fn handle(&mut self, sync: SyncType, _buffers: &SymbolBuffers) -> Result<FrameOutcome, DvError> {
        let kind = match sync {
            SyncType::DpmrFs1Pos | SyncType::DpmrFs1Neg => "header",
            SyncType::DpmrFs2Pos | SyncType::DpmrFs2Neg => "voice",
            SyncType::DpmrFs3Pos | SyncType::DpmrFs3Neg => "data",
            SyncType::DpmrFs4Pos | SyncType::DpmrFs4Neg => "end-of-transmission",
            _ => "unknown",
        };
        Ok(FrameOutcome {
            log_message: Some(format!("dPMR {kind} frame")),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_frame_kind_per_fs_variant() {
        let mut handler = DpmrHandler::default();
        let buffers = SymbolBuffers::new();
        let outcome = handler.handle(SyncType::DpmrFs4Pos, &buffers).unwrap();
        assert!(outcome.log_message.unwrap().contains("end-of-transmission"));
    }
}
