//! M17 frame handler: five distinct sync words distinguish Link Setup
//! Frame (LSF), stream (STR), broadcast (BRT), packet (PKT), and the BERT
//! preamble (PRE).

use crate::dispatcher::{FrameHandler, FrameOutcome};
use crate::errors::DvError;
use crate::frame_sync::{ProtocolKind, SyncType};
use crate::symbol_buffers::SymbolBuffers;

#[derive(Default)]
pub struct M17Handler;

impl FrameHandler for M17Handler {
    fn protocol_kind(&self) -> ProtocolKind {
        ProtocolKind::M17
    }

    fn claims(&self, sync: SyncType) -> bool {
        sync.protocol_kind() == ProtocolKind::M17
    }

    fn handle(&mut self, sync: SyncType, _buffers: &SymbolBuffers) -> Result<FrameOutcome, DvError> {
        let kind = match sync {
            SyncType::M17LsfPos | SyncType::M17LsfNeg => "LSF",
            SyncType::M17StrPos | SyncType::M17StrNeg => "stream",
            SyncType::M17BrtPos | SyncType::M17BrtNeg => "broadcast",
            SyncType::M17PktPos | SyncType::M17PktNeg => "packet",
            SyncType::M17PrePos | SyncType::M17PreNeg => "BERT preamble",
            _ => "unknown",
        };
        Ok(FrameOutcome {
            log_message: Some(format!("M17 {kind} frame")),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_frame_kind_from_sync() {
        let mut handler = M17Handler::default();
        let buffers = SymbolBuffers::new();
        let outcome = handler.handle(SyncType::M17StrPos, &buffers).unwrap();
        assert_eq!(outcome.log_message.unwrap(), "M17 stream frame");
    }

    #[test]
    fn claims_all_five_m17_sync_families() {
        let handler = M17Handler::default();
        for sync in [
            SyncType::M17LsfPos,
            SyncType::M17StrPos,
            SyncType::M17BrtPos,
            SyncType::M17PktPos,
            SyncType::M17PrePos,
        ] {
            assert!(handler.claims(sync));
        }
    }
}
