//! D-STAR frame handler: voice frames carry a 24-bit AMBE payload plus 24
//! bits of slow data per frame; header/header-data (HD) frames carry the
//! routing header instead.

use crate::dispatcher::{FrameHandler, FrameOutcome};
use crate::errors::DvError;
use crate::frame_sync::{ProtocolKind, SubClass, SyncType};
use crate::symbol_buffers::SymbolBuffers;

#[derive(Default)]
pub struct DstarHandler;

impl FrameHandler for DstarHandler {
    fn protocol_kind(&self) -> ProtocolKind {
        ProtocolKind::Dstar
    }

    fn claims(&self, sync: SyncType) -> bool {
        sync.protocol_kind() == ProtocolKind::Dstar
    }

    fn handle(&mut self, sync: SyncType, buffers: &SymbolBuffers) -> Result<FrameOutcome, DvError> {
        let dibits = buffers.recent_dibits(24);
        if dibits.is_empty() {
            return Err(crate::errors::SyncError::RingUnderrun {
                required: 1,
                available: 0,
            }
            .into());
        }
        let message = match sync.sub_class() {
            SubClass::Data => "D-STAR header data frame",
            _ => "D-STAR voice frame",
        };
        Ok(FrameOutcome {
            log_message: Some(message.to_string()),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_voice_and_header_sync() {
        let handler = DstarHandler::default();
        assert!(handler.claims(SyncType::DstarVoicePos));
        assert!(handler.claims(SyncType::DstarHdPos));
        assert!(!handler.claims(SyncType::NxdnFswPos));
    }

    #[test]
    fn header_sync_reports_header_frame() {
        let mut handler = DstarHandler::default();
        let mut buffers = SymbolBuffers::new();
        buffers.push(0b00, 200, 0.0);
        let outcome = handler.handle(SyncType::DstarHdPos, &buffers).unwrap();
        assert!(outcome.log_message.unwrap().contains("header data"));
    }
}
