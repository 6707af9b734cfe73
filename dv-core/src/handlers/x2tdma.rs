//! X2-TDMA (Motorola Connect Plus / Capacity Plus) frame handler: same
//! voice/data sync split as DMR, but a distinct proprietary sync
//! catalogue.

use crate::dispatcher::{FrameHandler, FrameOutcome};
use crate::errors::DvError;
use crate::frame_sync::{ProtocolKind, SubClass, SyncType};
use crate::symbol_buffers::SymbolBuffers;

#[derive(Default)]
pub struct X2tdmaHandler;

impl FrameHandler for X2tdmaHandler {
    fn protocol_kind(&self) -> ProtocolKind {
        ProtocolKind::X2tdma
    }

    fn claims(&self, sync: SyncType) -> bool {
        sync.protocol_kind() == ProtocolKind::X2tdma
    }

    fn handle(&mut self, sync: SyncType, _buffers: &SymbolBuffers) -> Result<FrameOutcome, DvError> {
        let message = match sync.sub_class() {
            SubClass::Voice => "X2-TDMA voice burst",
            SubClass::Data => "X2-TDMA data burst",
            SubClass::HeaderOrOther => "X2-TDMA burst",
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
    fn distinguishes_voice_and_data_bursts() {
        let mut handler = X2tdmaHandler::default();
        let buffers = SymbolBuffers::new();
        let voice = handler.handle(SyncType::X2tdmaVoicePos, &buffers).unwrap();
        let data = handler.handle(SyncType::X2tdmaDataPos, &buffers).unwrap();
        assert!(voice.log_message.unwrap().contains("voice"));
        assert!(data.log_message.unwrap().contains("data"));
    }
}
