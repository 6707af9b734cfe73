//! DMR (ETSI TS 102 361) frame handler: two-slot TDMA, voice and data
//! bursts distinguished by which of the five DMR sync patterns matched.

use crate::dispatcher::{FrameHandler, FrameOutcome};
use crate::errors::DvError;
use crate::frame_sync::{ProtocolKind, SubClass, SyncType};
use crate::symbol_buffers::SymbolBuffers;
use crate::utils::bits_to_u32;

#[derive(Default)]
pub struct DmrHandler;

impl FrameHandler for DmrHandler {
    fn protocol_kind(&self) -> ProtocolKind {
        ProtocolKind::Dmr
    }

    fn claims(&self, sync: SyncType) -> bool {
        sync.protocol_kind() == ProtocolKind::Dmr
    }

    fn handle(&mut self, sync: SyncType, buffers: &SymbolBuffers) -> Result<FrameOutcome, DvError> {
        let dibits = buffers.recent_dibits(48);
        if dibits.len() < 24 {
            return Err(crate::errors::SyncError::RingUnderrun {
                required: 24,
                available: dibits.len(),
            }
            .into());
        }
        let bits: Vec<u8> = dibits.iter().flat_map(|&d| [(d >> 1) & 1, d & 1]).collect();

        let slot = match sync {
            SyncType::DmrBsVoicePos | SyncType::DmrBsVoiceNeg | SyncType::DmrMsVoice => 0,
            _ => 1,
        };

        let outcome = match sync.sub_class() {
            SubClass::Voice => {
                let color_code = bits_to_u32(&bits, 0, 4) as u8;
                FrameOutcome {
                    log_message: Some(format!("DMR voice burst, slot {slot}, CC {color_code}")),
                    ..Default::default()
                }
            }
            SubClass::Data => FrameOutcome {
                log_message: Some(format!("DMR data/CSBK burst, slot {slot}")),
                ..Default::default()
            },
            SubClass::HeaderOrOther => FrameOutcome {
                log_message: Some(format!("DMR reverse-channel burst, slot {slot}")),
                ..Default::default()
            },
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_any_dmr_sync() {
        let handler = DmrHandler::default();
        assert!(handler.claims(SyncType::DmrBsVoicePos));
        assert!(handler.claims(SyncType::DmrRcData));
        assert!(!handler.claims(SyncType::YsfPos));
    }

    #[test]
    fn voice_sync_reports_slot_zero() {
        let mut handler = DmrHandler::default();
        let mut buffers = SymbolBuffers::new();
        for _ in 0..24 {
            buffers.push(0b01, 200, 0.0);
        }
        let outcome = handler.handle(SyncType::DmrBsVoicePos, &buffers).unwrap();
        assert!(outcome.log_message.unwrap().contains("slot 0"));
    }

    #[test]
    fn data_sync_reports_slot_one() {
        let mut handler = DmrHandler::default();
        let mut buffers = SymbolBuffers::new();
        for _ in 0..24 {
            buffers.push(0b01, 200, 0.0);
        }
        let outcome = handler.handle(SyncType::DmrBsDataPos, &buffers).unwrap();
        assert!(outcome.log_message.unwrap().contains("slot 1"));
    }
}
