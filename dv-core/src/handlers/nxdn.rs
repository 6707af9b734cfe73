//! NXDN (48/96) frame handler: single-carrier FSK with a short frame sync
//! word, type distinguished by the following frame-type field rather than
//! by a distinct sync pattern.

use crate::dispatcher::{FrameHandler, FrameOutcome};
use crate::errors::DvError;
use crate::frame_sync::{ProtocolKind, SyncType};
use crate::symbol_buffers::SymbolBuffers;
use crate::utils::bits_to_u32;

#[derive(Default)]
pub struct NxdnHandler;

impl FrameHandler for NxdnHandler {
    fn protocol_kind(&self) -> ProtocolKind {
        ProtocolKind::Nxdn
    }

    fn claims(&self, sync: SyncType) -> bool {
        matches!(sync, SyncType::NxdnFswPos | SyncType::NxdnFswNeg)
    }

    fn handle(&mut self, _sync: SyncType, buffers: &SymbolBuffers) -> Result<FrameOutcome, DvError> {
        let dibits = buffers.recent_dibits(16);
        if dibits.len() < 8 {
            return Err(crate::errors::SyncError::RingUnderrun {
                required: 8,
                available: dibits.len(),
            }
            .into());
        }
        let bits: Vec<u8> = dibits.iter().flat_map(|&d| [(d >> 1) & 1, d & 1]).collect();
        let lich = bits_to_u32(&bits, 0, 8) as u8;
        Ok(FrameOutcome {
            log_message: Some(format!("NXDN frame, LICH {lich:#04x}")),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_only_nxdn_sync() {
        let handler = NxdnHandler::default();
        assert!(handler.claims(SyncType::NxdnFswPos));
        assert!(!handler.claims(SyncType::YsfPos));
    }

    #[test]
    fn reports_lich_byte() {
        let mut handler = NxdnHandler::default();
        let mut buffers = SymbolBuffers::new();
        for _ in 0..8 {
            buffers.push(0b11, 200, 0.0);
        }
        let outcome = handler.handle(SyncType::NxdnFswPos, &buffers).unwrap();
        assert!(outcome.log_message.unwrap().contains("0xff"));
    }
}
