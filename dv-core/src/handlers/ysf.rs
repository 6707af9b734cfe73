//! Yaesu System Fusion frame handler: frame type carried in the FICH
//! (Frame Information CHannel) immediately following sync.

use crate::dispatcher::{FrameHandler, FrameOutcome};
use crate::errors::DvError;
use crate::frame_sync::{ProtocolKind, SyncType};
use crate::symbol_buffers::SymbolBuffers;
use crate::utils::bits_to_u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum YsfFrameType {
    Header,
    Communications,
    Terminator,
    Data,
    Unknown(u8),
}

impl YsfFrameType {
    fn from_ft(ft: u8) -> Self {
        match ft {
            0 => YsfFrameType::Header,
            1 => YsfFrameType::Communications,
            2 => YsfFrameType::Terminator,
            3 => YsfFrameType::Data,
            other => YsfFrameType::Unknown(other),
        }
    }
}

#[derive(Default)]
pub struct YsfHandler;

impl FrameHandler for YsfHandler {
    fn protocol_kind(&self) -> ProtocolKind {
        ProtocolKind::Ysf
    }

    fn claims(&self, sync: SyncType) -> bool {
        matches!(sync, SyncType::YsfPos | SyncType::YsfNeg)
    }

    fn handle(&mut self, _sync: SyncType, buffers: &SymbolBuffers) -> Result<FrameOutcome, DvError> {
        let dibits = buffers.recent_dibits(10);
        if dibits.len() < 5 {
            return Err(crate::errors::SyncError::RingUnderrun {
                required: 5,
                available: dibits.len(),
            }
            .into());
        }
        let bits: Vec<u8> = dibits.iter().flat_map(|&d| [(d >> 1) & 1, d & 1]).collect();
        let ft = bits_to_u32(&bits, 0, 2) as u8;
        let frame_type = YsfFrameType::from_ft(ft);
        Ok(FrameOutcome {
            log_message: Some(format!("YSF frame {frame_type:?}")),
            ..Default::default()
        })
    }
}
