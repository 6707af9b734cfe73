//! P25 Phase 2 (TDMA, CQPSK) frame handler (§4.6).
//!
//! Phase 2 carries control/voice signaling as MAC-VPDUs rather than TSBKs;
//! length derivation for opcodes without a fixed length falls back to the
//! MCO-indicated length (§4.6, [`crate::trunk::mac_vpdu`]).

use crate::dispatcher::{FrameHandler, FrameOutcome};
use crate::errors::DvError;
use crate::frame_sync::{ProtocolKind, SyncType};
use crate::symbol_buffers::SymbolBuffers;
use crate::trunk::mac_vpdu::{derive_length, Xch};
use crate::trunk::{CallType, GrantRequest};
use crate::utils::bits_to_u32;

const MAC_GROUP_VOICE_GRANT_UPDATE: u8 = 0x21;
const MAC_GROUP_VOICE_GRANT_UPDATE_EXPLICIT: u8 = 0x24;

#[derive(Default)]
pub struct P25p2Handler {
    pub emit_json_trace: bool,
}

impl FrameHandler for P25p2Handler {
    fn protocol_kind(&self) -> ProtocolKind {
        ProtocolKind::P25p2
    }

    fn claims(&self, sync: SyncType) -> bool {
        sync.is_p25p2()
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

        let mco = bits_to_u32(&bits, 0, 3) as u8;
        let opcode = bits_to_u32(&bits, 3, 8) as u8;
        // MAC_SIGNAL/PTT/END_PTT/IDLE/ACTIVE/HANGTIME ride alongside voice
        // frames on FACCH; every other opcode is SACCH signaling.
        let xch = if opcode < 0x06 { Xch::Facch } else { Xch::Sacch };
        let remaining_capacity = bits.len() / 8;
        let length_bytes = derive_length(opcode, mco, xch, remaining_capacity)?;
        let length_bits = length_bytes * 8;
        if bits.len() < length_bits {
            // Single TDMA burst doesn't carry the whole VPDU; report what we
            // could derive and let the caller accumulate across bursts.
            return Ok(FrameOutcome {
                log_message: Some(format!(
                    "MAC-VPDU opcode {opcode:#04x} needs {length_bytes}B, only {} available",
                    bits.len() / 8
                )),
                consumed_symbols: dibits.len(),
                ..Default::default()
            });
        }

        let mut outcome = match opcode {
            MAC_GROUP_VOICE_GRANT_UPDATE | MAC_GROUP_VOICE_GRANT_UPDATE_EXPLICIT => {
                let channel = bits_to_u32(&bits, 16, 16) as u16;
                let group = bits_to_u32(&bits, 32, 16) as u32;
                FrameOutcome {
                    talkgroup: Some(group),
                    grant: Some(GrantRequest {
                        channel,
                        talkgroup: group,
                        call_type: CallType::Group,
                        encrypted: false,
                    }),
                    log_message: Some(format!("MAC group voice grant update: tg {group} ch {channel:#06x}")),
                    ..Default::default()
                }
            }
            _ => FrameOutcome {
                log_message: Some(format!("MAC-VPDU opcode {opcode:#04x}, {length_bytes}B")),
                ..Default::default()
            },
        };
        outcome.consumed_symbols = length_bits / 2;

        if self.emit_json_trace {
            outcome.log_message = Some(
                serde_json::json!({
                    "opcode": opcode,
                    "mco": mco,
                    "length_bytes": length_bytes,
                })
                .to_string(),
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_byte(buffers: &mut SymbolBuffers, byte: u8) {
        for shift in (0..8).step_by(2) {
            let dibit = (byte >> (6 - shift)) & 0b11;
            buffers.push(dibit, 200, 0.0);
        }
    }

    #[test]
    fn falls_back_to_mco_length_for_unknown_opcode() {
        let mut handler = P25p2Handler::default();
        let mut buffers = SymbolBuffers::new();
        // mco=0b100 (13-byte fallback), opcode=0x7F (unknown), packed as
        // the leading 11 bits of the burst.
        push_byte(&mut buffers, 0b1001_1111);
        for _ in 0..13 {
            push_byte(&mut buffers, 0x00);
        }
        let result = handler.handle(SyncType::P25p2Pos, &buffers);
        assert!(result.is_ok());
    }

    #[test]
    fn claims_only_p25p2_sync() {
        let handler = P25p2Handler::default();
        assert!(handler.claims(SyncType::P25p2Pos));
        assert!(!handler.claims(SyncType::P25p1Pos));
    }

    #[test]
    fn short_window_is_ring_underrun() {
        let mut handler = P25p2Handler::default();
        let buffers = SymbolBuffers::new();
        assert!(handler.handle(SyncType::P25p2Pos, &buffers).is_err());
    }
}
