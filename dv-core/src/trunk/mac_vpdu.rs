//! P25 Phase 2 MAC-VPDU opcode/length derivation (§4.6).
//!
//! Most MAC opcodes carry a fixed payload length; a handful of vendor and
//! "manufacturer-specific" opcodes don't, and the only way to know how many
//! bytes to consume is the MCO (MAC Opcode Class) field together with which
//! logical channel (FACCH or SACCH) carried the burst. Getting this wrong
//! desyncs the rest of the burst, so it's centralized here rather than
//! duplicated per opcode handler.

use crate::errors::{DvError, TrunkError};

/// Which logical TDMA channel carried the burst: FACCH rides alongside
/// voice frames, SACCH is the continuously-present signaling channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Xch {
    Facch,
    Sacch,
}

/// The two-length fallback result (§4.6): `len_b` is this MAC PDU's payload
/// length, `len_c` is the length implied for whatever follows it in the
/// same burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacLength {
    pub len_b: usize,
    pub len_c: usize,
}

/// Fixed-length opcodes (opcode -> payload length in bytes, including the
/// opcode byte itself).
fn fixed_length(opcode: u8) -> Option<usize> {
    match opcode {
        0x00 => Some(1),  // MAC_SIGNAL (null)
        0x01 => Some(9),  // MAC_PTT
        0x02 => Some(9),  // MAC_END_PTT
        0x03 => Some(9),  // MAC_IDLE
        0x04 => Some(9),  // MAC_ACTIVE
        0x05 => Some(9),  // MAC_HANGTIME
        0x20 => Some(7),  // TDMA IDLE
        0x21 => Some(13), // GROUP_VOICE_CHANNEL_GRANT_UPDATE
        0x22 => Some(7),  // NULL_IMPROVED
        0x24 => Some(13), // GROUP_VOICE_CHANNEL_GRANT_UPDATE_EXPLICIT
        0x25 => Some(9),  // UNIT_TO_UNIT_VOICE_CHANNEL_GRANT_UPDATE
        0x26 => Some(9),  // PHONE_VOICE_CHANNEL_GRANT_UPDATE
        0x28 => Some(13), // SNDCP_DATA_CHANNEL_GRANT
        0x2A => Some(9),  // STATUS_UPDATE
        0x2F => Some(7),  // MESSAGE_UPDATE
        0x30 => Some(9),  // RADIO_UNIT_MONITOR_COMMAND
        0x34 => Some(9),  // CALL_ALERT
        0x35 => Some(11), // ACK_RESPONSE
        0x36 => Some(9),  // QUEUED_RESPONSE
        0x3A => Some(9),  // EXTENDED_FUNCTION_COMMAND
        0x3C => Some(9),  // GROUP_AFFILIATION_QUERY
        0x3D => Some(9),  // UNIT_REGISTRATION_COMMAND
        0x3F => Some(9),  // DE_REGISTRATION_ACKNOWLEDGE
        _ => None,
    }
}

/// MCO-indicated fallback lengths for an opcode with no fixed-length entry
/// (e.g. manufacturer-specific opcodes, §4.6): on FACCH `len_b = mco`,
/// `len_c = 16 - mco`; on SACCH `len_b = mco`, `len_c = 19 - mco`. Both
/// lengths are clamped to whatever capacity remains in the buffer.
fn mco_fallback_lengths(mco: u8, xch: Xch, remaining_capacity: usize) -> MacLength {
    let mco = mco as usize;
    let (len_b, len_c) = match xch {
        Xch::Facch => (mco, 16usize.saturating_sub(mco)),
        Xch::Sacch => (mco, 19usize.saturating_sub(mco)),
    };
    let len_b = len_b.min(remaining_capacity);
    let len_c = len_c.min(remaining_capacity.saturating_sub(len_b));
    MacLength { len_b, len_c }
}

/// Derives the MAC-VPDU length(s) for `opcode`. `mco` is the MAC Opcode
/// Class field read from the byte preceding the opcode, used only when
/// `opcode` has no fixed-length entry; `xch` and `remaining_capacity` are
/// likewise only consulted in that fallback case.
pub fn derive_mac_length(
    opcode: u8,
    mco: u8,
    xch: Xch,
    remaining_capacity: usize,
) -> Result<MacLength, DvError> {
    if let Some(len) = fixed_length(opcode) {
        return Ok(MacLength {
            len_b: len.min(remaining_capacity),
            len_c: 0,
        });
    }
    let lengths = mco_fallback_lengths(mco, xch, remaining_capacity);
    if lengths.len_b == 0 {
        return Err(TrunkError::MacVpduLengthUnknown { opcode }.into());
    }
    Ok(lengths)
}

/// Convenience wrapper returning just the payload length (`len_b`) for
/// callers that only need to know how many bytes to consume.
pub fn derive_length(opcode: u8, mco: u8, xch: Xch, remaining_capacity: usize) -> Result<usize, DvError> {
    derive_mac_length(opcode, mco, xch, remaining_capacity).map(|l| l.len_b)
}
