//! Cross-protocol sync recognition (§8): every enabled protocol's sync
//! pattern should be recognized by the frame synchronizer when fed clean,
//! error-free symbols, and nothing should fire when a disabled protocol's
//! pattern appears.

use dv_core::config::ProtocolEnables;
use dv_core::frame_sync::{FrameSynchronizer, ProtocolKind, SyncType};

fn feed_hex(fs: &mut FrameSynchronizer, hex: u64, bit_width: usize) -> SyncType {
    let mut last = SyncType::None;
    for i in (0..bit_width).step_by(2).rev() {
        let dibit = ((hex >> i) & 0b11) as u8;
        last = fs.feed(dibit);
    }
    last
}

#[test]
fn p25p1_and_dmr_both_recognized_when_both_enabled() {
    let mut fs = FrameSynchronizer::new(ProtocolEnables::all(), false);
    assert_eq!(feed_hex(&mut fs, 0x5575F5FF77FF, 48), SyncType::P25p1Pos);

    let mut fs2 = FrameSynchronizer::new(ProtocolEnables::all(), false);
    assert_eq!(feed_hex(&mut fs2, 0x755FD7DF75F7, 48), SyncType::DmrBsVoicePos);
}

#[test]
fn disabling_a_protocol_removes_it_from_the_catalogue() {
    let mut enabled = ProtocolEnables::all();
    enabled.nxdn48 = false;
    enabled.nxdn96 = false;
    let mut fs = FrameSynchronizer::new(enabled, false);
    let found = feed_hex(&mut fs, 0xCD4B, 20);
    assert_ne!(found.protocol_kind(), ProtocolKind::Nxdn);
}

#[test]
fn engine_dispatcher_registers_every_enabled_protocol() {
    let dispatcher = dv_core::handlers::build_dispatcher(ProtocolEnables::all());
    let kinds = dispatcher.registered_kinds();
    for expected in [
        ProtocolKind::Nxdn,
        ProtocolKind::Dstar,
        ProtocolKind::Dmr,
        ProtocolKind::X2tdma,
        ProtocolKind::Provoice,
        ProtocolKind::Edacs,
        ProtocolKind::Ysf,
        ProtocolKind::M17,
        ProtocolKind::P25p2,
        ProtocolKind::Dpmr,
        ProtocolKind::P25p1,
    ] {
        assert!(kinds.contains(&expected), "{expected:?} missing from registry");
    }
}
