//! End-to-end trunking scenarios (§8): a TSBK group voice grant against a
//! seeded IDEN table should resolve to a frequency and tune the state
//! machine, while an unseeded IDEN should be refused.

use chrono::Utc;
use dv_core::config::DecoderOptions;
use dv_core::logging::SignalLogger;
use dv_core::trunk::iden::IdenEntry;
use dv_core::trunk::{CallType, GrantRequest, P25TrunkStateMachine, SmState};

#[test]
fn seeded_iden_grant_tunes_the_state_machine() {
    let options = DecoderOptions::default();
    let mut sm = P25TrunkStateMachine::new(&options);
    sm.iden_table.set(
        4,
        IdenEntry {
            valid: true,
            trusted: true,
            base_freq_hz: 854_000_000,
            channel_spacing_hz: 12_500,
            ..IdenEntry::default()
        },
    );
    let mut log = SignalLogger::default();

    let grant = GrantRequest {
        channel: (4u16 << 12) | 50,
        talkgroup: 2001,
        call_type: CallType::Group,
        encrypted: false,
    };
    let freq = sm.admit_grant(grant, Utc::now(), &mut log).unwrap();
    assert_eq!(freq, 854_000_000 + 50 * 12_500);
    assert_eq!(sm.state, SmState::Tuned);
}

#[test]
fn unseeded_iden_grant_is_refused() {
    let options = DecoderOptions::default();
    let mut sm = P25TrunkStateMachine::new(&options);
    let mut log = SignalLogger::default();

    let grant = GrantRequest {
        channel: (7u16 << 12) | 50,
        talkgroup: 2001,
        call_type: CallType::Group,
        encrypted: false,
    };
    let result = sm.admit_grant(grant, Utc::now(), &mut log);
    assert!(result.is_err());
    assert_eq!(sm.state, SmState::Idle);
}

#[test]
fn patch_constituent_resolves_to_super_group() {
    use dv_core::trunk::{PatchFlag, PatchTracker};
    let mut patches = PatchTracker::new();
    let now = Utc::now();
    patches.patch_update(9100, PatchFlag::Patch, now);
    patches.patch_add_wgid(9100, 501, now);
    patches.patch_add_wgid(9100, 502, now);
    patches.patch_add_wgid(9100, 503, now);
    assert_eq!(patches.resolve(502, now), 9100);
    assert_eq!(patches.resolve(999, now), 999);
}
