//! User-facing configuration (§3 `DecoderOptions`).
//!
//! Timing fields are `f64` seconds where a non-positive value means "use the
//! built-in default" (§3); [`Resolve::resolve`] implements that sentinel.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub trait Resolve {
    fn resolve(self, default: f64) -> f64;
}

impl Resolve for f64 {
    fn resolve(self, default: f64) -> f64 {
        if self > 0.0 {
            self
        } else {
            default
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModulationLock {
    C4fm,
    Qpsk,
    Gfsk,
    Auto,
}

impl Default for ModulationLock {
    fn default() -> Self {
        ModulationLock::Auto
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProtocolEnables {
    pub p25p1: bool,
    pub p25p2: bool,
    pub dmr: bool,
    pub nxdn48: bool,
    pub nxdn96: bool,
    pub ysf: bool,
    pub dstar: bool,
    pub m17: bool,
    pub edacs: bool,
    pub provoice: bool,
    pub dpmr: bool,
    pub x2tdma: bool,
}

impl ProtocolEnables {
    pub fn all() -> Self {
        Self {
            p25p1: true,
            p25p2: true,
            dmr: true,
            nxdn48: true,
            nxdn96: true,
            ysf: true,
            dstar: true,
            m17: true,
            edacs: true,
            provoice: true,
            dpmr: true,
            x2tdma: true,
        }
    }
}

/// Per-call tuning policy (§3, §4.6 grant admission).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunePolicy {
    pub tune_group_calls: bool,
    pub tune_private_calls: bool,
    pub tune_data_calls: bool,
    pub tune_encrypted_calls: bool,
    pub use_allow_list: bool,
    /// Talkgroups admitted when `use_allow_list` is set; ignored otherwise.
    pub allow_list: HashSet<u32>,
}

impl Default for TunePolicy {
    fn default() -> Self {
        Self {
            tune_group_calls: true,
            tune_private_calls: true,
            tune_data_calls: false,
            tune_encrypted_calls: false,
            use_allow_list: false,
            allow_list: HashSet::new(),
        }
    }
}

/// P25 SM timing overrides (§4.6). Non-positive fields defer to the
/// built-in constants via [`Resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TrunkTiming {
    pub hangtime_s: f64,
    pub grant_timeout_s: f64,
    pub cc_grace_s: f64,
    pub vc_grace_s: f64,
    pub min_follow_dwell_s: f64,
    pub grant_voice_timeout_s: f64,
    pub retune_backoff_s: f64,
    pub force_release_extra_s: f64,
    pub force_release_margin_s: f64,
    pub p1_err_hold_pct: f64,
    pub p1_err_hold_s: f64,
}

impl TrunkTiming {
    pub const DEFAULT_HANGTIME_S: f64 = 2.0;
    pub const DEFAULT_GRANT_TIMEOUT_S: f64 = 3.0;
    pub const DEFAULT_CC_GRACE_S: f64 = 5.0;
    pub const DEFAULT_VC_GRACE_S: f64 = 1.5;
    pub const DEFAULT_MIN_FOLLOW_DWELL_S: f64 = 0.0;
    pub const DEFAULT_GRANT_VOICE_TIMEOUT_S: f64 = 3.0;
    pub const DEFAULT_RETUNE_BACKOFF_S: f64 = 1.5;
    pub const DEFAULT_FORCE_RELEASE_EXTRA_S: f64 = 5.0;
    pub const DEFAULT_FORCE_RELEASE_MARGIN_S: f64 = 1.0;
    pub const DEFAULT_P1_ERR_HOLD_PCT: f64 = 0.05;
    pub const DEFAULT_P1_ERR_HOLD_S: f64 = 2.0;
    pub const TEN_SECOND_GRACE_S: f64 = 10.0;

    pub fn hangtime_s(&self) -> f64 {
        self.hangtime_s.resolve(Self::DEFAULT_HANGTIME_S)
    }
    pub fn grant_timeout_s(&self) -> f64 {
        self.grant_timeout_s.resolve(Self::DEFAULT_GRANT_TIMEOUT_S)
    }
    pub fn cc_grace_s(&self) -> f64 {
        self.cc_grace_s.resolve(Self::DEFAULT_CC_GRACE_S)
    }
    pub fn vc_grace_s(&self) -> f64 {
        self.vc_grace_s.resolve(Self::DEFAULT_VC_GRACE_S)
    }
    pub fn min_follow_dwell_s(&self) -> f64 {
        self.min_follow_dwell_s.resolve(Self::DEFAULT_MIN_FOLLOW_DWELL_S)
    }
    pub fn grant_voice_timeout_s(&self) -> f64 {
        self.grant_voice_timeout_s.resolve(Self::DEFAULT_GRANT_VOICE_TIMEOUT_S)
    }
    pub fn retune_backoff_s(&self) -> f64 {
        self.retune_backoff_s.resolve(Self::DEFAULT_RETUNE_BACKOFF_S)
    }
    pub fn force_release_extra_s(&self) -> f64 {
        self.force_release_extra_s.resolve(Self::DEFAULT_FORCE_RELEASE_EXTRA_S)
    }
    pub fn force_release_margin_s(&self) -> f64 {
        self.force_release_margin_s.resolve(Self::DEFAULT_FORCE_RELEASE_MARGIN_S)
    }
    /// Total window after which a TUNED follower is force-released regardless
    /// of other signaling (§4.6 transitions table).
    pub fn force_release_window_s(&self) -> f64 {
        self.force_release_extra_s() + self.force_release_margin_s() + self.hangtime_s()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderOptions {
    pub protocols: ProtocolEnables,
    pub modulation_lock: ModulationLock,
    pub trunking_enabled: bool,
    pub tune_policy: TunePolicy,
    pub trunk_timing: TrunkTiming,
    pub symbol_capture_path: Option<String>,
    pub wav_directory: Option<String>,
    pub mbe_directory: Option<String>,
    pub payload_verbosity: u8,
    pub emit_mac_vpdu_json_trace: bool,
    pub cqpsk_debug_prerotate: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            protocols: ProtocolEnables::all(),
            modulation_lock: ModulationLock::default(),
            trunking_enabled: true,
            tune_policy: TunePolicy::default(),
            trunk_timing: TrunkTiming::default(),
            symbol_capture_path: None,
            wav_directory: None,
            mbe_directory: None,
            payload_verbosity: 0,
            emit_mac_vpdu_json_trace: false,
            cqpsk_debug_prerotate: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_timing_defers_to_default() {
        let t = TrunkTiming::default();
        assert_eq!(t.hangtime_s(), TrunkTiming::DEFAULT_HANGTIME_S);

        let overridden = TrunkTiming {
            hangtime_s: 9.0,
            ..TrunkTiming::default()
        };
        assert_eq!(overridden.hangtime_s(), 9.0);

        let negative = TrunkTiming {
            hangtime_s: -1.0,
            ..TrunkTiming::default()
        };
        assert_eq!(negative.hangtime_s(), TrunkTiming::DEFAULT_HANGTIME_S);
    }

    #[test]
    fn force_release_window_sums_components() {
        let t = TrunkTiming::default();
        assert_eq!(
            t.force_release_window_s(),
            TrunkTiming::DEFAULT_FORCE_RELEASE_EXTRA_S
                + TrunkTiming::DEFAULT_FORCE_RELEASE_MARGIN_S
                + TrunkTiming::DEFAULT_HANGTIME_S
        );
    }
}
