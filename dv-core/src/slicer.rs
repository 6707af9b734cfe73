//! Symbol slicer (§4.2): converts a baseband sample into a dibit plus an
//! 8-bit reliability score, using whichever decision-level scheme matches
//! the active RF modulation.

use crate::threshold::{RfMod, ThresholdTracker};

/// One sliced symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlicedSymbol {
    pub dibit: u8,
    /// Saturating 0..=255 reliability score, higher is more confident.
    pub reliability: u8,
}

/// Converts baseband samples to dibits against a [`ThresholdTracker`].
///
/// - C4FM uses the tracker's four region boundaries (`lmid`, `center`,
///   `umid`) directly — "region mode".
/// - CQPSK uses fixed thresholds at 0 and ± a configured half-scale value,
///   since the CQPSK front end is expected to deliver a normalized
///   constellation rather than drifting gain.
/// - GFSK is bi-level (FSK with two states folded into one dibit bit,
///   the other bit always 0).
#[derive(Debug, Clone)]
pub struct Slicer {
    pub cqpsk_half_scale: f64,
}

impl Default for Slicer {
    fn default() -> Self {
        Self { cqpsk_half_scale: 1.0 }
    }
}

impl Slicer {
    pub fn new(cqpsk_half_scale: f64) -> Self {
        Self { cqpsk_half_scale }
    }

    pub fn slice(&self, sample: f64, rf_mod: RfMod, tracker: &ThresholdTracker) -> SlicedSymbol {
        match rf_mod {
            RfMod::C4fm => self.slice_c4fm(sample, tracker),
            RfMod::Qpsk => self.slice_cqpsk(sample),
            RfMod::Gfsk => self.slice_gfsk(sample, tracker),
        }
    }

    fn slice_c4fm(&self, sample: f64, tracker: &ThresholdTracker) -> SlicedSymbol {
        let (min, max, center, umid, lmid) = tracker.active_bounds();
        let (dibit, dist_to_level, span) = if sample > umid {
            (0b01, (sample - max).abs(), (max - umid).max(1e-9))
        } else if sample > center {
            (0b00, (sample - umid).abs(), (umid - center).max(1e-9))
        } else if sample > lmid {
            (0b10, (sample - center).abs(), (center - lmid).max(1e-9))
        } else {
            (0b11, (sample - min).abs(), (lmid - min).max(1e-9))
        };
        let confidence = 1.0 - (dist_to_level / span).min(1.0);
        SlicedSymbol {
            dibit,
            reliability: to_u8_saturating(confidence),
        }
    }

    fn slice_cqpsk(&self, sample: f64) -> SlicedSymbol {
        // Fixed decision levels at 0 and the configured half-scale; the I/Q
        // front end is assumed to deliver a normalized real-valued stream
        // here (dibits are sliced one rail at a time by the caller feeding
        // both I and Q through this same path).
        let half = self.cqpsk_half_scale.max(1e-9);
        let dibit = if sample > half {
            0b01
        } else if sample > 0.0 {
            0b00
        } else if sample > -half {
            0b10
        } else {
            0b11
        };
        let confidence = (sample.abs() / half).min(1.0);
        SlicedSymbol {
            dibit,
            reliability: to_u8_saturating(confidence),
        }
    }

    fn slice_gfsk(&self, sample: f64, tracker: &ThresholdTracker) -> SlicedSymbol {
        let (min, max, center, ..) = tracker.active_bounds();
        let dibit = if sample > center { 0b01 } else { 0b00 };
        let span = (max - min).max(1e-9) / 2.0;
        let confidence = ((sample - center).abs() / span).min(1.0);
        SlicedSymbol {
            dibit,
            reliability: to_u8_saturating(confidence),
        }
    }
}

fn to_u8_saturating(confidence: f64) -> u8 {
    (confidence.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_sync::SyncType;

    fn warm_tracker() -> ThresholdTracker {
        let mut t = ThresholdTracker::default();
        for i in 0..(t_ssize(&t) * 4) {
            let sample = 10000.0 * (((i as f64) * 0.3).sin());
            t.update(sample, RfMod::C4fm, SyncType::P25p1Pos);
        }
        t
    }

    fn t_ssize(_t: &ThresholdTracker) -> usize {
        128
    }

    #[test]
    fn c4fm_highest_region_is_01() {
        let tracker = warm_tracker();
        let slicer = Slicer::default();
        let (_, max, ..) = tracker.active_bounds();
        let result = slicer.slice(max * 0.95, RfMod::C4fm, &tracker);
        assert_eq!(result.dibit, 0b01);
    }

    #[test]
    fn c4fm_lowest_region_is_11() {
        let tracker = warm_tracker();
        let slicer = Slicer::default();
        let (min, ..) = tracker.active_bounds();
        let result = slicer.slice(min * 0.95, RfMod::C4fm, &tracker);
        assert_eq!(result.dibit, 0b11);
    }

    #[test]
    fn slicer_is_idempotent_on_repeated_sample() {
        let tracker = warm_tracker();
        let slicer = Slicer::default();
        let a = slicer.slice(2500.0, RfMod::C4fm, &tracker);
        let b = slicer.slice(2500.0, RfMod::C4fm, &tracker);
        assert_eq!(a, b);
    }

    #[test]
    fn cqpsk_fixed_thresholds() {
        let slicer = Slicer::new(1.0);
        assert_eq!(slicer.slice_cqpsk(1.5).dibit, 0b01);
        assert_eq!(slicer.slice_cqpsk(0.5).dibit, 0b00);
        assert_eq!(slicer.slice_cqpsk(-0.5).dibit, 0b10);
        assert_eq!(slicer.slice_cqpsk(-1.5).dibit, 0b11);
    }

    #[test]
    fn gfsk_is_bilevel() {
        let tracker = warm_tracker();
        let slicer = Slicer::default();
        let (_, max, center, ..) = tracker.active_bounds();
        let high = slicer.slice(max, RfMod::Gfsk, &tracker);
        let low = slicer.slice(center - (max - center), RfMod::Gfsk, &tracker);
        assert_eq!(high.dibit, 0b01);
        assert_eq!(low.dibit, 0b00);
    }

    #[test]
    fn reliability_is_higher_at_extremes_than_near_boundary() {
        let tracker = warm_tracker();
        let slicer = Slicer::default();
        let (_, max, center, umid, ..) = tracker.active_bounds();
        let near_boundary = slicer.slice(umid + 1.0, RfMod::C4fm, &tracker);
        let at_extreme = slicer.slice(max, RfMod::C4fm, &tracker);
        assert!(at_extreme.reliability >= near_boundary.reliability);
        let _ = center;
    }
}
