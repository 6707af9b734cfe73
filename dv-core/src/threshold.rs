//! Threshold tracking for the symbol slicer (§4.1).
//!
//! Tracks slow gain drift across a rolling window without reacting to single
//! outlier symbols: rank-thinned extrema (mean of the two most extreme
//! samples on each side) feed a slower circular average, and the decision
//! levels are the textbook four-level 4-FSK fractions (5/8) of that average.

use crate::frame_sync::SyncType;

/// Last-known RF modulation of the front-end path (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfMod {
    C4fm,
    Qpsk,
    Gfsk,
}

const DEFAULT_SSIZE: usize = 128;
const DEFAULT_MSIZE: usize = 16;
const INITIAL_BOUND: f64 = 15000.0;

#[derive(Debug, Clone)]
pub struct ThresholdTracker {
    sbuf: Vec<f64>,
    write_idx: usize,
    ssize: usize,

    minbuf: Vec<f64>,
    maxbuf: Vec<f64>,
    msize: usize,
    midx: usize,
    buf_filled: bool,

    pub min: f64,
    pub max: f64,
    pub center: f64,
    pub umid: f64,
    pub lmid: f64,

    /// Static snapshot taken while C4FM + non-P25P1 holds the decision
    /// levels fixed (§4.1).
    pub maxref: f64,
    pub minref: f64,
    frozen: bool,
}

impl Default for ThresholdTracker {
    fn default() -> Self {
        Self::new(DEFAULT_SSIZE, DEFAULT_MSIZE)
    }
}

impl ThresholdTracker {
    pub fn new(ssize: usize, msize: usize) -> Self {
        let ssize = ssize.min(128).max(4);
        let mut tracker = Self {
            sbuf: vec![0.0; ssize],
            write_idx: 0,
            ssize,
            minbuf: vec![-INITIAL_BOUND; msize],
            maxbuf: vec![INITIAL_BOUND; msize],
            msize,
            midx: 0,
            buf_filled: false,
            min: -INITIAL_BOUND,
            max: INITIAL_BOUND,
            center: 0.0,
            umid: 0.0,
            lmid: 0.0,
            maxref: INITIAL_BOUND,
            minref: -INITIAL_BOUND,
            frozen: false,
        };
        tracker.recompute_levels();
        tracker
    }

    /// Reset to the initial ±15000 bounds (§3 `noCarrier`).
    pub fn reset(&mut self) {
        *self = Self::new(self.ssize, self.msize);
    }

    /// Push one baseband sample and re-derive thresholds once the window
    /// wraps. `rf_mod`/`last_sync` decide whether this symbol holds the
    /// decision levels frozen at their last snapshot (§4.1).
    pub fn update(&mut self, sample: f64, rf_mod: RfMod, last_sync: SyncType) {
        self.sbuf[self.write_idx] = sample;
        self.write_idx += 1;

        if self.write_idx >= self.ssize {
            self.write_idx = 0;
            self.wrap_update();
        }

        let should_freeze = rf_mod == RfMod::C4fm && !last_sync.is_p25p1();
        if should_freeze {
            if !self.frozen {
                self.maxref = self.max;
                self.minref = self.min;
                self.frozen = true;
            }
        } else {
            self.frozen = false;
        }
    }

    fn wrap_update(&mut self) {
        let mut sorted = self.sbuf.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let n = sorted.len();
        let lmin = (sorted[0] + sorted[1]) / 2.0;
        let lmax = (sorted[n - 1] + sorted[n - 2]) / 2.0;

        self.minbuf[self.midx] = lmin;
        self.maxbuf[self.midx] = lmax;
        self.midx += 1;
        if self.midx >= self.msize {
            self.midx = 0;
            self.buf_filled = true;
        }

        let count = if self.buf_filled { self.msize } else { self.midx.max(1) };
        self.min = self.minbuf[..count].iter().sum::<f64>() / count as f64;
        self.max = self.maxbuf[..count].iter().sum::<f64>() / count as f64;
        self.recompute_levels();
    }

    fn recompute_levels(&mut self) {
        self.center = (self.max + self.min) / 2.0;
        self.umid = self.center + 0.625 * (self.max - self.center);
        self.lmid = self.center + 0.625 * (self.min - self.center);
    }

    /// The decision bounds the slicer should actually use this symbol:
    /// the frozen snapshot while C4FM+non-P25P1 holds, else the live window.
    pub fn active_bounds(&self) -> (f64, f64, f64, f64, f64) {
        if self.frozen {
            let center = (self.maxref + self.minref) / 2.0;
            let umid = center + 0.625 * (self.maxref - center);
            let lmid = center + 0.625 * (self.minref - center);
            (self.minref, self.maxref, center, umid, lmid)
        } else {
            (self.min, self.max, self.center, self.umid, self.lmid)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_sine(tracker: &mut ThresholdTracker, wraps: usize) {
        let mut t = 0usize;
        for _ in 0..(wraps * tracker.ssize) {
            let sample = 10000.0 * ((t as f64) * 0.2).sin();
            tracker.update(sample, RfMod::C4fm, SyncType::P25p1Pos);
            t += 1;
        }
    }

    #[test]
    fn monotonicity_holds_after_updates() {
        let mut tracker = ThresholdTracker::default();
        fill_sine(&mut tracker, 5);
        let (min, max, center, umid, lmid) = tracker.active_bounds();
        assert!(min <= lmid, "{min} <= {lmid}");
        assert!(lmid <= center, "{lmid} <= {center}");
        assert!(center <= umid, "{center} <= {umid}");
        assert!(umid <= max, "{umid} <= {max}");
    }

    #[test]
    fn freezes_on_c4fm_non_p25p1() {
        let mut tracker = ThresholdTracker::default();
        fill_sine(&mut tracker, 3);
        tracker.update(5000.0, RfMod::C4fm, SyncType::DmrBsVoicePos);
        let snapshot = (tracker.maxref, tracker.minref);
        // Further updates under the same regime must not move the snapshot.
        for _ in 0..(tracker.ssize * 2) {
            tracker.update(-9000.0, RfMod::C4fm, SyncType::DmrBsVoicePos);
        }
        assert_eq!((tracker.maxref, tracker.minref), snapshot);
    }

    #[test]
    fn unfreezes_on_p25p1_sync() {
        let mut tracker = ThresholdTracker::default();
        fill_sine(&mut tracker, 3);
        tracker.update(1000.0, RfMod::C4fm, SyncType::DmrBsVoicePos);
        tracker.update(1000.0, RfMod::C4fm, SyncType::P25p1Pos);
        let (min, max, ..) = tracker.active_bounds();
        assert_eq!(min, tracker.min);
        assert_eq!(max, tracker.max);
    }

    #[test]
    fn reset_restores_initial_bounds() {
        let mut tracker = ThresholdTracker::default();
        fill_sine(&mut tracker, 5);
        tracker.reset();
        assert_eq!(tracker.min, -INITIAL_BOUND);
        assert_eq!(tracker.max, INITIAL_BOUND);
    }
}
