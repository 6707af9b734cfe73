//! Symbol-domain ring buffers (§3, §4.3).
//!
//! Two rings are kept in lock-step with each other: the dibit history and
//! the per-symbol reliability history, sized to hold a long P25 LDU voice
//! superframe's worth of back-references (§3 "capacity ≈ 900000"). A third,
//! much smaller ring holds pre-slice soft samples, used only by the
//! Viterbi soft-decision path, which never needs to look back further than
//! a handful of symbols and would otherwise waste most of a 900000-entry
//! `f64` buffer.

const SYMBOL_RING_LEN: usize = 900_000;
const SOFT_RING_LEN: usize = 512;
/// On wraparound, the most recent `PREROLL_LEN` symbols are copied to the
/// front of the new window so a handler that starts decoding a few symbols
/// late can still see the lead-in (§4.3).
const PREROLL_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct SymbolBuffers {
    dibits: Vec<u8>,
    reliabilities: Vec<u8>,
    cursor: usize,
    soft: Vec<f64>,
    soft_cursor: usize,
    total_written: u64,
}

impl Default for SymbolBuffers {
    fn default() -> Self {
        Self {
            dibits: vec![0; SYMBOL_RING_LEN],
            reliabilities: vec![0; SYMBOL_RING_LEN],
            cursor: 0,
            soft: vec![0.0; SOFT_RING_LEN],
            soft_cursor: 0,
            total_written: 0,
        }
    }
}

impl SymbolBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        SYMBOL_RING_LEN
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Push one symbol, wrapping each ring (preserving its own pre-roll
    /// window) independently when it fills.
    pub fn push(&mut self, dibit: u8, reliability: u8, soft_sample: f64) {
        if self.cursor >= SYMBOL_RING_LEN {
            self.wrap_dibits();
        }
        self.dibits[self.cursor] = dibit;
        self.reliabilities[self.cursor] = reliability;
        self.cursor += 1;

        if self.soft_cursor >= SOFT_RING_LEN {
            self.wrap_soft();
        }
        self.soft[self.soft_cursor] = soft_sample;
        self.soft_cursor += 1;

        self.total_written += 1;
    }

    fn wrap_dibits(&mut self) {
        let preroll_start = SYMBOL_RING_LEN - PREROLL_LEN;
        self.dibits.copy_within(preroll_start.., 0);
        self.reliabilities.copy_within(preroll_start.., 0);
        self.cursor = PREROLL_LEN;
    }

    fn wrap_soft(&mut self) {
        let preroll_start = SOFT_RING_LEN - PREROLL_LEN;
        self.soft.copy_within(preroll_start.., 0);
        self.soft_cursor = PREROLL_LEN;
    }

    /// Read the `count` most recently written dibits, oldest first.
    pub fn recent_dibits(&self, count: usize) -> &[u8] {
        let count = count.min(self.cursor);
        &self.dibits[self.cursor - count..self.cursor]
    }

    pub fn recent_reliabilities(&self, count: usize) -> &[u8] {
        let count = count.min(self.cursor);
        &self.reliabilities[self.cursor - count..self.cursor]
    }

    pub fn recent_soft(&self, count: usize) -> &[f64] {
        let count = count.min(self.soft_cursor);
        &self.soft[self.soft_cursor - count..self.soft_cursor]
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_cursor_and_total_written() {
        let mut buf = SymbolBuffers::new();
        for i in 0..10u8 {
            buf.push(i % 4, 200, i as f64);
        }
        assert_eq!(buf.cursor(), 10);
        assert_eq!(buf.total_written(), 10);
    }

    #[test]
    fn dibit_ring_wraps_and_preserves_preroll_window() {
        let mut buf = SymbolBuffers::new();
        for i in 0..(SYMBOL_RING_LEN as u64 + 50) {
            buf.push((i % 4) as u8, 128, i as f64);
        }
        assert!(buf.cursor() <= PREROLL_LEN + 50);
        assert_eq!(buf.total_written(), SYMBOL_RING_LEN as u64 + 50);
    }

    #[test]
    fn soft_ring_wraps_independently_of_the_dibit_ring() {
        let mut buf = SymbolBuffers::new();
        for i in 0..(SOFT_RING_LEN as u64 + 50) {
            buf.push((i % 4) as u8, 128, i as f64);
        }
        // The dibit ring is far larger than the soft ring, so it hasn't
        // wrapped yet even though the soft ring has.
        assert_eq!(buf.cursor() as u64, SOFT_RING_LEN as u64 + 50);
        assert!(buf.recent_soft(SOFT_RING_LEN).len() <= PREROLL_LEN + 50);
    }

    #[test]
    fn recent_window_never_exceeds_cursor() {
        let mut buf = SymbolBuffers::new();
        buf.push(1, 10, 1.0);
        buf.push(2, 20, 2.0);
        assert_eq!(buf.recent_dibits(10), &[1, 2]);
    }

    #[test]
    fn soft_ring_matches_dibit_ring_positionally_before_any_wrap() {
        let mut buf = SymbolBuffers::new();
        for i in 0..5u8 {
            buf.push(i % 4, 0, i as f64 * 10.0);
        }
        assert_eq!(buf.recent_dibits(5), &[0, 1, 2, 3, 0]);
        assert_eq!(buf.recent_soft(5), &[0.0, 10.0, 20.0, 30.0, 40.0]);
    }
}
