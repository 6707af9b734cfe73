//! Universal quantifications from §8: properties that must hold for any
//! valid input, not just the handful of examples in the unit tests.

use dv_core::frame_sync::SyncType;
use dv_core::slicer::Slicer;
use dv_core::symbol_buffers::SymbolBuffers;
use dv_core::threshold::{RfMod, ThresholdTracker};
use dv_core::trunk::iden::{IdenEntry, IdenTable};
use proptest::prelude::*;

proptest! {
    #[test]
    fn threshold_ordering_always_holds(samples in prop::collection::vec(-20000.0f64..20000.0, 200..400)) {
        let mut tracker = ThresholdTracker::default();
        for s in samples {
            tracker.update(s, RfMod::Qpsk, SyncType::None);
        }
        let (min, max, center, umid, lmid) = tracker.active_bounds();
        prop_assert!(min <= lmid);
        prop_assert!(lmid <= center);
        prop_assert!(center <= umid);
        prop_assert!(umid <= max);
    }

    #[test]
    fn slicer_is_idempotent_for_any_sample(sample in -20000.0f64..20000.0) {
        let mut tracker = ThresholdTracker::default();
        for i in 0..200 {
            tracker.update((i as f64 * 37.0).sin() * 8000.0, RfMod::C4fm, SyncType::P25p1Pos);
        }
        let slicer = Slicer::default();
        let a = slicer.slice(sample, RfMod::C4fm, &tracker);
        let b = slicer.slice(sample, RfMod::C4fm, &tracker);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn symbol_ring_never_reports_more_than_was_written(n in 1usize..2000) {
        let mut buffers = SymbolBuffers::new();
        for i in 0..n {
            buffers.push((i % 4) as u8, 128, i as f64);
        }
        let requested = n + 100;
        prop_assert!(buffers.recent_dibits(requested).len() <= buffers.cursor());
    }

    #[test]
    fn channel_mapping_is_linear_in_channel_number(chan_no in 0u64..4095, spacing in 1u32..25_000) {
        let mut table = IdenTable::new();
        table.set(1, IdenEntry {
            valid: true,
            trusted: true,
            base_freq_hz: 850_000_000,
            channel_spacing_hz: spacing,
            ..IdenEntry::default()
        });
        let channel = (1u16 << 12) | (chan_no as u16 & 0x0FFF);
        let freq = table.resolve_tx_freq(channel).unwrap();
        prop_assert_eq!(freq, 850_000_000 + chan_no * spacing as u64);
    }
}
