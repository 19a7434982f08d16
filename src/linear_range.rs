//! Mapping between physical quantities and quantized register indices.
//!
//! A [`LinearRange`] describes a run of register indices whose values
//! follow `value = min + (idx - min_idx) * step`. Hardware that splits one
//! quantity over several disjoint runs (stacked windows) is modeled as an
//! ordered group of ranges sharing one index space.

/// A linear range of representable values over an inclusive index window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinearRange {
    /// Value represented by `min_idx`.
    pub min: i32,
    /// Distance between two adjacent indices.
    pub step: i32,
    /// First valid register index.
    pub min_idx: u16,
    /// Last valid register index.
    pub max_idx: u16,
}

impl LinearRange {
    pub const fn new(min: i32, step: i32, min_idx: u16, max_idx: u16) -> Self {
        Self {
            min,
            step,
            min_idx,
            max_idx,
        }
    }

    /// Largest value the range can represent.
    pub const fn max_value(&self) -> i32 {
        self.min + self.step * (self.max_idx - self.min_idx) as i32
    }

    /// Value represented by `idx`, or `None` outside the index window.
    pub fn value(&self, idx: u16) -> Option<i32> {
        if idx < self.min_idx || idx > self.max_idx {
            return None;
        }
        Some(self.min + self.step * (idx - self.min_idx) as i32)
    }

    /// Index of the lowest step whose value falls inside `[val_min, val_max]`.
    ///
    /// Returns `None` when no representable step lands in the window. An
    /// exact lookup passes the same value twice; a caller that accepts
    /// rounding down probes with `[wanted - step + 1, wanted]`.
    pub fn win_index(&self, val_min: i32, val_max: i32) -> Option<u16> {
        if val_max < self.min || val_min > self.max_value() {
            return None;
        }

        if val_min <= self.min || self.step == 0 {
            return Some(self.min_idx);
        }

        let steps = (val_min - self.min + self.step - 1) / self.step;
        if self.min + self.step * steps > val_max {
            return None;
        }

        Some(self.min_idx + steps as u16)
    }

    /// [`win_index`](Self::win_index) across an ordered group of stacked
    /// ranges; the first range containing a matching step wins.
    pub fn group_win_index(ranges: &[LinearRange], val_min: i32, val_max: i32) -> Option<u16> {
        ranges
            .iter()
            .find_map(|range| range.win_index(val_min, val_max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Termination voltage windows of the nPM1300 charger.
    const VOLT_RANGES: [LinearRange; 2] = [
        LinearRange::new(3_500_000, 50_000, 0, 3),
        LinearRange::new(4_000_000, 50_000, 4, 13),
    ];

    #[test]
    fn test_exact_match() {
        let range = VOLT_RANGES[0];
        assert_eq!(range.win_index(3_500_000, 3_500_000), Some(0));
        assert_eq!(range.win_index(3_550_000, 3_550_000), Some(1));
        assert_eq!(range.win_index(3_650_000, 3_650_000), Some(3));
    }

    #[test]
    fn test_off_step_value_is_rejected() {
        let range = VOLT_RANGES[0];
        assert_eq!(range.win_index(3_525_000, 3_525_000), None);
        assert_eq!(range.win_index(3_499_999, 3_499_999), None);
        assert_eq!(range.win_index(3_700_000, 3_700_000), None);
    }

    #[test]
    fn test_group_lookup_spans_windows() {
        assert_eq!(
            LinearRange::group_win_index(&VOLT_RANGES, 3_600_000, 3_600_000),
            Some(2)
        );
        assert_eq!(
            LinearRange::group_win_index(&VOLT_RANGES, 4_000_000, 4_000_000),
            Some(4)
        );
        assert_eq!(
            LinearRange::group_win_index(&VOLT_RANGES, 4_450_000, 4_450_000),
            Some(13)
        );
    }

    #[test]
    fn test_group_lookup_rejects_gap_between_windows() {
        // 3.65 V is the top of the low window; the next step is 4.0 V.
        assert_eq!(
            LinearRange::group_win_index(&VOLT_RANGES, 3_700_000, 3_700_000),
            None
        );
        assert_eq!(
            LinearRange::group_win_index(&VOLT_RANGES, 3_950_000, 3_950_000),
            None
        );
    }

    #[test]
    fn test_window_snaps_down_to_lower_step() {
        // Charge current range of the nPM1300: 32 mA to 800 mA in 2 mA steps.
        let range = LinearRange::new(32_000, 2_000, 16, 400);
        let wanted = 33_000;
        let idx = range.win_index(wanted - range.step + 1, wanted);
        assert_eq!(idx, Some(16));
        assert_eq!(range.value(16), Some(32_000));

        let wanted = 150_000;
        let idx = range.win_index(wanted - range.step + 1, wanted);
        assert_eq!(idx, Some(75));
        assert_eq!(range.value(75), Some(150_000));
    }

    #[test]
    fn test_window_below_minimum_is_rejected() {
        let range = LinearRange::new(32_000, 2_000, 16, 400);
        assert_eq!(range.win_index(30_001 - range.step + 1, 30_001), None);
    }

    #[test]
    fn test_value_bounds() {
        let range = VOLT_RANGES[1];
        assert_eq!(range.value(3), None);
        assert_eq!(range.value(4), Some(4_000_000));
        assert_eq!(range.value(13), Some(4_450_000));
        assert_eq!(range.value(14), None);
        assert_eq!(range.max_value(), 4_450_000);
    }
}
