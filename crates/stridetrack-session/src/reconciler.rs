//! Step reconciliation: monotonic raw counter → per-tick deltas.
//!
//! The platform step counter reports a cumulative count since boot, so the
//! session must subtract a base captured at start and an exclusion offset
//! accumulated across pauses. This struct is the single owner of that
//! bookkeeping; nothing else in the pipeline tracks raw-counter offsets.

use stridetrack_core::StepDelta;

/// Converts raw cumulative step counts into session-relative deltas.
///
/// Effective count = `raw − raw_base − exclusion_offset`. Raw ticks observed
/// while paused update the last-seen raw value but produce no delta; the
/// steps they represent are folded into the exclusion offset on resume.
#[derive(Debug, Default)]
pub struct StepReconciler {
    /// Raw value at the first tick after start
    raw_base: Option<u64>,
    /// Most recent raw value seen, paused or not
    last_raw: Option<u64>,
    /// Raw value captured when the session paused
    paused_raw: Option<u64>,
    /// Total raw steps excluded across all pauses
    exclusion_offset: u64,
    /// Effective count at the previous delta
    last_effective: u64,
    paused: bool,
}

impl StepReconciler {
    /// Create a reconciler awaiting its first raw tick.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one raw cumulative count.
    ///
    /// Returns a delta only when tracking (not paused), past the first tick,
    /// and the effective count actually advanced.
    pub fn observe(&mut self, raw: u64, timestamp_ms: i64) -> Option<StepDelta> {
        self.last_raw = Some(raw);

        let base = match self.raw_base {
            Some(base) => base,
            None => {
                // First tick establishes the session baseline.
                self.raw_base = Some(raw);
                return None;
            }
        };

        if self.paused {
            return None;
        }

        let effective = raw.saturating_sub(base).saturating_sub(self.exclusion_offset);
        if effective <= self.last_effective {
            return None;
        }

        let delta = effective - self.last_effective;
        self.last_effective = effective;
        Some(StepDelta {
            count: delta.min(u64::from(u32::MAX)) as u32,
            timestamp_ms,
        })
    }

    /// Capture the pause point. Raw ticks between now and [`resume`](Self::resume)
    /// will be excluded from the effective count.
    pub fn pause(&mut self) {
        self.paused_raw = self.last_raw;
        self.paused = true;
    }

    /// Fold the steps accrued during the pause into the exclusion offset.
    pub fn resume(&mut self) {
        if let (Some(current), Some(at_pause)) = (self.last_raw, self.paused_raw) {
            let excluded = current.saturating_sub(at_pause);
            if excluded > 0 {
                tracing::debug!(excluded, "raw steps excluded across pause");
            }
            self.exclusion_offset += excluded;
        }
        self.paused_raw = None;
        self.paused = false;
    }

    /// Effective session step count so far.
    #[must_use]
    pub fn effective_count(&self) -> u64 {
        self.last_effective
    }

    /// Total raw steps excluded across pauses.
    #[must_use]
    pub fn exclusion_offset(&self) -> u64 {
        self.exclusion_offset
    }

    /// Whether the reconciler is currently in the paused state.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_establishes_base() {
        let mut r = StepReconciler::new();
        assert!(r.observe(5_000, 0).is_none());
        assert_eq!(r.effective_count(), 0);
    }

    #[test]
    fn test_deltas_after_base() {
        let mut r = StepReconciler::new();
        r.observe(5_000, 0);

        let d = r.observe(5_004, 1_000).unwrap();
        assert_eq!(d.count, 4);
        let d = r.observe(5_010, 2_000).unwrap();
        assert_eq!(d.count, 6);
        assert_eq!(r.effective_count(), 10);
    }

    #[test]
    fn test_unchanged_raw_yields_no_delta() {
        let mut r = StepReconciler::new();
        r.observe(100, 0);
        r.observe(105, 1_000);
        assert!(r.observe(105, 2_000).is_none());
    }

    #[test]
    fn test_pause_excludes_steps() {
        let mut r = StepReconciler::new();
        r.observe(1_000, 0);
        r.observe(1_010, 1_000); // 10 effective

        r.pause();
        // N = 25 raw steps while paused: no deltas.
        assert!(r.observe(1_020, 2_000).is_none());
        assert!(r.observe(1_035, 3_000).is_none());
        r.resume();
        assert_eq!(r.exclusion_offset(), 25);

        // S = 5 further raw steps after resume yield exactly 5.
        let d = r.observe(1_040, 4_000).unwrap();
        assert_eq!(d.count, 5);
        assert_eq!(r.effective_count(), 15);
    }

    #[test]
    fn test_repeated_pause_resume_accumulates_offset() {
        let mut r = StepReconciler::new();
        r.observe(0, 0);
        r.observe(10, 1_000);

        r.pause();
        r.observe(20, 2_000);
        r.resume();

        r.observe(25, 3_000);

        r.pause();
        r.observe(30, 4_000);
        r.resume();

        assert_eq!(r.exclusion_offset(), 15);
        let d = r.observe(33, 5_000).unwrap();
        assert_eq!(d.count, 3);
        assert_eq!(r.effective_count(), 18);
    }

    #[test]
    fn test_pause_without_ticks_is_harmless() {
        let mut r = StepReconciler::new();
        r.observe(100, 0);
        r.pause();
        r.resume();
        let d = r.observe(103, 1_000).unwrap();
        assert_eq!(d.count, 3);
    }

    #[test]
    fn test_pause_before_any_tick() {
        let mut r = StepReconciler::new();
        r.pause();
        r.resume();
        assert_eq!(r.exclusion_offset(), 0);
        assert!(r.observe(500, 0).is_none()); // establishes base
        assert_eq!(r.observe(510, 1_000).unwrap().count, 10);
    }

    #[test]
    fn test_counter_regression_is_ignored() {
        let mut r = StepReconciler::new();
        r.observe(1_000, 0);
        r.observe(1_010, 1_000);
        // A raw value below the base must not roll the count back.
        assert!(r.observe(500, 2_000).is_none());
        assert_eq!(r.effective_count(), 10);
    }
}
