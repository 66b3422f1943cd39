//! Property-based checks for the progress calculator and duration parsing.

use chrono::Utc;
use proptest::prelude::*;

use fulfillment_core::models::{CustomStep, StepDuration, StepStatus, TimeUnit};
use fulfillment_core::progress;

/// Step lists respecting the engine's structural invariants: completed
/// steps form a prefix, followed by at most one current step.
fn step_list_strategy() -> impl Strategy<Value = Vec<CustomStep>> {
    (1usize..12, 0usize..13, any::<bool>()).prop_map(|(len, completed_seed, has_current)| {
        let completed = completed_seed % (len + 1);
        let now = Utc::now();
        (0..len)
            .map(|i| {
                let status = if i < completed {
                    StepStatus::Completed { at: now }
                } else if i == completed && completed < len && has_current {
                    StepStatus::Current
                } else {
                    StepStatus::Pending
                };
                CustomStep {
                    name: format!("step-{i}"),
                    description: None,
                    duration: StepDuration::new(i as i64 + 1, TimeUnit::Hours),
                    scheduled_at: now,
                    status,
                }
            })
            .collect()
    })
}

proptest! {
    /// Progress is always within [0, 100].
    #[test]
    fn progress_stays_in_bounds(steps in step_list_strategy()) {
        let p = progress::compute(&steps);
        prop_assert!(p.percent <= 100);
    }

    /// Progress is 100 exactly when every step is completed.
    #[test]
    fn progress_is_full_iff_all_completed(steps in step_list_strategy()) {
        let p = progress::compute(&steps);
        let all_completed = steps.iter().all(CustomStep::is_completed);
        prop_assert_eq!(p.percent == 100, all_completed);
    }

    /// Progress is 0 exactly when nothing completed and nothing current.
    #[test]
    fn progress_is_zero_iff_not_started(steps in step_list_strategy()) {
        let p = progress::compute(&steps);
        let untouched = steps.iter().all(|s| s.status.is_pending());
        prop_assert_eq!(p.percent == 0, untouched);
    }

    /// The reported current index is the earliest incomplete step.
    #[test]
    fn current_index_is_earliest_incomplete(steps in step_list_strategy()) {
        let p = progress::compute(&steps);
        if let Some(i) = p.current_step_index {
            prop_assert!(steps[i].is_current());
            prop_assert!(steps[..i].iter().all(CustomStep::is_completed));
        }
    }

    /// Completing the current step and promoting the next never lowers
    /// progress (sweep monotonicity at the formula level).
    #[test]
    fn promoting_current_step_is_monotonic(steps in step_list_strategy()) {
        let before = progress::compute(&steps);
        if let Some(i) = steps.iter().position(CustomStep::is_current) {
            let mut after_steps = steps;
            after_steps[i].status = StepStatus::Completed { at: Utc::now() };
            if i + 1 < after_steps.len() {
                after_steps[i + 1].status = StepStatus::Current;
            }
            let after = progress::compute(&after_steps);
            prop_assert!(after.percent >= before.percent,
                "progress regressed from {} to {}", before.percent, after.percent);
        }
    }

    /// Canonical durations survive the display/parse round trip.
    #[test]
    fn duration_display_round_trips(value in 1i64..10_000, unit_pick in 0u8..3) {
        let unit = match unit_pick {
            0 => TimeUnit::Minutes,
            1 => TimeUnit::Hours,
            _ => TimeUnit::Days,
        };
        let duration = StepDuration::new(value, unit);
        let reparsed: StepDuration = duration.to_string().parse().unwrap();
        prop_assert_eq!(duration, reparsed);
    }
}
