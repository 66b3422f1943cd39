//! Progress calculation over an order's step list.
//!
//! Pure and deterministic; used by ingestion, advancement, and every read
//! path so all consumers report the same number. A current step earns half
//! a step of credit: "in progress" is meaningfully further along than "not
//! yet started" without claiming completion.

use serde::Serialize;

use crate::models::CustomStep;

/// Computed progress snapshot for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    /// Integer percentage in `[0, 100]`; 100 iff every step is completed.
    pub percent: u8,
    /// Index of the step marked current, if any.
    pub current_step_index: Option<usize>,
}

/// Compute progress for a step list.
///
/// With no current step: `floor(100 / len * completed_count)`. With a
/// current step at index `i` (all predecessors completed by invariant):
/// `floor(100 / len * (i + 0.5))`.
pub fn compute(steps: &[CustomStep]) -> Progress {
    let len = steps.len();
    if len == 0 {
        return Progress {
            percent: 0,
            current_step_index: None,
        };
    }

    let current_step_index = steps.iter().position(CustomStep::is_current);
    let completed = steps.iter().filter(|s| s.is_completed()).count();

    let percent = match current_step_index {
        // floor(100 * (i + 0.5) / len) in integer arithmetic
        Some(i) => (100 * (2 * i + 1)) / (2 * len),
        None => (100 * completed) / len,
    };

    Progress {
        percent: percent.min(100) as u8,
        current_step_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StepDuration, StepStatus, TimeUnit};
    use chrono::Utc;

    fn steps(statuses: &[StepStatus]) -> Vec<CustomStep> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| CustomStep {
                name: format!("step-{i}"),
                description: None,
                duration: StepDuration::new(i as i64, TimeUnit::Hours),
                scheduled_at: Utc::now(),
                status: *status,
            })
            .collect()
    }

    #[test]
    fn test_fresh_order_has_zero_progress() {
        let p = compute(&steps(&[StepStatus::Pending, StepStatus::Pending]));
        assert_eq!(p.percent, 0);
        assert_eq!(p.current_step_index, None);
    }

    #[test]
    fn test_current_step_earns_half_credit() {
        let p = compute(&steps(&[StepStatus::Current, StepStatus::Pending]));
        assert_eq!(p.percent, 25);
        assert_eq!(p.current_step_index, Some(0));
    }

    #[test]
    fn test_completed_steps_earn_full_credit() {
        let done = StepStatus::Completed { at: Utc::now() };
        let p = compute(&steps(&[done, StepStatus::Pending, StepStatus::Pending]));
        assert_eq!(p.percent, 33);
        assert_eq!(p.current_step_index, None);
    }

    #[test]
    fn test_second_step_current() {
        let done = StepStatus::Completed { at: Utc::now() };
        let p = compute(&steps(&[done, StepStatus::Current]));
        // floor(100 / 2 * 1.5) = 75
        assert_eq!(p.percent, 75);
        assert_eq!(p.current_step_index, Some(1));
    }

    #[test]
    fn test_all_completed_is_exactly_one_hundred() {
        let done = StepStatus::Completed { at: Utc::now() };
        for n in 1..=7 {
            let p = compute(&steps(&vec![done; n]));
            assert_eq!(p.percent, 100, "n = {n}");
        }
    }

    #[test]
    fn test_incomplete_order_never_reports_one_hundred() {
        let done = StepStatus::Completed { at: Utc::now() };
        let p = compute(&steps(&[done, done, StepStatus::Current]));
        // floor(100 / 3 * 2.5) = 83
        assert_eq!(p.percent, 83);
    }

    #[test]
    fn test_empty_step_list_is_zero() {
        let p = compute(&[]);
        assert_eq!(p.percent, 0);
        assert_eq!(p.current_step_index, None);
    }
}
