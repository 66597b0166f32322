use serde::Serialize;

use crate::models::Unit;

/// Where a set of logs stands against an activity's goal.
///
/// `achieved` and `remaining` are only meaningful when a goal is set and are
/// `None` otherwise. `remaining` never goes below zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal: Option<f64>,
    pub total: f64,
    pub achieved: Option<bool>,
    pub remaining: Option<f64>,
}

impl GoalProgress {
    /// Share of the goal covered so far, `None` without a (non-zero) goal.
    /// Can exceed 1.0.
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        match self.goal {
            Some(goal) if goal > 0.0 => Some(self.total / goal),
            _ => None,
        }
    }

    /// The same progress with quantities read in `unit` instead of the
    /// canonical unit. `achieved` is carried over, not recomputed.
    #[must_use]
    pub fn expressed_in(&self, unit: &Unit) -> GoalProgress {
        let goal = self.goal.map(|g| unit.from_canonical(g));
        let total = unit.from_canonical(self.total);
        GoalProgress {
            goal,
            total,
            achieved: self.achieved,
            remaining: goal.map(|g| (g - total).max(0.0)),
        }
    }
}

/// Sum canonical log quantities and compare them to a canonical goal.
///
/// The caller decides which logs belong to the period being evaluated.
pub fn evaluate<I>(goal: Option<f64>, logged: I) -> GoalProgress
where
    I: IntoIterator<Item = f64>,
{
    let total: f64 = logged.into_iter().sum();
    match goal {
        Some(goal) => GoalProgress {
            goal: Some(goal),
            total,
            achieved: Some(total >= goal),
            remaining: Some((goal - total).max(0.0)),
        },
        None => GoalProgress {
            goal: None,
            total,
            achieved: None,
            remaining: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_not_yet_met() {
        let progress = evaluate(Some(60.0), [45.0]);
        assert_eq!(progress.achieved, Some(false));
        assert!((progress.total - 45.0).abs() < f64::EPSILON);
        assert!((progress.remaining.unwrap() - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_goal_exceeded_floors_remaining() {
        let progress = evaluate(Some(60.0), vec![45.0, 20.0]);
        assert_eq!(progress.achieved, Some(true));
        assert!((progress.total - 65.0).abs() < f64::EPSILON);
        // Past completion the remainder stays at zero instead of going negative.
        assert_eq!(progress.remaining, Some(0.0));
    }

    #[test]
    fn test_goal_met_exactly() {
        let progress = evaluate(Some(30.0), [10.0, 20.0]);
        assert_eq!(progress.achieved, Some(true));
        assert_eq!(progress.remaining, Some(0.0));
    }

    #[test]
    fn test_no_goal() {
        let progress = evaluate(None, [5.0, 7.5]);
        assert_eq!(progress.achieved, None);
        assert_eq!(progress.remaining, None);
        assert_eq!(progress.fraction(), None);
        assert!((progress.total - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_logs() {
        let progress = evaluate(Some(10.0), std::iter::empty());
        assert_eq!(progress.total, 0.0);
        assert_eq!(progress.achieved, Some(false));
        assert_eq!(progress.remaining, Some(10.0));
    }

    #[test]
    fn test_zero_goal_is_always_achieved() {
        let progress = evaluate(Some(0.0), std::iter::empty());
        assert_eq!(progress.achieved, Some(true));
        assert_eq!(progress.fraction(), None);
    }

    #[test]
    fn test_expressed_in_hours() {
        let hours = Unit {
            id: 2,
            name: "hours".to_string(),
            group_id: 1,
            factor: 60.0,
            offset: 0.0,
            is_canonical: false,
        };
        let shown = evaluate(Some(120.0), [30.0, 60.0]).expressed_in(&hours);
        assert!((shown.goal.unwrap() - 2.0).abs() < f64::EPSILON);
        assert!((shown.total - 1.5).abs() < f64::EPSILON);
        assert!((shown.remaining.unwrap() - 0.5).abs() < f64::EPSILON);
        assert_eq!(shown.achieved, Some(false));
    }

    #[test]
    fn test_fraction() {
        let progress = evaluate(Some(60.0), [45.0]);
        assert!((progress.fraction().unwrap() - 0.75).abs() < f64::EPSILON);
    }
}
