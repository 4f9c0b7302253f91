//! The four-valued test status and its combination rule.
//!
//! Every check, phase, test, and suite verdict in Gauntlet is one of four
//! statuses, folded together by severity: a broken precondition
//! (`Inconclusive`) outranks a real defect (`Fail`), which outranks a
//! judgment call (`Subjective`), which outranks `Pass`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a check, phase, test, or whole suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Everything checked held.
    Pass,
    /// An assertion failed: a real defect.
    Fail,
    /// A precondition was not met; the verdict means nothing either way.
    Inconclusive,
    /// Something needs a human to judge; neither a pass nor a fail.
    Subjective,
}

impl Status {
    /// Severity rank used when folding statuses; higher wins.
    fn severity(self) -> u8 {
        match self {
            Status::Pass => 0,
            Status::Subjective => 1,
            Status::Fail => 2,
            Status::Inconclusive => 3,
        }
    }

    /// Whether this status counts as passing. Only `Pass` does.
    pub fn is_passing(self) -> bool {
        self == Status::Pass
    }

    /// Combines two statuses; the higher-severity one wins.
    pub fn combine(self, other: Status) -> Status {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    /// Folds a sequence of statuses into one aggregate.
    ///
    /// An empty sequence aggregates to `Inconclusive`: a phase that recorded
    /// nothing is suspect, not a silent pass.
    pub fn aggregate<I>(statuses: I) -> Status
    where
        I: IntoIterator<Item = Status>,
    {
        let mut iter = statuses.into_iter();
        let Some(first) = iter.next() else {
            return Status::Inconclusive;
        };
        iter.fold(first, Status::combine)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pass => write!(f, "PASS"),
            Status::Fail => write!(f, "FAIL"),
            Status::Inconclusive => write!(f, "INCONCLUSIVE"),
            Status::Subjective => write!(f, "SUBJECTIVE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pass_is_passing() {
        assert!(Status::Pass.is_passing());
        assert!(!Status::Fail.is_passing());
        assert!(!Status::Inconclusive.is_passing());
        assert!(!Status::Subjective.is_passing());
    }

    #[test]
    fn test_combine_higher_severity_wins() {
        assert_eq!(Status::Pass.combine(Status::Subjective), Status::Subjective);
        assert_eq!(Status::Subjective.combine(Status::Fail), Status::Fail);
        assert_eq!(
            Status::Fail.combine(Status::Inconclusive),
            Status::Inconclusive
        );
        assert_eq!(
            Status::Inconclusive.combine(Status::Pass),
            Status::Inconclusive
        );
    }

    #[test]
    fn test_combine_is_commutative() {
        let all = [
            Status::Pass,
            Status::Fail,
            Status::Inconclusive,
            Status::Subjective,
        ];
        for a in all {
            for b in all {
                assert_eq!(a.combine(b), b.combine(a));
            }
        }
    }

    #[test]
    fn test_aggregate_picks_highest_severity() {
        let statuses = [Status::Pass, Status::Subjective, Status::Fail, Status::Pass];
        assert_eq!(Status::aggregate(statuses), Status::Fail);

        let statuses = [Status::Fail, Status::Inconclusive, Status::Subjective];
        assert_eq!(Status::aggregate(statuses), Status::Inconclusive);
    }

    #[test]
    fn test_aggregate_all_pass() {
        assert_eq!(
            Status::aggregate([Status::Pass, Status::Pass]),
            Status::Pass
        );
    }

    #[test]
    fn test_aggregate_empty_is_inconclusive() {
        assert_eq!(Status::aggregate([]), Status::Inconclusive);
    }

    #[test]
    fn test_display() {
        assert_eq!(Status::Pass.to_string(), "PASS");
        assert_eq!(Status::Subjective.to_string(), "SUBJECTIVE");
    }
}
