//! Ghost Score: the 0-100 checkout health score.

use serde::{Deserialize, Serialize};

use crate::types::{FrictionPoints, Severity};

/// Points deducted per friction point of the given severity.
const fn penalty(severity: Severity) -> u32 {
    match severity {
        Severity::Critical => 15,
        Severity::High => 8,
        Severity::Medium => 3,
    }
}

/// Ghost Score for a set of friction points.
#[must_use]
pub fn ghost_score(friction: &FrictionPoints) -> u8 {
    let deducted: u32 = Severity::ALL
        .into_iter()
        .map(|severity| {
            let count = u32::try_from(friction.count(severity)).unwrap_or(u32::MAX);
            count.saturating_mul(penalty(severity))
        })
        .fold(0, u32::saturating_add);

    u8::try_from(100_u32.saturating_sub(deducted)).unwrap_or(0)
}

/// Qualitative band of a Ghost Score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    /// Band a score falls into.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        match score {
            85.. => Self::Excellent,
            70..=84 => Self::Good,
            50..=69 => Self::Fair,
            _ => Self::Poor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FrictionPoint;

    fn points(critical: usize, high: usize, medium: usize) -> FrictionPoints {
        let fp = FrictionPoint {
            title: "t".to_string(),
            location: "l".to_string(),
            impact: "i".to_string(),
            affected_segment: "s".to_string(),
            fix: "f".to_string(),
        };
        FrictionPoints {
            critical: vec![fp.clone(); critical],
            high: vec![fp.clone(); high],
            medium: vec![fp; medium],
        }
    }

    #[test]
    fn perfect_score_without_friction() {
        assert_eq!(ghost_score(&FrictionPoints::default()), 100);
    }

    #[test]
    fn deductions_per_severity() {
        assert_eq!(ghost_score(&points(1, 2, 3)), 100 - 15 - 16 - 9);
    }

    #[test]
    fn floors_at_zero() {
        assert_eq!(ghost_score(&points(10, 0, 0)), 0);
    }

    #[test]
    fn bands() {
        assert_eq!(ScoreBand::from_score(100), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(85), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_score(84), ScoreBand::Good);
        assert_eq!(ScoreBand::from_score(50), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_score(49), ScoreBand::Poor);
    }
}
