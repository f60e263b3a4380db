//! Composite sleep score
//!
//! The score is the sum of five tiered sub-scores:
//!
//! | component   | max | full marks        |
//! |-------------|-----|-------------------|
//! | efficiency  | 25  | ≥ 90 %            |
//! | deep sleep  | 20  | 13–23 % of time   |
//! | REM sleep   | 20  | 20–25 % of time   |
//! | duration    | 25  | 7–9 h asleep      |
//! | awakenings  | 10  | at most 1         |

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl SleepQuality {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            SleepQuality::Excellent
        } else if score >= 75.0 {
            SleepQuality::Good
        } else if score >= 60.0 {
            SleepQuality::Fair
        } else {
            SleepQuality::Poor
        }
    }
}

impl fmt::Display for SleepQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SleepQuality::Poor => write!(f, "poor"),
            SleepQuality::Fair => write!(f, "fair"),
            SleepQuality::Good => write!(f, "good"),
            SleepQuality::Excellent => write!(f, "excellent"),
        }
    }
}

/// Sleep score with its components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepScore {
    /// 0 to 100
    pub total: f64,
    pub efficiency_points: f64,
    pub deep_points: f64,
    pub rem_points: f64,
    pub duration_points: f64,
    pub awakening_points: f64,
    pub quality: SleepQuality,
}

impl SleepScore {
    pub(crate) fn zero() -> Self {
        SleepScore {
            total: 0.0,
            efficiency_points: 0.0,
            deep_points: 0.0,
            rem_points: 0.0,
            duration_points: 0.0,
            awakening_points: 0.0,
            quality: SleepQuality::Poor,
        }
    }
}

fn efficiency_points(efficiency: f64) -> f64 {
    match efficiency {
        e if e >= 90.0 => 25.0,
        e if e >= 85.0 => 20.0,
        e if e >= 75.0 => 12.0,
        e if e >= 65.0 => 6.0,
        _ => 0.0,
    }
}

fn deep_points(percentage: f64) -> f64 {
    match percentage {
        p if (13.0..=23.0).contains(&p) => 20.0,
        p if (10.0..13.0).contains(&p) || (23.0..=28.0).contains(&p) => 14.0,
        p if (5.0..10.0).contains(&p) => 8.0,
        _ => 0.0,
    }
}

fn rem_points(percentage: f64) -> f64 {
    match percentage {
        p if (20.0..=25.0).contains(&p) => 20.0,
        p if (15.0..20.0).contains(&p) || (25.0..=30.0).contains(&p) => 14.0,
        p if (10.0..15.0).contains(&p) => 8.0,
        _ => 0.0,
    }
}

/// Below this much sleep a night earns no duration points
const MIN_SCORED_HOURS: f64 = 3.0;

fn duration_points(hours: f64) -> f64 {
    match hours {
        h if (7.0..=9.0).contains(&h) => 25.0,
        h if (6.0..7.0).contains(&h) || (9.0..=10.0).contains(&h) => 18.0,
        h if (5.0..6.0).contains(&h) => 10.0,
        h if h >= MIN_SCORED_HOURS => 4.0,
        _ => 0.0,
    }
}

fn awakening_points(awakenings: usize) -> f64 {
    match awakenings {
        0..=1 => 10.0,
        2..=3 => 7.0,
        4..=5 => 4.0,
        _ => 0.0,
    }
}

/// Score a session from its headline metrics
pub fn sleep_score(
    efficiency: f64,
    deep_percentage: f64,
    rem_percentage: f64,
    total_sleep_hours: f64,
    awakenings: usize,
) -> SleepScore {
    let efficiency_points = efficiency_points(efficiency);
    let deep_points = deep_points(deep_percentage);
    let rem_points = rem_points(rem_percentage);
    let duration_points = duration_points(total_sleep_hours);
    let awakening_points = awakening_points(awakenings);
    let total = (efficiency_points + deep_points + rem_points + duration_points + awakening_points)
        .clamp(0.0, 100.0);
    SleepScore {
        total,
        efficiency_points,
        deep_points,
        rem_points,
        duration_points,
        awakening_points,
        quality: SleepQuality::from_score(total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ideal_night_scores_full_marks() {
        let score = sleep_score(100.0, 17.0, 22.0, 8.0, 1);
        assert_eq!(score.total, 100.0);
        assert_eq!(score.quality, SleepQuality::Excellent);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(efficiency_points(85.0), 20.0);
        assert_eq!(efficiency_points(64.9), 0.0);
        assert_eq!(deep_points(13.0), 20.0);
        assert_eq!(deep_points(12.9), 14.0);
        assert_eq!(deep_points(30.0), 0.0);
        assert_eq!(rem_points(25.0), 20.0);
        assert_eq!(rem_points(9.0), 0.0);
        assert_eq!(duration_points(6.5), 18.0);
        assert_eq!(duration_points(3.0), 4.0);
        assert_eq!(duration_points(11.0), 4.0);
        assert_eq!(duration_points(2.9), 0.0);
        assert_eq!(duration_points(0.0), 0.0);
        assert_eq!(awakening_points(3), 7.0);
        assert_eq!(awakening_points(6), 0.0);
    }

    #[test]
    fn short_fragmented_night_is_poor() {
        let score = sleep_score(70.0, 8.0, 12.0, 4.5, 6);
        assert_eq!(score.total, 6.0 + 8.0 + 8.0 + 4.0);
        assert_eq!(score.quality, SleepQuality::Poor);
    }

    #[test]
    fn no_sleep_scores_near_zero() {
        let score = sleep_score(0.0, 0.0, 0.0, 0.0, 0);
        assert_eq!(score.duration_points, 0.0);
        assert!(score.total <= 10.0, "{}", score.total);
        assert_eq!(score.quality, SleepQuality::Poor);
    }

    #[test]
    fn quality_tiers() {
        assert_eq!(SleepQuality::from_score(90.0), SleepQuality::Excellent);
        assert_eq!(SleepQuality::from_score(75.0), SleepQuality::Good);
        assert_eq!(SleepQuality::from_score(60.0), SleepQuality::Fair);
        assert_eq!(SleepQuality::from_score(59.9), SleepQuality::Poor);
    }
}
