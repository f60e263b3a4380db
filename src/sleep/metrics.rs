//! Per-session sleep metrics

use crate::data::{SleepRecord, SleepStage};
use crate::sleep::score::{sleep_score, SleepScore};
use serde::{Deserialize, Serialize};

const MS_PER_MINUTE: f64 = 60_000.0;

/// Time spent in one stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StageBreakdown {
    pub minutes: f64,
    /// Share of the total recorded duration, in percent
    pub percentage: f64,
}

/// Metrics of a single staged sleep session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepMetrics {
    /// All recorded time, awake included
    pub total_duration_minutes: f64,
    /// Light, deep and REM time
    pub total_sleep_minutes: f64,
    pub light: StageBreakdown,
    pub deep: StageBreakdown,
    pub rem: StageBreakdown,
    pub awake: StageBreakdown,
    /// `total_sleep / total_duration * 100`
    pub efficiency: f64,
    /// Transitions into `awake` from a sleeping stage
    pub awakenings: usize,
    /// Mean length of an awake run following sleep
    pub average_awakening_minutes: f64,
    /// Minutes from the first record to the first deep stage
    pub deep_latency_minutes: Option<f64>,
    /// Minutes from the first record to the first REM stage
    pub rem_latency_minutes: Option<f64>,
    pub longest_deep_minutes: f64,
    pub longest_rem_minutes: f64,
    pub score: SleepScore,
}

impl SleepMetrics {
    fn empty() -> Self {
        SleepMetrics {
            total_duration_minutes: 0.0,
            total_sleep_minutes: 0.0,
            light: StageBreakdown::default(),
            deep: StageBreakdown::default(),
            rem: StageBreakdown::default(),
            awake: StageBreakdown::default(),
            efficiency: 0.0,
            awakenings: 0,
            average_awakening_minutes: 0.0,
            deep_latency_minutes: None,
            rem_latency_minutes: None,
            longest_deep_minutes: 0.0,
            longest_rem_minutes: 0.0,
            score: SleepScore::zero(),
        }
    }

    pub fn total_sleep_hours(&self) -> f64 {
        self.total_sleep_minutes / 60.0
    }

    pub fn stage(&self, stage: SleepStage) -> StageBreakdown {
        match stage {
            SleepStage::Light => self.light,
            SleepStage::Deep => self.deep,
            SleepStage::Rem => self.rem,
            SleepStage::Awake => self.awake,
        }
    }
}

/// Consecutive records of the same stage
struct Run {
    stage: SleepStage,
    minutes: f64,
}

/// Merge adjacent records that share a stage
fn runs(records: &[&SleepRecord]) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    for record in records {
        match runs.last_mut() {
            Some(run) if run.stage == record.stage => run.minutes += record.minutes(),
            _ => runs.push(Run {
                stage: record.stage,
                minutes: record.minutes(),
            }),
        }
    }
    runs
}

fn longest(runs: &[Run], stage: SleepStage) -> f64 {
    runs.iter()
        .filter(|r| r.stage == stage)
        .map(|r| r.minutes)
        .fold(0.0, f64::max)
}

/// Analyze one session of staged records
///
/// Records are ordered by timestamp before analysis, so callers may pass them
/// in any order. Records with a negative or non-finite duration are skipped.
/// An empty session yields zeroed metrics with a score of 0.
pub fn analyze_sleep_session(records: &[SleepRecord]) -> SleepMetrics {
    let mut valid: Vec<&SleepRecord> = records
        .iter()
        .filter(|r| {
            let ok = r.duration_seconds.is_finite() && r.duration_seconds >= 0.0;
            if !ok {
                tracing::warn!(
                    timestamp = r.timestamp,
                    duration_seconds = r.duration_seconds,
                    "Skipping sleep record with invalid duration"
                );
            }
            ok
        })
        .collect();
    valid.sort_by_key(|r| r.timestamp);

    let total_duration: f64 = valid.iter().map(|r| r.minutes()).sum();
    if valid.is_empty() || total_duration <= 0.0 {
        return SleepMetrics::empty();
    }

    let minutes_in = |stage: SleepStage| -> f64 {
        valid
            .iter()
            .filter(|r| r.stage == stage)
            .map(|r| r.minutes())
            .sum()
    };
    let breakdown = |stage: SleepStage| {
        let minutes = minutes_in(stage);
        StageBreakdown {
            minutes,
            percentage: minutes / total_duration * 100.0,
        }
    };

    let light = breakdown(SleepStage::Light);
    let deep = breakdown(SleepStage::Deep);
    let rem = breakdown(SleepStage::Rem);
    let awake = breakdown(SleepStage::Awake);
    let total_sleep = light.minutes + deep.minutes + rem.minutes;
    let efficiency = total_sleep / total_duration * 100.0;

    let runs = runs(&valid);
    let awakening_runs: Vec<&Run> = runs
        .windows(2)
        .filter(|w| w[0].stage.is_asleep() && w[1].stage == SleepStage::Awake)
        .map(|w| &w[1])
        .collect();
    let awakenings = awakening_runs.len();
    let average_awakening_minutes = if awakenings == 0 {
        0.0
    } else {
        awakening_runs.iter().map(|r| r.minutes).sum::<f64>() / awakenings as f64
    };

    let session_start = valid[0].timestamp;
    let latency = |stage: SleepStage| {
        valid
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| (r.timestamp - session_start) as f64 / MS_PER_MINUTE)
    };

    let score = sleep_score(
        efficiency,
        deep.percentage,
        rem.percentage,
        total_sleep / 60.0,
        awakenings,
    );

    SleepMetrics {
        total_duration_minutes: total_duration,
        total_sleep_minutes: total_sleep,
        light,
        deep,
        rem,
        awake,
        efficiency,
        awakenings,
        average_awakening_minutes,
        deep_latency_minutes: latency(SleepStage::Deep),
        rem_latency_minutes: latency(SleepStage::Rem),
        longest_deep_minutes: longest(&runs, SleepStage::Deep),
        longest_rem_minutes: longest(&runs, SleepStage::Rem),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sleep::score::SleepQuality;
    use approx::assert_relative_eq;

    const MINUTE: i64 = 60_000;

    /// Lay out `(stage, minutes)` back to back from t = 0
    fn night(stages: &[(SleepStage, i64)]) -> Vec<SleepRecord> {
        let mut t = 0;
        stages
            .iter()
            .map(|&(stage, minutes)| {
                let record = SleepRecord::new(t * MINUTE, (minutes * 60) as f64, stage);
                t += minutes;
                record
            })
            .collect()
    }

    #[test]
    fn empty_session_is_zeroed() {
        let metrics = analyze_sleep_session(&[]);
        assert_eq!(metrics.total_duration_minutes, 0.0);
        assert_eq!(metrics.score.total, 0.0);
        assert_eq!(metrics.score.quality, SleepQuality::Poor);
        assert!(metrics.deep_latency_minutes.is_none());
    }

    #[test]
    fn stage_totals_and_percentages() {
        use SleepStage::*;
        let records = night(&[(Light, 30), (Deep, 20), (Awake, 10), (Rem, 40)]);
        let metrics = analyze_sleep_session(&records);
        assert_relative_eq!(metrics.total_duration_minutes, 100.0);
        assert_relative_eq!(metrics.total_sleep_minutes, 90.0);
        assert_relative_eq!(metrics.light.percentage, 30.0);
        assert_relative_eq!(metrics.deep.minutes, 20.0);
        assert_relative_eq!(metrics.awake.percentage, 10.0);
        assert_relative_eq!(metrics.efficiency, 90.0);
        assert_eq!(metrics.deep_latency_minutes, Some(30.0));
        assert_eq!(metrics.rem_latency_minutes, Some(60.0));
    }

    #[test]
    fn awakenings_count_transitions_from_sleep() {
        use SleepStage::*;
        // Leading awake time is sleep onset, not an awakening; split awake
        // records count once
        let records = night(&[
            (Awake, 15),
            (Light, 30),
            (Awake, 4),
            (Awake, 2),
            (Deep, 40),
            (Awake, 10),
            (Rem, 20),
        ]);
        let metrics = analyze_sleep_session(&records);
        assert_eq!(metrics.awakenings, 2);
        assert_relative_eq!(metrics.average_awakening_minutes, 8.0);
    }

    #[test]
    fn longest_runs_merge_adjacent_records() {
        use SleepStage::*;
        let records = night(&[(Deep, 10), (Deep, 15), (Light, 5), (Deep, 20), (Rem, 12)]);
        let metrics = analyze_sleep_session(&records);
        assert_relative_eq!(metrics.longest_deep_minutes, 25.0);
        assert_relative_eq!(metrics.longest_rem_minutes, 12.0);
    }

    #[test]
    fn records_are_ordered_and_invalid_ones_skipped() {
        use SleepStage::*;
        let mut records = night(&[(Light, 30), (Deep, 30)]);
        records.reverse();
        records.push(SleepRecord::new(0, f64::NAN, Awake));
        records.push(SleepRecord::new(0, -60.0, Awake));
        let metrics = analyze_sleep_session(&records);
        assert_relative_eq!(metrics.total_duration_minutes, 60.0);
        assert_eq!(metrics.deep_latency_minutes, Some(30.0));
        assert_eq!(metrics.awakenings, 0);
    }

    #[test]
    fn healthy_night_scores_in_the_top_tier() {
        use SleepStage::*;
        // 480 min asleep: 17 % deep, 22 % REM, one brief awakening
        let mut records = night(&[
            (Light, 150),
            (Deep, 82),
            (Rem, 50),
            (Light, 100),
            (Rem, 55),
            (Light, 43),
        ]);
        // A zero-length awake marker keeps efficiency at 100 %
        let split = records[3].timestamp;
        records.insert(3, SleepRecord::new(split, 0.0, Awake));
        let metrics = analyze_sleep_session(&records);
        assert_eq!(metrics.awakenings, 1);
        assert_relative_eq!(metrics.efficiency, 100.0);
        assert!(metrics.score.total >= 90.0, "score {}", metrics.score.total);
        assert_eq!(metrics.score.quality, SleepQuality::Excellent);
    }
}
