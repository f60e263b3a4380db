use serde::{Deserialize, Serialize};

/// Sleep stage reported by a tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepStage {
    Light,
    Deep,
    Rem,
    Awake,
}

impl SleepStage {
    pub fn is_asleep(&self) -> bool {
        !matches!(self, SleepStage::Awake)
    }
}

/// One staged interval of a sleep session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepRecord {
    /// Interval start in epoch milliseconds
    pub timestamp: i64,
    /// Interval length in seconds
    pub duration_seconds: f64,
    pub stage: SleepStage,
}

impl SleepRecord {
    pub fn new(timestamp: i64, duration_seconds: f64, stage: SleepStage) -> Self {
        SleepRecord {
            timestamp,
            duration_seconds,
            stage,
        }
    }

    pub fn minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }
}

/// A night of staged records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSession {
    pub id: String,
    pub records: Vec<SleepRecord>,
}

impl SleepSession {
    pub fn new(id: impl Into<String>, records: Vec<SleepRecord>) -> Self {
        SleepSession {
            id: id.into(),
            records,
        }
    }

    /// Earliest record timestamp, `None` for an empty session
    pub fn start_time(&self) -> Option<i64> {
        self.records.iter().map(|r| r.timestamp).min()
    }
}
