use thiserror::Error;

#[derive(Error, Debug)]
pub enum PharmtrackError {
    /// A pharmacokinetic or request parameter is outside its valid domain
    #[error("Invalid parameter: {param} = {value}")]
    InvalidParameter { param: String, value: String },

    /// The requested time window is empty or reversed
    #[error("Invalid time window: start {start} must be before end {end}")]
    InvalidWindow { start: f64, end: f64 },

    /// A curve needs at least two samples
    #[error("Invalid sample count: {points}, need at least 2")]
    InvalidPoints { points: usize },

    /// The request was cancelled before it produced a result
    #[error("Computation cancelled")]
    Cancelled,

    #[error("Failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

impl PharmtrackError {
    pub(crate) fn invalid(param: &str, value: impl ToString) -> Self {
        PharmtrackError::InvalidParameter {
            param: param.to_string(),
            value: value.to_string(),
        }
    }
}
