use serde::{Deserialize, Serialize};

/// A single administered dose of a medication
///
/// Doses are independent inputs to superposition; their order does not matter.
#[derive(Serialize, Debug, Clone, PartialEq, Deserialize)]
pub struct MedicationDose {
    id: String,
    medication_id: String,
    timestamp: i64,
    amount: f64,
}

impl MedicationDose {
    /// Create a new dose
    ///
    /// # Arguments
    ///
    /// * `id` - Dose identifier
    /// * `medication_id` - Identifier of the medication taken
    /// * `timestamp` - Administration time in epoch milliseconds
    /// * `amount` - Dose amount in mg
    pub fn new(
        id: impl Into<String>,
        medication_id: impl Into<String>,
        timestamp: i64,
        amount: f64,
    ) -> Self {
        MedicationDose {
            id: id.into(),
            medication_id: medication_id.into(),
            timestamp,
            amount,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn medication_id(&self) -> &str {
        &self.medication_id
    }

    /// Administration time in epoch milliseconds
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Dose amount in mg
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn set_timestamp(&mut self, timestamp: i64) {
        self.timestamp = timestamp;
    }

    pub fn set_amount(&mut self, amount: f64) {
        self.amount = amount;
    }

    /// A dose with a non-finite or non-positive amount carries no information
    pub fn is_well_formed(&self) -> bool {
        self.amount.is_finite() && self.amount > 0.0
    }
}
