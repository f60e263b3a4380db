//! Medications and their pharmacokinetic parameters

use crate::error::PharmtrackError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A tracked medication with the parameters of its one-compartment model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    /// Stable identifier, referenced by [`MedicationDose::medication_id`](crate::data::MedicationDose::medication_id)
    pub id: String,
    /// Display name
    pub name: String,
    /// Pharmacokinetic parameters
    pub pk: PkParameters,
    /// Optional therapeutic window
    pub therapeutic_range: Option<TherapeuticRange>,
}

impl Medication {
    pub fn new(id: impl Into<String>, name: impl Into<String>, pk: PkParameters) -> Self {
        Medication {
            id: id.into(),
            name: name.into(),
            pk,
            therapeutic_range: None,
        }
    }

    pub fn with_therapeutic_range(mut self, range: TherapeuticRange) -> Self {
        self.therapeutic_range = Some(range);
        self
    }
}

/// One-compartment model parameters with first-order absorption and elimination
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PkParameters {
    /// Elimination half-life in hours (> 0)
    pub half_life: f64,
    /// Volume of distribution in L/kg (> 0)
    pub volume_of_distribution: f64,
    /// Bioavailable fraction in (0, 1]
    pub bioavailability: f64,
    /// Absorption rate constant per hour (> 0)
    pub absorption_rate: f64,
}

impl PkParameters {
    pub fn new(
        half_life: f64,
        volume_of_distribution: f64,
        bioavailability: f64,
        absorption_rate: f64,
    ) -> Self {
        PkParameters {
            half_life,
            volume_of_distribution,
            bioavailability,
            absorption_rate,
        }
    }

    /// Elimination rate constant, `ln(2) / half_life`
    #[inline]
    pub fn ke(&self) -> f64 {
        std::f64::consts::LN_2 / self.half_life
    }

    /// Absorption rate constant
    #[inline]
    pub fn ka(&self) -> f64 {
        self.absorption_rate
    }

    /// Reject parameters outside their physical domain.
    ///
    /// Values are never clamped; the first offending parameter is reported.
    pub fn validate(&self) -> Result<(), PharmtrackError> {
        if !(self.half_life.is_finite() && self.half_life > 0.0) {
            return Err(PharmtrackError::invalid("half_life", self.half_life));
        }
        if !(self.volume_of_distribution.is_finite() && self.volume_of_distribution > 0.0) {
            return Err(PharmtrackError::invalid(
                "volume_of_distribution",
                self.volume_of_distribution,
            ));
        }
        if !(self.absorption_rate.is_finite() && self.absorption_rate > 0.0) {
            return Err(PharmtrackError::invalid(
                "absorption_rate",
                self.absorption_rate,
            ));
        }
        if !(self.bioavailability > 0.0 && self.bioavailability <= 1.0) {
            return Err(PharmtrackError::invalid(
                "bioavailability",
                self.bioavailability,
            ));
        }
        Ok(())
    }
}

/// Target concentration window for a medication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TherapeuticRange {
    pub min: f64,
    pub max: f64,
    /// Free-form unit label, e.g. "mg/L"
    pub unit: String,
}

impl TherapeuticRange {
    pub fn new(min: f64, max: f64, unit: impl Into<String>) -> Self {
        TherapeuticRange {
            min,
            max,
            unit: unit.into(),
        }
    }

    /// Classify a concentration against the window. Bounds are inclusive.
    pub fn status(&self, concentration: f64) -> TherapeuticStatus {
        if concentration < self.min {
            TherapeuticStatus::Below
        } else if concentration > self.max {
            TherapeuticStatus::Above
        } else {
            TherapeuticStatus::Within
        }
    }
}

/// Position of a concentration relative to the therapeutic range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TherapeuticStatus {
    Below,
    Within,
    Above,
}

impl fmt::Display for TherapeuticStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TherapeuticStatus::Below => write!(f, "below range"),
            TherapeuticStatus::Within => write!(f, "within range"),
            TherapeuticStatus::Above => write!(f, "above range"),
        }
    }
}
