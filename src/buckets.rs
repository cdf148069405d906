//! Derived patient subsets for the dashboard.
//!
//! Everything here is a pure function of the classified list and the
//! configured thresholds, recomputed on demand.

use serde::Serialize;

use crate::config::RiskThresholds;
use crate::models::ClassifiedPatient;
use crate::scoring::coerce_decimal;

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Total score at or above the high-risk threshold, with clean data.
pub fn is_high_risk(patient: &ClassifiedPatient, thresholds: &RiskThresholds) -> bool {
    patient.total_score >= thresholds.high_risk_score && !patient.has_data_issues
}

/// Temperature readable as a number and at or above the fever threshold.
/// Data issues on other fields do not exclude a patient.
pub fn has_fever(patient: &ClassifiedPatient, thresholds: &RiskThresholds) -> bool {
    coerce_decimal(&patient.record.temperature)
        .number()
        .is_some_and(|t| t >= thresholds.fever_temperature)
}

pub fn has_data_issues(patient: &ClassifiedPatient) -> bool {
    patient.has_data_issues
}

// ---------------------------------------------------------------------------
// Badges
// ---------------------------------------------------------------------------

/// Severity styling for a score badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Default,
    Secondary,
    Destructive,
}

impl BadgeVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Secondary => "secondary",
            Self::Destructive => "destructive",
        }
    }
}

pub fn badge_variant(score: u32) -> BadgeVariant {
    if score >= 4 {
        BadgeVariant::Destructive
    } else if score >= 3 {
        BadgeVariant::Secondary
    } else {
        BadgeVariant::Default
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Summary counters shown above the patient tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PatientStats {
    pub total: usize,
    pub high_risk: usize,
    pub fever: usize,
    pub data_issues: usize,
}

/// The three alert lists plus their counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RiskBuckets {
    pub high_risk: Vec<ClassifiedPatient>,
    pub fever: Vec<ClassifiedPatient>,
    pub data_issues: Vec<ClassifiedPatient>,
    pub stats: PatientStats,
}

impl RiskBuckets {
    /// Partition `patients` into buckets. A patient may appear in several.
    pub fn from_patients(patients: &[ClassifiedPatient], thresholds: &RiskThresholds) -> Self {
        let high_risk = select(patients, |p| is_high_risk(p, thresholds));
        let fever = select(patients, |p| has_fever(p, thresholds));
        let data_issues = select(patients, has_data_issues);

        let stats = PatientStats {
            total: patients.len(),
            high_risk: high_risk.len(),
            fever: fever.len(),
            data_issues: data_issues.len(),
        };

        Self {
            high_risk,
            fever,
            data_issues,
            stats,
        }
    }

    pub fn ids(list: &[ClassifiedPatient]) -> Vec<String> {
        list.iter().map(|p| p.id().to_string()).collect()
    }
}

fn select<F>(patients: &[ClassifiedPatient], keep: F) -> Vec<ClassifiedPatient>
where
    F: Fn(&ClassifiedPatient) -> bool,
{
    patients.iter().filter(|p| keep(p)).cloned().collect()
}
