//! Record-level classification: three dimension scores folded into one
//! [`ClassifiedPatient`].

use serde_json::Value;

use super::engine::ScoringEngine;
use crate::models::{ClassifiedPatient, RawPatientRecord};

/// Issue text carried by fallback records.
pub const PROCESSING_ERROR: &str = "Processing error";

const UNKNOWN: &str = "Unknown";

impl ScoringEngine {
    /// Score one decoded record. Issues are collected in bp, temperature,
    /// age order.
    pub fn classify(&self, record: RawPatientRecord) -> ClassifiedPatient {
        let bp = self.blood_pressure(&record.blood_pressure);
        let temp = self.temperature(&record.temperature);
        let age = self.age(&record.age);

        let data_issues: Vec<String> = [&bp, &temp, &age]
            .into_iter()
            .filter(|r| r.has_issue)
            .filter_map(|r| r.issue.clone())
            .collect();

        ClassifiedPatient {
            record,
            bp_score: bp.score,
            temp_score: temp.score,
            age_score: age.score,
            total_score: bp.score + temp.score + age.score,
            has_data_issues: !data_issues.is_empty(),
            data_issues,
        }
    }

    /// Classify one raw page entry, substituting a fallback record when the
    /// entry cannot be read as a patient at all. Never fails.
    pub fn classify_value(&self, value: &Value, index: usize) -> ClassifiedPatient {
        match RawPatientRecord::from_value(value) {
            Ok(record) => self.classify(record),
            Err(e) => {
                tracing::warn!(index, error = %e, "Unreadable patient record, using fallback");
                fallback_patient(value, index)
            }
        }
    }

    /// Classify a whole batch. The output has exactly one entry per input.
    pub fn classify_all(&self, values: &[Value]) -> Vec<ClassifiedPatient> {
        let patients: Vec<ClassifiedPatient> = values
            .iter()
            .enumerate()
            .map(|(i, v)| self.classify_value(v, i))
            .collect();

        let flagged = patients.iter().filter(|p| p.has_data_issues).count();
        tracing::info!(total = patients.len(), flagged, "Classified patient records");
        patients
    }
}

/// Placeholder for an entry that is not record-shaped. All scores are 0 and
/// the only issue is [`PROCESSING_ERROR`].
pub fn fallback_patient(value: &Value, index: usize) -> ClassifiedPatient {
    let patient_id = value
        .get("patient_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map_or_else(|| format!("UNKNOWN_{index}"), str::to_string);

    ClassifiedPatient {
        record: RawPatientRecord {
            patient_id: Some(patient_id),
            name: Some("Unknown Patient".into()),
            age: Value::String(UNKNOWN.into()),
            gender: Some(UNKNOWN.into()),
            blood_pressure: Value::String(UNKNOWN.into()),
            temperature: Value::String(UNKNOWN.into()),
            visit_date: Some(UNKNOWN.into()),
            diagnosis: Some(UNKNOWN.into()),
            medications: Some(UNKNOWN.into()),
        },
        bp_score: 0,
        temp_score: 0,
        age_score: 0,
        total_score: 0,
        has_data_issues: true,
        data_issues: vec![PROCESSING_ERROR.to_string()],
    }
}
