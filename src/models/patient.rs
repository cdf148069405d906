use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One patient as delivered by the remote API.
///
/// Nothing about the payload is trusted. Text fields accept any scalar and
/// collapse non-scalars to `None`; the three scored fields keep the raw JSON
/// value so the scoring engine can report exactly what was wrong with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPatientRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub patient_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub name: Option<String>,
    #[serde(default)]
    pub age: Value,
    #[serde(default, deserialize_with = "lenient_text")]
    pub gender: Option<String>,
    #[serde(default)]
    pub blood_pressure: Value,
    #[serde(default)]
    pub temperature: Value,
    #[serde(default, deserialize_with = "lenient_text")]
    pub visit_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub diagnosis: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub medications: Option<String>,
}

/// Why a raw entry could not be read as a patient record.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("Record is not a JSON object (found {0})")]
    NotAnObject(&'static str),

    #[error("Record could not be decoded: {0}")]
    Decode(String),
}

impl RawPatientRecord {
    /// Decode one entry of a page's record array.
    pub fn from_value(value: &Value) -> Result<Self, ProcessingError> {
        if !value.is_object() {
            return Err(ProcessingError::NotAnObject(json_kind(value)));
        }
        serde_json::from_value(value.clone()).map_err(|e| ProcessingError::Decode(e.to_string()))
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Score and validity verdict for one dimension of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub score: u32,
    pub has_issue: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
}

impl ScoreResult {
    pub fn valid(score: u32) -> Self {
        Self {
            score,
            has_issue: false,
            issue: None,
        }
    }

    pub fn flagged(issue: &str) -> Self {
        Self {
            score: 0,
            has_issue: true,
            issue: Some(issue.to_string()),
        }
    }
}

/// A record after scoring. Serialized with the camelCase score fields the
/// presentation layer expects, next to the original snake_case record fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedPatient {
    #[serde(flatten)]
    pub record: RawPatientRecord,
    pub bp_score: u32,
    pub temp_score: u32,
    pub age_score: u32,
    pub total_score: u32,
    pub has_data_issues: bool,
    pub data_issues: Vec<String>,
}

impl ClassifiedPatient {
    /// Display identifier, never empty.
    pub fn id(&self) -> &str {
        self.record.patient_id.as_deref().unwrap_or("UNKNOWN")
    }
}
