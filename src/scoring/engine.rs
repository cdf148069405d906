//! Per-dimension risk scoring.
//!
//! Each operation takes one untrusted field and returns a [`ScoreResult`].
//! None of them can fail: unreadable input comes back as a flagged result
//! with score 0 and a fixed issue text.

use serde_json::Value;

use super::coerce::{coerce_decimal, coerce_integer, leading_integer, Coerced};
use crate::config::{RiskThresholds, ScoringBands, ScoringConfig};
use crate::models::ScoreResult;

pub const MISSING_BLOOD_PRESSURE: &str = "Missing blood pressure";
pub const INVALID_BLOOD_PRESSURE_FORMAT: &str = "Invalid blood pressure format";
pub const INVALID_BLOOD_PRESSURE_VALUES: &str = "Invalid blood pressure values";
pub const MISSING_TEMPERATURE: &str = "Missing temperature";
pub const INVALID_TEMPERATURE: &str = "Invalid temperature value";
pub const MISSING_AGE: &str = "Missing age";
pub const INVALID_AGE: &str = "Invalid age value";

/// Published criteria score under-40 the same as 40–65.
const UNDER_MIDDLE_AGE_SCORE: u32 = 1;

/// Stateless scorer parameterized by thresholds and bands.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.config.thresholds
    }

    /// Score a `"<systolic>/<diastolic>"` reading.
    ///
    /// The final score is the worse of the two per-reading stages. Diastolic
    /// readings jump from stage 1 straight to 3: there is no elevated tier.
    pub fn blood_pressure(&self, value: &Value) -> ScoreResult {
        let raw = match value {
            Value::Null => return ScoreResult::flagged(MISSING_BLOOD_PRESSURE),
            Value::String(s) if s.is_empty() => {
                return ScoreResult::flagged(MISSING_BLOOD_PRESSURE)
            }
            Value::String(s) => s.as_str(),
            _ => return ScoreResult::flagged(INVALID_BLOOD_PRESSURE_FORMAT),
        };

        let parts: Vec<&str> = raw.split('/').collect();
        let [systolic_raw, diastolic_raw] = parts.as_slice() else {
            return ScoreResult::flagged(INVALID_BLOOD_PRESSURE_FORMAT);
        };

        if systolic_raw.is_empty() || diastolic_raw.is_empty() {
            return ScoreResult::flagged(INVALID_BLOOD_PRESSURE_VALUES);
        }
        let (Some(systolic), Some(diastolic)) =
            (leading_integer(systolic_raw), leading_integer(diastolic_raw))
        else {
            return ScoreResult::flagged(INVALID_BLOOD_PRESSURE_VALUES);
        };

        let bands = &self.config.bands;
        ScoreResult::valid(systolic_stage(systolic, bands).max(diastolic_stage(diastolic, bands)))
    }

    /// Score a body temperature in °F.
    ///
    /// Any readable number is accepted, including physiologically impossible
    /// ones.
    pub fn temperature(&self, value: &Value) -> ScoreResult {
        let temp = match coerce_decimal(value) {
            Coerced::Number(t) => t,
            Coerced::Missing => return ScoreResult::flagged(MISSING_TEMPERATURE),
            Coerced::Invalid => return ScoreResult::flagged(INVALID_TEMPERATURE),
        };

        let thresholds = &self.config.thresholds;
        if temp >= thresholds.high_fever_temperature {
            ScoreResult::valid(2)
        } else if temp >= thresholds.fever_temperature {
            ScoreResult::valid(1)
        } else {
            ScoreResult::valid(0)
        }
    }

    /// Score an age in years. Under-40 and 40–65 share the same score.
    pub fn age(&self, value: &Value) -> ScoreResult {
        let age = match coerce_integer(value) {
            Coerced::Number(a) => a,
            Coerced::Missing => return ScoreResult::flagged(MISSING_AGE),
            Coerced::Invalid => return ScoreResult::flagged(INVALID_AGE),
        };

        let bands = &self.config.bands;
        if age > bands.age_senior {
            ScoreResult::valid(2)
        } else if age >= bands.age_middle {
            ScoreResult::valid(1)
        } else {
            ScoreResult::valid(UNDER_MIDDLE_AGE_SCORE)
        }
    }
}

fn systolic_stage(systolic: f64, bands: &ScoringBands) -> u32 {
    if systolic >= bands.systolic_stage2 {
        4
    } else if systolic >= bands.systolic_stage1 {
        3
    } else if systolic >= bands.systolic_elevated {
        2
    } else {
        1
    }
}

fn diastolic_stage(diastolic: f64, bands: &ScoringBands) -> u32 {
    if diastolic >= bands.diastolic_stage2 {
        4
    } else if diastolic >= bands.diastolic_stage1 {
        3
    } else {
        1
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> ScoringEngine {
        ScoringEngine::default()
    }

    fn bp(raw: &str) -> ScoreResult {
        engine().blood_pressure(&json!(raw))
    }

    #[test]
    fn bp_takes_worse_of_two_readings() {
        assert_eq!(bp("145/70").score, 4);
        assert_eq!(bp("110/95").score, 4);
        assert_eq!(bp("125/85").score, 3);
        assert_eq!(bp("135/70").score, 3);
        assert_eq!(bp("125/70").score, 2);
        assert_eq!(bp("115/75").score, 1);
    }

    #[test]
    fn bp_band_boundaries() {
        assert_eq!(bp("119/79").score, 1);
        assert_eq!(bp("120/79").score, 2);
        assert_eq!(bp("129/79").score, 2);
        assert_eq!(bp("130/79").score, 3);
        assert_eq!(bp("139/79").score, 3);
        assert_eq!(bp("140/79").score, 4);
        assert_eq!(bp("110/80").score, 3);
        assert_eq!(bp("110/89").score, 3);
        assert_eq!(bp("110/90").score, 4);
    }

    #[test]
    fn diastolic_has_no_elevated_tier() {
        for d in 0..200 {
            let score = bp(&format!("100/{d}")).score;
            assert_ne!(score, 2, "diastolic {d} must never produce 2");
        }
    }

    #[test]
    fn bp_matches_max_of_bands_across_grid() {
        let bands = ScoringBands::default();
        for s in (90..=160).step_by(5) {
            for d in (60..=100).step_by(5) {
                let expected =
                    systolic_stage(s as f64, &bands).max(diastolic_stage(d as f64, &bands));
                assert_eq!(bp(&format!("{s}/{d}")).score, expected, "{s}/{d}");
            }
        }
    }

    #[test]
    fn bp_missing() {
        assert_eq!(bp(""), ScoreResult::flagged(MISSING_BLOOD_PRESSURE));
        assert_eq!(
            engine().blood_pressure(&Value::Null),
            ScoreResult::flagged(MISSING_BLOOD_PRESSURE)
        );
    }

    #[test]
    fn bp_invalid_format() {
        assert_eq!(bp("120"), ScoreResult::flagged(INVALID_BLOOD_PRESSURE_FORMAT));
        assert_eq!(bp("120/80/60"), ScoreResult::flagged(INVALID_BLOOD_PRESSURE_FORMAT));
        assert_eq!(
            engine().blood_pressure(&json!(12080)),
            ScoreResult::flagged(INVALID_BLOOD_PRESSURE_FORMAT)
        );
    }

    #[test]
    fn bp_invalid_values() {
        assert_eq!(bp("abc/80"), ScoreResult::flagged(INVALID_BLOOD_PRESSURE_VALUES));
        assert_eq!(bp("120/"), ScoreResult::flagged(INVALID_BLOOD_PRESSURE_VALUES));
        assert_eq!(bp("/80"), ScoreResult::flagged(INVALID_BLOOD_PRESSURE_VALUES));
        assert_eq!(bp("INVALID/BP"), ScoreResult::flagged(INVALID_BLOOD_PRESSURE_VALUES));
    }

    #[test]
    fn temperature_bands() {
        let e = engine();
        assert_eq!(e.temperature(&json!(101.0)), ScoreResult::valid(2));
        assert_eq!(e.temperature(&json!(103.4)), ScoreResult::valid(2));
        assert_eq!(e.temperature(&json!(100.9)), ScoreResult::valid(1));
        assert_eq!(e.temperature(&json!(99.6)), ScoreResult::valid(1));
        assert_eq!(e.temperature(&json!(99.5)), ScoreResult::valid(0));
        assert_eq!(e.temperature(&json!(98.6)), ScoreResult::valid(0));
        assert_eq!(e.temperature(&json!("101.2")), ScoreResult::valid(2));
    }

    #[test]
    fn temperature_issues() {
        let e = engine();
        assert_eq!(e.temperature(&Value::Null), ScoreResult::flagged(MISSING_TEMPERATURE));
        assert_eq!(e.temperature(&json!("")), ScoreResult::flagged(MISSING_TEMPERATURE));
        assert_eq!(
            e.temperature(&json!("not a number")),
            ScoreResult::flagged(INVALID_TEMPERATURE)
        );
    }

    #[test]
    fn temperature_accepts_impossible_numbers() {
        let e = engine();
        assert_eq!(e.temperature(&json!(-40)), ScoreResult::valid(0));
        assert_eq!(e.temperature(&json!(300)), ScoreResult::valid(2));
    }

    #[test]
    fn age_bands() {
        let e = engine();
        assert_eq!(e.age(&json!(66)), ScoreResult::valid(2));
        assert_eq!(e.age(&json!(65)), ScoreResult::valid(1));
        assert_eq!(e.age(&json!(40)), ScoreResult::valid(1));
        assert_eq!(e.age(&json!(39)), ScoreResult::valid(1));
        assert_eq!(e.age(&json!(0)), ScoreResult::valid(1));
        assert_eq!(e.age(&json!("70")), ScoreResult::valid(2));
    }

    #[test]
    fn age_string_truncates_but_number_does_not() {
        let e = engine();
        assert_eq!(e.age(&json!("65.9")).score, 1);
        assert_eq!(e.age(&json!(65.5)).score, 2);
    }

    #[test]
    fn age_issues() {
        let e = engine();
        assert_eq!(e.age(&Value::Null), ScoreResult::flagged(MISSING_AGE));
        assert_eq!(e.age(&json!("")), ScoreResult::flagged(MISSING_AGE));
        assert_eq!(e.age(&json!("fifty-three")), ScoreResult::flagged(INVALID_AGE));
        assert_eq!(e.age(&json!("unknown")), ScoreResult::flagged(INVALID_AGE));
    }

    #[test]
    fn custom_bands_are_respected() {
        let mut config = ScoringConfig::default();
        config.thresholds.fever_temperature = 100.4;
        config.bands.age_senior = 70.0;
        let e = ScoringEngine::new(config);
        assert_eq!(e.temperature(&json!(100.0)).score, 0);
        assert_eq!(e.temperature(&json!(100.4)).score, 1);
        assert_eq!(e.age(&json!(68)).score, 1);
        assert_eq!(e.age(&json!(71)).score, 2);
    }

    #[test]
    fn scoring_is_idempotent() {
        let e = engine();
        let values = [json!("150/95"), json!("bad"), json!(100.1), json!("")];
        for v in &values {
            assert_eq!(e.blood_pressure(v), e.blood_pressure(v));
            assert_eq!(e.temperature(v), e.temperature(v));
            assert_eq!(e.age(v), e.age(v));
        }
    }
}
