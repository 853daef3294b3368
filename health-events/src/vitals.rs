//! Vital-sign evaluation
//!
//! Maps a set of numeric readings onto a discrete evaluation: a severity band
//! plus one human-readable reason per out-of-range reading. This is the
//! boundary between the continuous-signal domain (thresholds over numbers)
//! and the discrete-event domain (alerts); the lifecycle service consumes the
//! result through `create_from_vital_evaluation`.

use crate::types::{Timestamp, VitalReadings};
use chrono::Utc;
use serde::{Deserialize, Serialize};

// Attention band: worth a look. Urgent band: needs action now.
const HEART_RATE_ATTENTION_LOW: f64 = 50.0;
const HEART_RATE_ATTENTION_HIGH: f64 = 110.0;
const HEART_RATE_URGENT_LOW: f64 = 40.0;
const HEART_RATE_URGENT_HIGH: f64 = 130.0;

const SPO2_ATTENTION_LOW: f64 = 94.0;
const SPO2_URGENT_LOW: f64 = 90.0;

const SYSTOLIC_ATTENTION_HIGH: f64 = 140.0;
const SYSTOLIC_URGENT_HIGH: f64 = 180.0;
const SYSTOLIC_URGENT_LOW: f64 = 90.0;

const DIASTOLIC_ATTENTION_HIGH: f64 = 90.0;
const DIASTOLIC_URGENT_HIGH: f64 = 120.0;

const TEMPERATURE_ATTENTION_HIGH: f64 = 38.0;
const TEMPERATURE_URGENT_HIGH: f64 = 39.5;
const TEMPERATURE_URGENT_LOW: f64 = 35.0;

const RESPIRATORY_ATTENTION_HIGH: f64 = 24.0;
const RESPIRATORY_URGENT_HIGH: f64 = 30.0;
const RESPIRATORY_URGENT_LOW: f64 = 8.0;

/// Outcome band of one evaluation cycle, ordered by urgency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSeverity {
    Normal,
    Attention,
    Urgent,
}

/// Result of evaluating one set of vital readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalEvaluation {
    pub severity: EvaluationSeverity,
    /// One human-readable reason per out-of-range reading
    pub reasons: Vec<String>,
    pub timestamp: Timestamp,
}

impl VitalEvaluation {
    /// True when no reading was out of range
    pub fn is_normal(&self) -> bool {
        self.severity == EvaluationSeverity::Normal
    }
}

/// Evaluate a set of readings against the clinical threshold bands
///
/// Readings that are absent are skipped. The overall severity is the worst
/// band hit by any reading; a fully in-range set yields `Normal` with no
/// reasons.
pub fn evaluate_readings(readings: &VitalReadings) -> VitalEvaluation {
    let mut severity = EvaluationSeverity::Normal;
    let mut reasons = Vec::new();

    let mut record = |band: EvaluationSeverity, reason: String| {
        severity = severity.max(band);
        reasons.push(reason);
    };

    if let Some(heart_rate) = readings.heart_rate {
        let reason = format!("Heart rate: {:.0} bpm", heart_rate);
        if heart_rate < HEART_RATE_URGENT_LOW || heart_rate > HEART_RATE_URGENT_HIGH {
            record(EvaluationSeverity::Urgent, reason);
        } else if heart_rate < HEART_RATE_ATTENTION_LOW || heart_rate > HEART_RATE_ATTENTION_HIGH {
            record(EvaluationSeverity::Attention, reason);
        }
    }

    if let Some(spo2) = readings.spo2 {
        let reason = format!("SpO2: {:.0}%", spo2);
        if spo2 < SPO2_URGENT_LOW {
            record(EvaluationSeverity::Urgent, reason);
        } else if spo2 < SPO2_ATTENTION_LOW {
            record(EvaluationSeverity::Attention, reason);
        }
    }

    if let Some(systolic) = readings.systolic {
        let reason = format!("Systolic pressure: {:.0} mmHg", systolic);
        if systolic > SYSTOLIC_URGENT_HIGH || systolic < SYSTOLIC_URGENT_LOW {
            record(EvaluationSeverity::Urgent, reason);
        } else if systolic > SYSTOLIC_ATTENTION_HIGH {
            record(EvaluationSeverity::Attention, reason);
        }
    }

    if let Some(diastolic) = readings.diastolic {
        let reason = format!("Diastolic pressure: {:.0} mmHg", diastolic);
        if diastolic > DIASTOLIC_URGENT_HIGH {
            record(EvaluationSeverity::Urgent, reason);
        } else if diastolic > DIASTOLIC_ATTENTION_HIGH {
            record(EvaluationSeverity::Attention, reason);
        }
    }

    if let Some(temperature) = readings.temperature {
        let reason = format!("Temperature: {:.1} °C", temperature);
        if temperature > TEMPERATURE_URGENT_HIGH || temperature < TEMPERATURE_URGENT_LOW {
            record(EvaluationSeverity::Urgent, reason);
        } else if temperature > TEMPERATURE_ATTENTION_HIGH {
            record(EvaluationSeverity::Attention, reason);
        }
    }

    if let Some(respiratory_rate) = readings.respiratory_rate {
        let reason = format!("Respiratory rate: {:.0} breaths/min", respiratory_rate);
        if respiratory_rate > RESPIRATORY_URGENT_HIGH || respiratory_rate < RESPIRATORY_URGENT_LOW {
            record(EvaluationSeverity::Urgent, reason);
        } else if respiratory_rate > RESPIRATORY_ATTENTION_HIGH {
            record(EvaluationSeverity::Attention, reason);
        }
    }

    VitalEvaluation {
        severity,
        reasons,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn readings() -> VitalReadings {
        VitalReadings {
            heart_rate: Some(72.0),
            spo2: Some(98.0),
            systolic: Some(118.0),
            diastolic: Some(76.0),
            temperature: Some(36.8),
            respiratory_rate: Some(14.0),
            hrv: Some(52.0),
        }
    }

    #[test]
    fn test_in_range_readings_are_normal() {
        let evaluation = evaluate_readings(&readings());
        assert!(evaluation.is_normal());
        assert!(evaluation.reasons.is_empty());
    }

    #[test]
    fn test_empty_readings_are_normal() {
        let evaluation = evaluate_readings(&VitalReadings::default());
        assert!(evaluation.is_normal());
    }

    #[test]
    fn test_elevated_heart_rate_needs_attention() {
        let mut sample = readings();
        sample.heart_rate = Some(120.0);

        let evaluation = evaluate_readings(&sample);
        assert_eq!(evaluation.severity, EvaluationSeverity::Attention);
        assert_eq!(evaluation.reasons, vec!["Heart rate: 120 bpm".to_string()]);
    }

    #[test]
    fn test_extreme_heart_rate_is_urgent() {
        let mut sample = readings();
        sample.heart_rate = Some(38.0);

        let evaluation = evaluate_readings(&sample);
        assert_eq!(evaluation.severity, EvaluationSeverity::Urgent);
    }

    #[test]
    fn test_low_spo2_is_urgent() {
        let mut sample = readings();
        sample.spo2 = Some(88.0);

        let evaluation = evaluate_readings(&sample);
        assert_eq!(evaluation.severity, EvaluationSeverity::Urgent);
        assert_eq!(evaluation.reasons, vec!["SpO2: 88%".to_string()]);
    }

    #[test]
    fn test_worst_band_wins_with_one_reason_per_reading() {
        let mut sample = readings();
        sample.heart_rate = Some(115.0); // attention
        sample.temperature = Some(40.1); // urgent

        let evaluation = evaluate_readings(&sample);
        assert_eq!(evaluation.severity, EvaluationSeverity::Urgent);
        assert_eq!(evaluation.reasons.len(), 2);
        assert!(evaluation
            .reasons
            .contains(&"Heart rate: 115 bpm".to_string()));
        assert!(evaluation
            .reasons
            .contains(&"Temperature: 40.1 °C".to_string()));
    }

    #[test]
    fn test_band_ordering() {
        assert!(EvaluationSeverity::Normal < EvaluationSeverity::Attention);
        assert!(EvaluationSeverity::Attention < EvaluationSeverity::Urgent);
    }
}
