use serde::{Deserialize, Serialize};

use crate::constants::{MAX_MEASUREMENT_VALUE, MAX_NOTES_LEN};
use crate::models::profile::sanitize_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitPreference {
    Slim,
    Regular,
    Relaxed,
}

impl FitPreference {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "slim" => Some(FitPreference::Slim),
            "regular" => Some(FitPreference::Regular),
            "relaxed" => Some(FitPreference::Relaxed),
            _ => None,
        }
    }
}

/// Body measurements stored per profile, keyed by share token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementsRecord {
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub hip: Option<f64>,
    pub shoulder: Option<f64>,
    pub neck: Option<f64>,
    pub arm: Option<f64>,
    pub thigh: Option<f64>,
    pub inseam: Option<f64>,
    pub height: Option<f64>,
    #[serde(rename = "fitPreference")]
    pub fit_preference: Option<FitPreference>,
    pub notes: Option<String>,
    /// Unix milliseconds of the last change
    #[serde(rename = "updatedAt")]
    pub updated_at: i64,
}

/// Measurement update as submitted by a client
///
/// Values arrive as JSON numbers or numeric strings. Anything that does not
/// sanitise to a valid value leaves the stored field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeasurementInput {
    pub chest: Option<serde_json::Value>,
    pub waist: Option<serde_json::Value>,
    pub hip: Option<serde_json::Value>,
    pub shoulder: Option<serde_json::Value>,
    pub neck: Option<serde_json::Value>,
    pub arm: Option<serde_json::Value>,
    pub thigh: Option<serde_json::Value>,
    pub inseam: Option<serde_json::Value>,
    pub height: Option<serde_json::Value>,
    #[serde(rename = "fitPreference")]
    pub fit_preference: Option<String>,
    pub notes: Option<String>,
}

/// Sanitised measurement update; `None` fields are left as stored
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementUpdate {
    pub chest: Option<f64>,
    pub waist: Option<f64>,
    pub hip: Option<f64>,
    pub shoulder: Option<f64>,
    pub neck: Option<f64>,
    pub arm: Option<f64>,
    pub thigh: Option<f64>,
    pub inseam: Option<f64>,
    pub height: Option<f64>,
    pub fit_preference: Option<FitPreference>,
    pub notes: Option<String>,
}

/// Parse a measurement into `0..=999`, rounded to one decimal place
pub fn sanitize_measurement(value: &serde_json::Value) -> Option<f64> {
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() || !(0.0..=MAX_MEASUREMENT_VALUE).contains(&number) {
        return None;
    }
    Some((number * 10.0).round() / 10.0)
}

impl MeasurementInput {
    pub fn sanitize(&self) -> MeasurementUpdate {
        let field = |v: &Option<serde_json::Value>| v.as_ref().and_then(sanitize_measurement);
        MeasurementUpdate {
            chest: field(&self.chest),
            waist: field(&self.waist),
            hip: field(&self.hip),
            shoulder: field(&self.shoulder),
            neck: field(&self.neck),
            arm: field(&self.arm),
            thigh: field(&self.thigh),
            inseam: field(&self.inseam),
            height: field(&self.height),
            fit_preference: self.fit_preference.as_deref().and_then(FitPreference::parse),
            notes: self
                .notes
                .as_deref()
                .map(|n| sanitize_text(n, MAX_NOTES_LEN))
                .filter(|n| !n.is_empty()),
        }
    }
}

impl MeasurementsRecord {
    /// Apply the present fields of `update`, stamping `updated_at`
    pub fn apply(&mut self, update: &MeasurementUpdate, now: i64) {
        fn set<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if let Some(v) = value {
                *slot = Some(v.clone());
            }
        }

        set(&mut self.chest, &update.chest);
        set(&mut self.waist, &update.waist);
        set(&mut self.hip, &update.hip);
        set(&mut self.shoulder, &update.shoulder);
        set(&mut self.neck, &update.neck);
        set(&mut self.arm, &update.arm);
        set(&mut self.thigh, &update.thigh);
        set(&mut self.inseam, &update.inseam);
        set(&mut self.height, &update.height);
        set(&mut self.fit_preference, &update.fit_preference);
        set(&mut self.notes, &update.notes);
        self.updated_at = now;
    }
}
