// ABOUTME: Brushless motor family keyed by stator size
// ABOUTME: Details describe KV and power ratings per supported voltage

use quadbase_core::{ComponentKind, LookupKind, ValidationErrors};
use serde::{Deserialize, Serialize};

use crate::traits::{ComponentHeader, ComponentSpec, DetailSpec, Reference};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motor {
    #[serde(flatten)]
    pub header: ComponentHeader,
    /// First two digits of the stator size, "28" in 2806
    pub stator_diameter: String,
    /// Remaining digits, "06" in 2806 or "06.5" in 2806.5
    pub stator_height: String,
    /// Winding layout such as 12N14P
    pub configuration: String,
    pub mount_height: f64,
    pub mount_width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorDetail {
    pub weight: f64,
    /// Watts
    pub max_power: u32,
    pub kv_per_volt: u32,
    #[serde(default)]
    pub peak_current: Option<f64>,
    #[serde(default)]
    pub idle_current: Option<f64>,
    /// Internal resistance in mOhm
    #[serde(default)]
    pub resistance: Option<f64>,
    /// RatedVoltage lookup id
    pub voltage: String,
}

impl Motor {
    pub fn stator_size(&self) -> String {
        format!("{}{}", self.stator_diameter, self.stator_height)
    }
}

fn check_char_count(errors: &mut ValidationErrors, field: &str, value: &str, min: usize, max: usize) {
    let count = value.chars().count();
    if count < min {
        errors.push(
            field,
            format!(
                "Ensure this field has at least {} characters (it has {}).",
                min, count
            ),
        );
    }
    errors.check_max_chars(field, value, max);
}

impl ComponentSpec for Motor {
    const KIND: ComponentKind = ComponentKind::Motor;
    const DETAIL_KINDS: &'static [&'static str] = &["rating"];
    type Detail = MotorDetail;

    fn header(&self) -> &ComponentHeader {
        &self.header
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.header.validate_into(&mut errors);
        check_char_count(&mut errors, "stator_diameter", &self.stator_diameter, 2, 2);
        check_char_count(&mut errors, "stator_height", &self.stator_height, 2, 4);
        errors.require_text("configuration", &self.configuration, 50);
        errors.into_result()
    }
}

impl DetailSpec for MotorDetail {
    fn detail_kind(&self) -> &'static str {
        "rating"
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_min("weight", self.weight, 0.0);
        errors.check_optional_min("peak_current", self.peak_current, 0.0);
        errors.check_optional_min("idle_current", self.idle_current, 0.0);
        errors.check_optional_min("resistance", self.resistance, 0.0);
        errors.into_result()
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::lookup(
            "voltage",
            LookupKind::RatedVoltage,
            self.voltage.clone(),
        )]
    }
}
