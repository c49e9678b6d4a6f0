// ABOUTME: Video transmitter (VTX) family
// ABOUTME: No details; supported formats, powers, and connectors are lookup sets

use quadbase_core::{ComponentKind, LookupKind, ValidationErrors, NON_FIELD_ERRORS};
use serde::{Deserialize, Serialize};

use super::camera::VideoOutput;
use crate::traits::{ComponentHeader, ComponentSpec, NoDetail, Reference};

fn default_microphone() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transmitter {
    #[serde(flatten)]
    pub header: ComponentHeader,
    pub input_voltage_min: f64,
    pub input_voltage_max: f64,
    pub output_voltage: f64,
    pub channels_quantity: u32,
    #[serde(default)]
    pub output: VideoOutput,
    /// Highest output power in mW
    pub max_power: u32,
    #[serde(default = "default_microphone")]
    pub microphone: bool,
    pub length: f64,
    pub height: f64,
    pub thickness: f64,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub video_formats: Vec<String>,
    #[serde(default)]
    pub output_powers: Vec<String>,
    #[serde(default)]
    pub antenna_connectors: Vec<String>,
}

impl ComponentSpec for Transmitter {
    const KIND: ComponentKind = ComponentKind::Transmitter;
    const DETAIL_KINDS: &'static [&'static str] = &[];
    type Detail = NoDetail;

    fn header(&self) -> &ComponentHeader {
        &self.header
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.header.validate_into(&mut errors);
        errors.check_min("input_voltage_min", self.input_voltage_min, 0.0);
        errors.check_min("input_voltage_max", self.input_voltage_max, 0.0);
        errors.check_min("output_voltage", self.output_voltage, 0.0);
        errors.check_optional_min("weight", self.weight, 0.0);
        errors.ensure(
            self.input_voltage_min <= self.input_voltage_max,
            NON_FIELD_ERRORS,
            "Max. input voltage must be higher or equal to min. input voltage",
        );
        errors.into_result()
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = Reference::lookups("video_formats", LookupKind::VideoFormat, &self.video_formats);
        refs.extend(Reference::lookups(
            "output_powers",
            LookupKind::OutputPower,
            &self.output_powers,
        ));
        refs.extend(Reference::lookups(
            "antenna_connectors",
            LookupKind::AntennaConnector,
            &self.antenna_connectors,
        ));
        refs
    }
}
