// ABOUTME: Antenna family: frequency coverage, efficiency, and per-connector variants
// ABOUTME: Each antenna keeps at least one connector detail

use quadbase_core::{ComponentKind, LookupKind, ValidationErrors, NON_FIELD_ERRORS};
use serde::{Deserialize, Serialize};

use crate::traits::{ComponentHeader, ComponentSpec, DetailSpec, Reference};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Antenna {
    #[serde(flatten)]
    pub header: ComponentHeader,
    /// AntennaType lookup id
    #[serde(rename = "type")]
    pub antenna_type: String,
    pub center_frequency: f64,
    pub bandwidth_min: f64,
    pub bandwidth_max: f64,
    #[serde(default)]
    pub swr: Option<f64>,
    /// dBi
    #[serde(default)]
    pub gain: Option<f64>,
    /// Radiation efficiency, percent
    #[serde(default)]
    pub radiation: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleType {
    #[default]
    Straight,
    Angled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennaDetail {
    /// AntennaConnector lookup id
    pub connector_type: String,
    pub weight: f64,
    #[serde(default)]
    pub angle_type: AngleType,
}

impl ComponentSpec for Antenna {
    const KIND: ComponentKind = ComponentKind::Antenna;
    const DETAIL_KINDS: &'static [&'static str] = &["connector"];
    type Detail = AntennaDetail;

    fn header(&self) -> &ComponentHeader {
        &self.header
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.header.validate_into(&mut errors);
        errors.check_optional_range("swr", self.swr, 1.0, 100.0);
        errors.check_optional_min("gain", self.gain, 0.0);
        errors.check_optional_range("radiation", self.radiation.map(f64::from), 1.0, 100.0);

        let in_band = self.bandwidth_min <= self.center_frequency
            && self.center_frequency <= self.bandwidth_max;
        errors.ensure(
            in_band,
            NON_FIELD_ERRORS,
            "Max frequency must be higher or equal to min frequency and center_frequency must be between them.",
        );
        errors.into_result()
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::lookup(
            "type",
            LookupKind::AntennaType,
            self.antenna_type.clone(),
        )]
    }
}

impl DetailSpec for AntennaDetail {
    fn detail_kind(&self) -> &'static str {
        "connector"
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_min("weight", self.weight, 0.0);
        errors.into_result()
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::lookup(
            "connector_type",
            LookupKind::AntennaConnector,
            self.connector_type.clone(),
        )]
    }
}
