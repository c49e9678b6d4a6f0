// ABOUTME: Radio receiver family and its per-frequency detail variants
// ABOUTME: Antenna connectors and output protocols are many-to-many lookup sets

use quadbase_core::{ComponentKind, LookupKind, ValidationErrors, NON_FIELD_ERRORS};
use serde::{Deserialize, Serialize};

use crate::traits::{ComponentHeader, ComponentSpec, DetailSpec, Reference};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    #[serde(flatten)]
    pub header: ComponentHeader,
    #[serde(default)]
    pub processor: Option<String>,
    pub voltage_min: f64,
    #[serde(default)]
    pub voltage_max: Option<f64>,
    #[serde(default)]
    pub antenna_connectors: Vec<String>,
    /// Receiver-to-flight-controller protocols
    #[serde(default)]
    pub protocols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiverDetail {
    /// MHz
    pub frequency: f64,
    /// Grams, without antenna
    pub weight: f64,
    /// dBm
    pub telemetry_power: f64,
    #[serde(default)]
    pub rf_chip: Option<String>,
}

impl ComponentSpec for Receiver {
    const KIND: ComponentKind = ComponentKind::Receiver;
    const DETAIL_KINDS: &'static [&'static str] = &["band"];
    type Detail = ReceiverDetail;

    fn header(&self) -> &ComponentHeader {
        &self.header
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.header.validate_into(&mut errors);
        errors.check_optional_chars("processor", self.processor.as_deref(), 100);
        errors.check_range("voltage_min", self.voltage_min, 2.0, 28.0);
        errors.check_optional_range("voltage_max", self.voltage_max, 2.0, 28.0);
        if let Some(voltage_max) = self.voltage_max {
            errors.ensure(
                self.voltage_min <= voltage_max,
                NON_FIELD_ERRORS,
                "Max voltage must be higher or equal to min voltage.",
            );
        }
        errors.into_result()
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = Reference::lookups(
            "antenna_connectors",
            LookupKind::AntennaConnector,
            &self.antenna_connectors,
        );
        refs.extend(Reference::lookups(
            "protocols",
            LookupKind::ReceiverProtocol,
            &self.protocols,
        ));
        refs
    }
}

impl DetailSpec for ReceiverDetail {
    fn detail_kind(&self) -> &'static str {
        "band"
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check_min("frequency", self.frequency, 0.0);
        errors.check_min("weight", self.weight, 0.0);
        errors.check_min("telemetry_power", self.telemetry_power, 0.0);
        errors.check_optional_chars("rf_chip", self.rf_chip.as_deref(), 50);
        errors.into_result()
    }
}
