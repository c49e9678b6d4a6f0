// ABOUTME: Flight controller family
// ABOUTME: References its gyro and rated voltage lookups and a set of supported firmwares

use quadbase_core::{ComponentKind, LookupKind, ValidationErrors};
use serde::{Deserialize, Serialize};

use crate::traits::{ComponentHeader, ComponentSpec, NoDetail, Reference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsbConnector {
    Micro,
    C,
    Another,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightController {
    #[serde(flatten)]
    pub header: ComponentHeader,
    pub microcontroller: String,
    /// Gyro lookup id
    pub gyro: String,
    #[serde(default)]
    pub osd: Option<String>,
    #[serde(default)]
    pub bluetooth: bool,
    #[serde(default)]
    pub wifi: bool,
    #[serde(default)]
    pub barometer: bool,
    /// RatedVoltage lookup id
    pub voltage: String,
    pub connector_type: UsbConnector,
    pub mount_length: f64,
    pub mount_width: f64,
    pub weight: f64,
    pub length: f64,
    #[serde(default)]
    pub height: Option<f64>,
    pub width: f64,
    #[serde(default)]
    pub firmwares: Vec<String>,
}

impl ComponentSpec for FlightController {
    const KIND: ComponentKind = ComponentKind::FlightController;
    const DETAIL_KINDS: &'static [&'static str] = &[];
    type Detail = NoDetail;

    fn header(&self) -> &ComponentHeader {
        &self.header
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.header.validate_into(&mut errors);
        errors.require_text("microcontroller", &self.microcontroller, 50);
        errors.check_optional_chars("osd", self.osd.as_deref(), 50);
        errors.check_min("weight", self.weight, 0.0);
        errors.into_result()
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![
            Reference::lookup("gyro", LookupKind::Gyro, self.gyro.clone()),
            Reference::lookup("voltage", LookupKind::RatedVoltage, self.voltage.clone()),
        ];
        refs.extend(Reference::lookups(
            "firmwares",
            LookupKind::FcFirmware,
            &self.firmwares,
        ));
        refs
    }
}
