// ABOUTME: Electronic speed controller (ESC) family
// ABOUTME: Supported firmwares and protocols are many-to-many lookup sets

use quadbase_core::{ComponentKind, LookupKind, ValidationErrors};
use serde::{Deserialize, Serialize};

use crate::traits::{ComponentHeader, ComponentSpec, NoDetail, Reference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscType {
    /// 4-in-1 board
    All,
    Single,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedController {
    #[serde(flatten)]
    pub header: ComponentHeader,
    /// RatedVoltage lookup id
    pub voltage: String,
    #[serde(default)]
    pub is_wireless_conf: bool,
    pub esc_type: EscType,
    /// Continuous current, A
    pub cont_current: f64,
    /// Burst current, A
    pub burst_current: f64,
    pub mount_length: f64,
    pub mount_width: f64,
    pub weight: f64,
    pub length: f64,
    #[serde(default)]
    pub height: Option<f64>,
    pub width: f64,
    #[serde(default)]
    pub firmwares: Vec<String>,
    #[serde(default)]
    pub protocols: Vec<String>,
}

impl ComponentSpec for SpeedController {
    const KIND: ComponentKind = ComponentKind::SpeedController;
    const DETAIL_KINDS: &'static [&'static str] = &[];
    type Detail = NoDetail;

    fn header(&self) -> &ComponentHeader {
        &self.header
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.header.validate_into(&mut errors);
        errors.check_min("cont_current", self.cont_current, 0.0);
        errors.check_min("burst_current", self.burst_current, 0.0);
        errors.check_min("weight", self.weight, 0.0);
        errors.into_result()
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![Reference::lookup(
            "voltage",
            LookupKind::RatedVoltage,
            self.voltage.clone(),
        )];
        refs.extend(Reference::lookups(
            "firmwares",
            LookupKind::EscFirmware,
            &self.firmwares,
        ));
        refs.extend(Reference::lookups(
            "protocols",
            LookupKind::EscProtocol,
            &self.protocols,
        ));
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_currents() {
        let esc = SpeedController {
            header: ComponentHeader::new("Holybro", "Tekko32 F4"),
            voltage: "lkp-3-6s".to_string(),
            is_wireless_conf: false,
            esc_type: EscType::All,
            cont_current: -1.0,
            burst_current: 60.0,
            mount_length: 30.5,
            mount_width: 30.5,
            weight: 14.0,
            length: 42.0,
            height: None,
            width: 40.0,
            firmwares: vec![],
            protocols: vec!["lkp-dshot600".to_string()],
        };
        let errors = esc.validate().unwrap_err();
        assert!(errors.has_field("cont_current"));
        assert_eq!(esc.references().len(), 2);
    }
}
