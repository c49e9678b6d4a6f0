// ABOUTME: Propeller family described by size, pitch, and blade count
// ABOUTME: No details and no lookup references

use quadbase_core::{ComponentKind, ValidationErrors};
use serde::{Deserialize, Serialize};

use crate::traits::{ComponentHeader, ComponentSpec, NoDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BladeCount {
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "another")]
    Another,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Propeller {
    #[serde(flatten)]
    pub header: ComponentHeader,
    /// Inches
    pub size: u32,
    /// Inches
    pub pitch: f64,
    pub blade_count: BladeCount,
    #[serde(default)]
    pub weight: Option<f64>,
}

impl ComponentSpec for Propeller {
    const KIND: ComponentKind = ComponentKind::Propeller;
    const DETAIL_KINDS: &'static [&'static str] = &[];
    type Detail = NoDetail;

    fn header(&self) -> &ComponentHeader {
        &self.header
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.header.validate_into(&mut errors);
        errors.check_min("size", f64::from(self.size), 2.0);
        errors.check_min("pitch", self.pitch, 0.0);
        errors.check_optional_min("weight", self.weight, 0.0);
        errors.into_result()
    }
}
