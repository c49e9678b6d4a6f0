// ABOUTME: Frame family with three kinds of mount details (camera, motor, vtx)
// ABOUTME: A frame keeps at least one mount of every kind

use quadbase_core::{ComponentKind, ValidationErrors};
use serde::{Deserialize, Serialize};

use crate::traits::{ComponentHeader, ComponentSpec, DetailSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameMaterial {
    Aluminum,
    Fibre,
    Another,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameConfiguration {
    H,
    X,
    Hybrid,
    Box,
    Another,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(flatten)]
    pub header: ComponentHeader,
    /// Propeller size in inches
    pub prop_size: String,
    /// Diagonal size in mm
    pub size: String,
    #[serde(default)]
    pub weight: Option<f64>,
    pub material: FrameMaterial,
    pub configuration: FrameConfiguration,
}

/// Mount hole pattern for one kind of part, in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mount", rename_all = "snake_case")]
pub enum FrameDetail {
    Camera { height: f64, width: f64 },
    Motor { height: f64, width: f64 },
    Vtx { height: f64, width: f64 },
}

impl FrameDetail {
    fn dimensions(&self) -> (f64, f64) {
        match self {
            FrameDetail::Camera { height, width }
            | FrameDetail::Motor { height, width }
            | FrameDetail::Vtx { height, width } => (*height, *width),
        }
    }
}

impl ComponentSpec for Frame {
    const KIND: ComponentKind = ComponentKind::Frame;
    const DETAIL_KINDS: &'static [&'static str] = &["camera_mount", "motor_mount", "vtx_mount"];
    type Detail = FrameDetail;

    fn header(&self) -> &ComponentHeader {
        &self.header
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.header.validate_into(&mut errors);
        errors.require_text("prop_size", &self.prop_size, 50);
        errors.require_text("size", &self.size, 50);
        errors.check_optional_min("weight", self.weight, 0.0);
        errors.into_result()
    }
}

impl DetailSpec for FrameDetail {
    fn detail_kind(&self) -> &'static str {
        match self {
            FrameDetail::Camera { .. } => "camera_mount",
            FrameDetail::Motor { .. } => "motor_mount",
            FrameDetail::Vtx { .. } => "vtx_mount",
        }
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let (height, width) = self.dimensions();
        let mut errors = ValidationErrors::new();
        errors.ensure(height > 0.0, "height", "Height must be greater than 0.");
        errors.ensure(width > 0.0, "width", "Width must be greater than 0.");
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_kind_follows_mount_tag() {
        let detail: FrameDetail =
            serde_json::from_str(r#"{"mount": "vtx", "height": 20, "width": 20}"#).unwrap();
        assert_eq!(detail.detail_kind(), "vtx_mount");
        assert!(detail.validate().is_ok());
    }

    #[test]
    fn test_unknown_mount_rejected() {
        let result: Result<FrameDetail, _> =
            serde_json::from_str(r#"{"mount": "gps", "height": 20, "width": 20}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_frame_validation() {
        let frame = Frame {
            header: ComponentHeader::new("ImpulseRC", "Apex"),
            prop_size: "".to_string(),
            size: "224".to_string(),
            weight: Some(-3.0),
            material: FrameMaterial::Fibre,
            configuration: FrameConfiguration::X,
        };
        let errors = frame.validate().unwrap_err();
        assert!(errors.has_field("prop_size"));
        assert!(errors.has_field("weight"));
        assert!(!errors.has_field("size"));
    }
}
