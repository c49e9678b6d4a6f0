// ABOUTME: FPV camera family with resolution, voltage range, and mount size variants
// ABOUTME: Supported video formats are a many-to-many lookup set

use quadbase_core::{ComponentKind, LookupKind, ValidationErrors, NON_FIELD_ERRORS};
use serde::{Deserialize, Serialize};

use crate::traits::{ComponentHeader, ComponentSpec, DetailSpec, Reference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "4:3")]
    Normal,
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "another")]
    Another,
    #[default]
    #[serde(rename = "switch")]
    Switchable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoOutput {
    #[default]
    #[serde(rename = "A")]
    Analog,
    #[serde(rename = "D")]
    Digital,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightSensitivity {
    #[default]
    Unknown,
    Low,
    Normal,
    High,
}

fn default_tvl() -> u32 {
    1200
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    #[serde(flatten)]
    pub header: ComponentHeader,
    #[serde(default = "default_tvl")]
    pub tvl: u32,
    pub voltage_min: f64,
    pub voltage_max: f64,
    #[serde(default)]
    pub ratio: AspectRatio,
    /// Horizontal field of view in degrees
    pub fov: u32,
    #[serde(default)]
    pub output_type: VideoOutput,
    #[serde(default)]
    pub light_sens: LightSensitivity,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub video_formats: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraDetail {
    pub height: f64,
    pub width: f64,
}

impl ComponentSpec for Camera {
    const KIND: ComponentKind = ComponentKind::Camera;
    const DETAIL_KINDS: &'static [&'static str] = &["size"];
    type Detail = CameraDetail;

    fn header(&self) -> &ComponentHeader {
        &self.header
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.header.validate_into(&mut errors);
        errors.check_range("tvl", f64::from(self.tvl), 500.0, 3000.0);
        errors.check_range("voltage_min", self.voltage_min, 2.0, 28.0);
        errors.check_range("voltage_max", self.voltage_max, 2.0, 28.0);

        let digits = self.fov.to_string().len();
        errors.ensure(
            (2..=3).contains(&digits),
            "fov",
            format!("{} length must be between 2 and 3", self.fov),
        );
        errors.ensure(
            self.voltage_max >= self.voltage_min,
            NON_FIELD_ERRORS,
            "Max voltage must be higher or equal to min voltage",
        );
        errors.into_result()
    }

    fn references(&self) -> Vec<Reference> {
        Reference::lookups("video_formats", LookupKind::VideoFormat, &self.video_formats)
    }
}

impl DetailSpec for CameraDetail {
    fn detail_kind(&self) -> &'static str {
        "size"
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.ensure(self.height > 0.0, "height", "Height must be greater than 0.");
        errors.ensure(self.width > 0.0, "width", "Width must be greater than 0.");
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera {
            header: ComponentHeader::new("RunCam", "Phoenix 2"),
            tvl: 1000,
            voltage_min: 5.0,
            voltage_max: 24.0,
            ratio: AspectRatio::Switchable,
            fov: 155,
            output_type: VideoOutput::Analog,
            light_sens: LightSensitivity::Normal,
            weight: Some(8.0),
            video_formats: vec!["lkp-ntsc".to_string(), "lkp-pal".to_string()],
        }
    }

    #[test]
    fn test_valid_camera_and_refs() {
        let camera = camera();
        assert!(camera.validate().is_ok());
        assert_eq!(camera.references().len(), 2);
    }

    #[test]
    fn test_fov_digits() {
        let mut bad = camera();
        bad.fov = 1200;
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.messages_for("fov"), vec!["1200 length must be between 2 and 3"]);
    }

    #[test]
    fn test_voltage_order() {
        let mut bad = camera();
        bad.voltage_min = 20.0;
        bad.voltage_max = 5.0;
        assert!(bad.validate().unwrap_err().has_field(NON_FIELD_ERRORS));
    }

    #[test]
    fn test_ratio_wire_names() {
        let parsed: AspectRatio = serde_json::from_str("\"16:9\"").unwrap();
        assert_eq!(parsed, AspectRatio::Wide);
    }

    #[test]
    fn test_detail_dimensions_positive() {
        let detail = CameraDetail {
            height: 19.0,
            width: 0.0,
        };
        assert!(detail.validate().unwrap_err().has_field("width"));
    }
}
