// ABOUTME: Lookup table payloads (antenna types, connectors, firmwares, voltages, ...)
// ABOUTME: Each payload knows its kind, its unique display name, and its own validation

use quadbase_core::{LookupKind, ValidationErrors, NON_FIELD_ERRORS};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directionality {
    #[default]
    Directional,
    Omni,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarization {
    #[default]
    Linear,
    LeftCircular,
    RightCircular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatteryType {
    #[default]
    Lipo,
    LiIon,
    Lihv,
    Another,
}

impl BatteryType {
    pub fn label(&self) -> &'static str {
        match self {
            BatteryType::Lipo => "LiPo",
            BatteryType::LiIon => "Li-Ion",
            BatteryType::Lihv => "LiHV",
            BatteryType::Another => "Another",
        }
    }
}

/// The payload of one lookup row, tagged by its table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupData {
    AntennaType {
        name: String,
        #[serde(default)]
        direction: Directionality,
        #[serde(default)]
        polarization: Polarization,
    },
    AntennaConnector {
        name: String,
    },
    VideoFormat {
        name: String,
    },
    OutputPower {
        /// mW
        output_power: u32,
    },
    RatedVoltage {
        min_cells: u32,
        max_cells: u32,
        #[serde(default)]
        battery: BatteryType,
    },
    ReceiverProtocol {
        name: String,
    },
    Gyro {
        manufacturer: String,
        imu: String,
        /// kHz
        max_freq: f64,
        #[serde(default)]
        spi_support: bool,
    },
    FcFirmware {
        name: String,
    },
    EscFirmware {
        name: String,
    },
    EscProtocol {
        name: String,
    },
}

impl LookupData {
    pub fn kind(&self) -> LookupKind {
        match self {
            LookupData::AntennaType { .. } => LookupKind::AntennaType,
            LookupData::AntennaConnector { .. } => LookupKind::AntennaConnector,
            LookupData::VideoFormat { .. } => LookupKind::VideoFormat,
            LookupData::OutputPower { .. } => LookupKind::OutputPower,
            LookupData::RatedVoltage { .. } => LookupKind::RatedVoltage,
            LookupData::ReceiverProtocol { .. } => LookupKind::ReceiverProtocol,
            LookupData::Gyro { .. } => LookupKind::Gyro,
            LookupData::FcFirmware { .. } => LookupKind::FcFirmware,
            LookupData::EscFirmware { .. } => LookupKind::EscFirmware,
            LookupData::EscProtocol { .. } => LookupKind::EscProtocol,
        }
    }

    /// Display name, unique within the lookup's kind.
    pub fn name(&self) -> String {
        match self {
            LookupData::AntennaType { name, .. }
            | LookupData::AntennaConnector { name }
            | LookupData::VideoFormat { name }
            | LookupData::ReceiverProtocol { name }
            | LookupData::FcFirmware { name }
            | LookupData::EscFirmware { name }
            | LookupData::EscProtocol { name } => name.trim().to_string(),
            LookupData::OutputPower { output_power } => format!("{}mW", output_power),
            LookupData::RatedVoltage {
                min_cells,
                max_cells,
                battery,
            } => format!("{}S-{}S {}", min_cells, max_cells, battery.label()),
            LookupData::Gyro {
                manufacturer, imu, ..
            } => format!("{} {}", manufacturer.trim(), imu.trim()),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match self {
            LookupData::AntennaType { name, .. }
            | LookupData::AntennaConnector { name }
            | LookupData::VideoFormat { name }
            | LookupData::ReceiverProtocol { name }
            | LookupData::FcFirmware { name }
            | LookupData::EscFirmware { name }
            | LookupData::EscProtocol { name } => errors.require_text("name", name, 50),
            LookupData::OutputPower { output_power } => {
                errors.check_min("output_power", f64::from(*output_power), 1.0)
            }
            LookupData::RatedVoltage {
                min_cells,
                max_cells,
                ..
            } => {
                errors.check_min("min_cells", f64::from(*min_cells), 1.0);
                errors.check_min("max_cells", f64::from(*max_cells), 1.0);
                errors.ensure(
                    min_cells <= max_cells,
                    NON_FIELD_ERRORS,
                    "Max. number of cells must be higher or equal to min. number of cells",
                );
            }
            LookupData::Gyro {
                manufacturer,
                imu,
                max_freq,
                ..
            } => {
                errors.require_text("manufacturer", manufacturer, 50);
                errors.require_text("imu", imu, 50);
                errors.check_min("max_freq", *max_freq, 0.0);
            }
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rated_voltage_name_and_order() {
        let voltage = LookupData::RatedVoltage {
            min_cells: 3,
            max_cells: 6,
            battery: BatteryType::Lipo,
        };
        assert_eq!(voltage.name(), "3S-6S LiPo");
        assert!(voltage.validate().is_ok());

        let reversed = LookupData::RatedVoltage {
            min_cells: 6,
            max_cells: 3,
            battery: BatteryType::Lipo,
        };
        assert!(reversed.validate().unwrap_err().has_field(NON_FIELD_ERRORS));
    }

    #[test]
    fn test_tagged_payload() {
        let data: LookupData =
            serde_json::from_str(r#"{"kind": "antenna_connector", "name": "SMA"}"#).unwrap();
        assert_eq!(data.kind(), LookupKind::AntennaConnector);
        assert_eq!(data.name(), "SMA");
    }

    #[test]
    fn test_blank_name_rejected() {
        let data = LookupData::VideoFormat {
            name: "  ".to_string(),
        };
        assert!(data.validate().unwrap_err().has_field("name"));
    }
}
