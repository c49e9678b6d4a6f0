// ABOUTME: Closed enumerations of catalog component families and lookup tables
// ABOUTME: Also defines the acting user passed to every moderated operation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {category}: {value}")]
pub struct UnknownKind {
    pub category: &'static str,
    pub value: String,
}

/// Every component family the catalog knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Antenna,
    Camera,
    Frame,
    Motor,
    Receiver,
    Transmitter,
    FlightController,
    SpeedController,
    Stack,
    Propeller,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 10] = [
        ComponentKind::Antenna,
        ComponentKind::Camera,
        ComponentKind::Frame,
        ComponentKind::Motor,
        ComponentKind::Receiver,
        ComponentKind::Transmitter,
        ComponentKind::FlightController,
        ComponentKind::SpeedController,
        ComponentKind::Stack,
        ComponentKind::Propeller,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Antenna => "antenna",
            ComponentKind::Camera => "camera",
            ComponentKind::Frame => "frame",
            ComponentKind::Motor => "motor",
            ComponentKind::Receiver => "receiver",
            ComponentKind::Transmitter => "transmitter",
            ComponentKind::FlightController => "flight_controller",
            ComponentKind::SpeedController => "speed_controller",
            ComponentKind::Stack => "stack",
            ComponentKind::Propeller => "propeller",
        }
    }

    /// Human readable name used in validation messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ComponentKind::Antenna => "Antenna",
            ComponentKind::Camera => "Camera",
            ComponentKind::Frame => "Frame",
            ComponentKind::Motor => "Motor",
            ComponentKind::Receiver => "Receiver",
            ComponentKind::Transmitter => "Transmitter",
            ComponentKind::FlightController => "Flight Controller",
            ComponentKind::SpeedController => "Speed Controller",
            ComponentKind::Stack => "Stack",
            ComponentKind::Propeller => "Propeller",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind {
                category: "component kind",
                value: s.to_string(),
            })
    }
}

/// Small reference tables shared across component families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    AntennaType,
    AntennaConnector,
    VideoFormat,
    OutputPower,
    RatedVoltage,
    ReceiverProtocol,
    Gyro,
    FcFirmware,
    EscFirmware,
    EscProtocol,
}

impl LookupKind {
    pub const ALL: [LookupKind; 10] = [
        LookupKind::AntennaType,
        LookupKind::AntennaConnector,
        LookupKind::VideoFormat,
        LookupKind::OutputPower,
        LookupKind::RatedVoltage,
        LookupKind::ReceiverProtocol,
        LookupKind::Gyro,
        LookupKind::FcFirmware,
        LookupKind::EscFirmware,
        LookupKind::EscProtocol,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupKind::AntennaType => "antenna_type",
            LookupKind::AntennaConnector => "antenna_connector",
            LookupKind::VideoFormat => "video_format",
            LookupKind::OutputPower => "output_power",
            LookupKind::RatedVoltage => "rated_voltage",
            LookupKind::ReceiverProtocol => "receiver_protocol",
            LookupKind::Gyro => "gyro",
            LookupKind::FcFirmware => "fc_firmware",
            LookupKind::EscFirmware => "esc_firmware",
            LookupKind::EscProtocol => "esc_protocol",
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LookupKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LookupKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownKind {
                category: "lookup kind",
                value: s.to_string(),
            })
    }
}

/// The user on whose behalf an operation runs.
///
/// `is_moderator` is the single capability bit granted by the surrounding
/// authorization layer; it gates accept/deny and widens listing scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(default)]
    pub is_moderator: bool,
}

impl Actor {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_moderator: false,
        }
    }

    pub fn moderator(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_moderator: true,
        }
    }

    /// Whether this actor may see and act on records owned by `owner_id`.
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_moderator || self.id == owner_id
    }
}
