// ABOUTME: The ten component families and the compile-time kind-to-type mapping
// ABOUTME: `with_component_family!` replaces a runtime registry of family types

pub mod antenna;
pub mod camera;
pub mod flight_controller;
pub mod frame;
pub mod motor;
pub mod propeller;
pub mod receiver;
pub mod speed_controller;
pub mod stack;
pub mod transmitter;

pub use antenna::{AngleType, Antenna, AntennaDetail};
pub use camera::{AspectRatio, Camera, CameraDetail, LightSensitivity, VideoOutput};
pub use flight_controller::{FlightController, UsbConnector};
pub use frame::{Frame, FrameConfiguration, FrameDetail, FrameMaterial};
pub use motor::{Motor, MotorDetail};
pub use propeller::{BladeCount, Propeller};
pub use receiver::{Receiver, ReceiverDetail};
pub use speed_controller::{EscType, SpeedController};
pub use stack::Stack;
pub use transmitter::Transmitter;

/// Run `$body` with `$family` aliased to the family type for `$kind`.
///
/// ```ignore
/// let count = with_component_family!(kind, F => storage.count::<F>().await)?;
/// ```
#[macro_export]
macro_rules! with_component_family {
    ($kind:expr, $family:ident => $body:expr) => {
        match $kind {
            $crate::ComponentKind::Antenna => {
                type $family = $crate::families::Antenna;
                $body
            }
            $crate::ComponentKind::Camera => {
                type $family = $crate::families::Camera;
                $body
            }
            $crate::ComponentKind::Frame => {
                type $family = $crate::families::Frame;
                $body
            }
            $crate::ComponentKind::Motor => {
                type $family = $crate::families::Motor;
                $body
            }
            $crate::ComponentKind::Receiver => {
                type $family = $crate::families::Receiver;
                $body
            }
            $crate::ComponentKind::Transmitter => {
                type $family = $crate::families::Transmitter;
                $body
            }
            $crate::ComponentKind::FlightController => {
                type $family = $crate::families::FlightController;
                $body
            }
            $crate::ComponentKind::SpeedController => {
                type $family = $crate::families::SpeedController;
                $body
            }
            $crate::ComponentKind::Stack => {
                type $family = $crate::families::Stack;
                $body
            }
            $crate::ComponentKind::Propeller => {
                type $family = $crate::families::Propeller;
                $body
            }
        }
    };
}
