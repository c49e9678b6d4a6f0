// ABOUTME: Stack family pairing a flight controller with a speed controller
// ABOUTME: Both halves are references to existing catalog components

use quadbase_core::{ComponentKind, ValidationErrors, NON_FIELD_ERRORS};
use serde::{Deserialize, Serialize};

use crate::traits::{ComponentHeader, ComponentSpec, NoDetail, Reference};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stack {
    #[serde(flatten)]
    pub header: ComponentHeader,
    pub flight_controller: String,
    pub speed_controller: String,
}

impl ComponentSpec for Stack {
    const KIND: ComponentKind = ComponentKind::Stack;
    const DETAIL_KINDS: &'static [&'static str] = &[];
    type Detail = NoDetail;

    fn header(&self) -> &ComponentHeader {
        &self.header
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.header.validate_into(&mut errors);
        errors.ensure(
            self.flight_controller != self.speed_controller,
            NON_FIELD_ERRORS,
            "Flight controller and speed controller must be different components.",
        );
        errors.into_result()
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference::component(
                "flight_controller",
                ComponentKind::FlightController,
                self.flight_controller.clone(),
            ),
            Reference::component(
                "speed_controller",
                ComponentKind::SpeedController,
                self.speed_controller.clone(),
            ),
        ]
    }
}
