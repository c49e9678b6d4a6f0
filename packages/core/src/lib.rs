// ABOUTME: Core types, traits, and utilities for Quadbase
// ABOUTME: Foundational package shared by the catalog, suggestion, and API packages

pub mod constants;
pub mod types;
pub mod utils;
pub mod validation;

pub use types::{Actor, ComponentKind, LookupKind, UnknownKind};
pub use validation::{ValidationError, ValidationErrors, NON_FIELD_ERRORS};
