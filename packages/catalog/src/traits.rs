// ABOUTME: Capability traits implemented by every component family and its details
// ABOUTME: Lets storage and the promotion engine treat all ten families through one generic path

use quadbase_core::{ComponentKind, LookupKind, ValidationErrors};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Debug;

/// What a stored reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefTarget {
    Lookup(LookupKind),
    Component(ComponentKind),
}

/// One outgoing foreign reference held by a component or detail.
///
/// Many-to-many sets produce one `Reference` per member, all sharing `field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub target: RefTarget,
    pub id: String,
}

impl Reference {
    pub fn lookup(field: &'static str, kind: LookupKind, id: impl Into<String>) -> Self {
        Self {
            field,
            target: RefTarget::Lookup(kind),
            id: id.into(),
        }
    }

    pub fn component(field: &'static str, kind: ComponentKind, id: impl Into<String>) -> Self {
        Self {
            field,
            target: RefTarget::Component(kind),
            id: id.into(),
        }
    }

    pub fn lookups(field: &'static str, kind: LookupKind, ids: &[String]) -> Vec<Self> {
        ids.iter()
            .map(|id| Self::lookup(field, kind, id.clone()))
            .collect()
    }
}

/// Identifying fields shared by every component family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentHeader {
    pub manufacturer: String,
    pub model: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ComponentHeader {
    pub fn new(manufacturer: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            model: model.into(),
            description: None,
        }
    }

    pub fn validate_into(&self, errors: &mut ValidationErrors) {
        errors.require_text("manufacturer", &self.manufacturer, 50);
        errors.require_text("model", &self.model, 50);
        errors.check_optional_chars("description", self.description.as_deref(), 5000);
    }
}

/// A repeatable sub-record of a component.
pub trait DetailSpec:
    Serialize + DeserializeOwned + Clone + Debug + PartialEq + Send + Sync + 'static
{
    /// Tag grouping details of the same kind; the last one of a kind is protected.
    fn detail_kind(&self) -> &'static str;

    fn validate(&self) -> Result<(), ValidationErrors>;

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}

/// A component family stored in the catalog.
pub trait ComponentSpec:
    Serialize + DeserializeOwned + Clone + Debug + PartialEq + Send + Sync + 'static
{
    const KIND: ComponentKind;

    /// Detail kinds of which every item of this family keeps at least one.
    const DETAIL_KINDS: &'static [&'static str];

    type Detail: DetailSpec;

    fn header(&self) -> &ComponentHeader;

    fn validate(&self) -> Result<(), ValidationErrors>;

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    fn manufacturer(&self) -> &str {
        &self.header().manufacturer
    }

    fn model(&self) -> &str {
        &self.header().model
    }

    fn has_details() -> bool {
        !Self::DETAIL_KINDS.is_empty()
    }
}

/// Detail type of families that have no details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDetail {}

impl Serialize for NoDetail {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        match *self {}
    }
}

impl<'de> Deserialize<'de> for NoDetail {
    fn deserialize<D: Deserializer<'de>>(_deserializer: D) -> Result<Self, D::Error> {
        Err(D::Error::custom("this component family has no details"))
    }
}

impl DetailSpec for NoDetail {
    fn detail_kind(&self) -> &'static str {
        match *self {}
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        match *self {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_validation() {
        let mut errors = ValidationErrors::new();
        ComponentHeader::new("", "x".repeat(60)).validate_into(&mut errors);
        assert!(errors.has_field("manufacturer"));
        assert!(errors.has_field("model"));
    }

    #[test]
    fn test_no_detail_rejects_any_payload() {
        let result: Result<Vec<NoDetail>, _> = serde_json::from_str(r#"[{"weight": 1}]"#);
        assert!(result.is_err());

        let empty: Vec<NoDetail> = serde_json::from_str("[]").unwrap();
        assert!(empty.is_empty());
    }
}
