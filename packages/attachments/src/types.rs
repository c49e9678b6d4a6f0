// ABOUTME: Attachment records, their exclusive owner, and upload payloads
// ABOUTME: An attachment belongs to exactly one canonical component or one suggestion

use chrono::{DateTime, Utc};
use quadbase_core::ComponentKind;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::blob::BlobPin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    Document,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Document => "document",
        }
    }

    /// Directory prefix used for blob keys.
    pub fn dir(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "images",
            AttachmentKind::Document => "documents",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttachmentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(AttachmentKind::Image),
            "document" => Ok(AttachmentKind::Document),
            _ => Err(format!("Invalid attachment kind: {}", s)),
        }
    }
}

/// Who currently owns an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttachmentOwner {
    Canonical { kind: ComponentKind, id: String },
    Suggestion { id: String },
}

impl AttachmentOwner {
    pub fn canonical(kind: ComponentKind, id: impl Into<String>) -> Self {
        AttachmentOwner::Canonical {
            kind,
            id: id.into(),
        }
    }

    pub fn suggestion(id: impl Into<String>) -> Self {
        AttachmentOwner::Suggestion { id: id.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: String,
    pub kind: AttachmentKind,
    pub component_kind: ComponentKind,
    pub owner: AttachmentOwner,
    /// The suggestion this attachment was promoted from, if any.
    pub origin_suggestion_id: Option<String>,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

impl Attachment {
    /// Attachments owned by a canonical component are approved.
    pub fn accepted(&self) -> bool {
        matches!(self.owner, AttachmentOwner::Canonical { .. })
    }

    pub fn component_id(&self) -> Option<&str> {
        match &self.owner {
            AttachmentOwner::Canonical { id, .. } => Some(id),
            AttachmentOwner::Suggestion { .. } => None,
        }
    }

    pub fn suggestion_id(&self) -> Option<&str> {
        match &self.owner {
            AttachmentOwner::Suggestion { id } => Some(id),
            AttachmentOwner::Canonical { .. } => None,
        }
    }
}

impl Serialize for Attachment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Attachment", 11)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("owner", &self.owner)?;
        state.serialize_field("accepted", &self.accepted())?;
        state.serialize_field("origin_suggestion_id", &self.origin_suggestion_id)?;
        state.serialize_field("file_name", &self.file_name)?;
        state.serialize_field("content_type", &self.content_type)?;
        state.serialize_field("size_bytes", &self.size_bytes)?;
        state.serialize_field("storage_key", &self.storage_key)?;
        state.serialize_field("position", &self.position)?;
        state.serialize_field("created_at", &self.created_at)?;
        state.end()
    }
}

/// A nested attachment item in a create or update payload.
///
/// Items with an `id` refer to an attachment the owner already has; items
/// without one are new uploads and must carry base64 `data`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachmentInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Base64 body, optionally as a `data:<mime>;base64,` URL.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
}

impl AttachmentInput {
    pub fn upload(file_name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            data: Some(data.into()),
            ..Self::default()
        }
    }

    pub fn existing(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }
}

/// An upload that has been decoded and written to the blob store.
///
/// Keep it alive until the row inserted from it commits; dropping it unpins the blob.
#[derive(Debug)]
pub struct StoredUpload {
    pub kind: AttachmentKind,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
    pub position: i64,
    pub(crate) _pin: BlobPin,
}
