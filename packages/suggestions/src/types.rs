// ABOUTME: Suggestion records, their nested details, and submission payloads
// ABOUTME: One generic shape per suggestion kind, parameterized by component family

use chrono::{DateTime, Utc};
use quadbase_attachments::{Attachment, AttachmentInput};
use quadbase_catalog::{ComponentSpec, DetailSpec, LookupData};
use quadbase_core::{ComponentKind, LookupKind};
use serde::{Deserialize, Serialize};

use crate::status::ModerationStatus;

/// Moderation fields common to every suggestion kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModerationMeta {
    pub id: String,
    /// Submitter
    pub user_id: String,
    pub status: ModerationStatus,
    pub admin_comment: Option<String>,
    pub request_description: Option<String>,
    /// The canonical record this suggestion edits, or became once accepted.
    pub related_instance_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// A proposed create or edit of a whole component of family `T`.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = ""))]
pub struct Suggestion<T: ComponentSpec> {
    #[serde(flatten)]
    pub meta: ModerationMeta,
    pub kind: ComponentKind,
    #[serde(flatten)]
    pub data: T,
    pub details: Vec<SuggestedDetail<T::Detail>>,
    pub images: Vec<Attachment>,
    pub documents: Vec<Attachment>,
}

impl<T: ComponentSpec> Suggestion<T> {
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    pub fn status(&self) -> ModerationStatus {
        self.meta.status
    }

    /// True when the suggestion proposes a brand new component.
    pub fn proposes_new(&self) -> bool {
        self.meta.related_instance_id.is_none()
    }
}

/// A detail nested under a suggestion.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = ""))]
pub struct SuggestedDetail<D: DetailSpec> {
    pub id: String,
    pub suggestion_id: String,
    pub detail_kind: String,
    #[serde(flatten)]
    pub data: D,
    /// Canonical detail this one was promoted to.
    pub related_instance_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Nested detail item in a submission. An `id` must name a detail of the same suggestion.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = ""))]
pub struct NestedDetail<D: DetailSpec> {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub data: D,
}

impl<D: DetailSpec> NestedDetail<D> {
    pub fn new(data: D) -> Self {
        Self { id: None, data }
    }

    pub fn existing(id: impl Into<String>, data: D) -> Self {
        Self {
            id: Some(id.into()),
            data,
        }
    }
}

/// Create or update payload for a whole-component suggestion.
///
/// On update, `details`, `images` and `documents` replace the current sets when
/// present and leave them alone when absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = ""))]
pub struct SuggestionInput<T: ComponentSpec> {
    #[serde(flatten)]
    pub data: T,
    #[serde(default)]
    pub related_instance_id: Option<String>,
    #[serde(default)]
    pub request_description: Option<String>,
    #[serde(default)]
    pub details: Option<Vec<NestedDetail<T::Detail>>>,
    #[serde(default)]
    pub images: Option<Vec<AttachmentInput>>,
    #[serde(default)]
    pub documents: Option<Vec<AttachmentInput>>,
}

impl<T: ComponentSpec> SuggestionInput<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            related_instance_id: None,
            request_description: None,
            details: None,
            images: None,
            documents: None,
        }
    }

    pub fn editing(mut self, component_id: impl Into<String>) -> Self {
        self.related_instance_id = Some(component_id.into());
        self
    }

    pub fn with_details(mut self, details: Vec<T::Detail>) -> Self {
        self.details = Some(details.into_iter().map(NestedDetail::new).collect());
        self
    }

    pub fn with_images(mut self, images: Vec<AttachmentInput>) -> Self {
        self.images = Some(images);
        self
    }

    pub fn with_documents(mut self, documents: Vec<AttachmentInput>) -> Self {
        self.documents = Some(documents);
        self
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.request_description = Some(text.into());
        self
    }
}

/// A proposed new detail for a component already in the catalog.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = ""))]
pub struct DetailSuggestion<D: DetailSpec> {
    #[serde(flatten)]
    pub meta: ModerationMeta,
    pub kind: ComponentKind,
    pub component_id: String,
    pub detail_kind: String,
    #[serde(flatten)]
    pub data: D,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = ""))]
pub struct DetailSuggestionInput<D: DetailSpec> {
    pub component_id: String,
    #[serde(default)]
    pub request_description: Option<String>,
    #[serde(flatten)]
    pub data: D,
}

/// A proposed new or edited lookup table entry.
#[derive(Debug, Clone, Serialize)]
pub struct LookupSuggestion {
    #[serde(flatten)]
    pub meta: ModerationMeta,
    pub lookup_kind: LookupKind,
    pub label: String,
    pub data: LookupData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LookupSuggestionInput {
    #[serde(default)]
    pub related_instance_id: Option<String>,
    #[serde(default)]
    pub request_description: Option<String>,
    pub data: LookupData,
}

/// Filter for suggestion listings.
#[derive(Debug, Clone, Default)]
pub struct SuggestionQuery {
    pub status: Option<ModerationStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Outcome of accepting a whole-component suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct Promotion {
    pub suggestion_id: String,
    pub component_id: String,
    /// False when an existing component was updated.
    pub created: bool,
    pub details_created: usize,
    pub details_updated: usize,
    pub attachments_moved: u64,
}
