// ABOUTME: Suggestion moderation workflow for Quadbase
// ABOUTME: Pending, approved, and denied proposals with transactional promotion into the catalog

pub mod detail_suggestions;
pub mod details;
pub mod engine;
pub mod error;
pub mod lookup_suggestions;
pub mod moderated;
pub mod policy;
pub mod status;
pub mod storage;
pub mod types;

pub use detail_suggestions::DetailSuggestionStorage;
pub use engine::ModerationEngine;
pub use error::{ModerationError, ModerationResult};
pub use lookup_suggestions::LookupSuggestionStorage;
pub use moderated::ModeratedTable;
pub use policy::{ModerationPolicy, ModeratorFlagPolicy};
pub use status::{ModerationStatus, APPROVED_DENY_MESSAGE, APPROVED_READ_ONLY_MESSAGE};
pub use storage::SuggestionStorage;
pub use types::{
    DetailSuggestion, DetailSuggestionInput, LookupSuggestion, LookupSuggestionInput,
    ModerationMeta, NestedDetail, Promotion, SuggestedDetail, Suggestion, SuggestionInput,
    SuggestionQuery,
};
