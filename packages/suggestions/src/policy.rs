// ABOUTME: Capability check deciding who may accept or deny suggestions
// ABOUTME: Independent of suggestion ownership; the default trusts the actor's moderator flag

use quadbase_core::Actor;

use crate::error::{ModerationError, ModerationResult};

/// Answers whether an actor may accept or deny suggestions.
pub trait ModerationPolicy: Send + Sync {
    fn can_moderate(&self, actor: &Actor) -> bool;

    fn require_moderator(&self, actor: &Actor) -> ModerationResult<()> {
        if self.can_moderate(actor) {
            Ok(())
        } else {
            Err(ModerationError::Unauthorized)
        }
    }
}

/// Grants the capability to actors carrying the moderator flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeratorFlagPolicy;

impl ModerationPolicy for ModeratorFlagPolicy {
    fn can_moderate(&self, actor: &Actor) -> bool {
        actor.is_moderator
    }
}
