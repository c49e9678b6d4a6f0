// ABOUTME: Shell-side moderation of whole-component suggestions
// ABOUTME: Runs accept and deny as the built-in moderator against the configured database

use quadbase_catalog::{with_component_family, ComponentKind};
use quadbase_core::Actor;
use quadbase_suggestions::{ModerationEngine, ModerationMeta, ModerationResult, Promotion};
use sqlx::SqlitePool;

/// Identity recorded for actions taken from the command line.
pub const CLI_MODERATOR_ID: &str = "quadbase-cli";

pub fn cli_moderator() -> Actor {
    Actor::moderator(CLI_MODERATOR_ID)
}

pub async fn accept(
    pool: &SqlitePool,
    kind: ComponentKind,
    id: &str,
) -> ModerationResult<Promotion> {
    let engine = ModerationEngine::with_flag_policy(pool.clone());
    let actor = cli_moderator();
    with_component_family!(kind, F => engine.accept::<F>(&actor, id).await)
}

pub async fn deny(
    pool: &SqlitePool,
    kind: ComponentKind,
    id: &str,
    comment: Option<&str>,
) -> ModerationResult<ModerationMeta> {
    let engine = ModerationEngine::with_flag_policy(pool.clone());
    let actor = cli_moderator();
    with_component_family!(kind, F => engine.deny::<F>(&actor, id, comment).await)
}
