// ABOUTME: Moderation status shared by every suggestion kind
// ABOUTME: Approved is read-only; editing a denied suggestion reopens it as pending

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ModerationError, ModerationResult};

pub const APPROVED_READ_ONLY_MESSAGE: &str = "Cannot modify approved suggestion";
pub const APPROVED_DENY_MESSAGE: &str = "Cannot deny approved suggestion";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    #[default]
    Pending,
    Approved,
    Denied,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Denied => "denied",
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, ModerationStatus::Approved)
    }

    /// Status a suggestion takes after its submitter edits it.
    pub fn after_edit(self) -> ModerationResult<ModerationStatus> {
        match self {
            ModerationStatus::Approved => Err(ModerationError::StateConflict(
                APPROVED_READ_ONLY_MESSAGE.to_string(),
            )),
            ModerationStatus::Pending | ModerationStatus::Denied => Ok(ModerationStatus::Pending),
        }
    }

    /// Denial is allowed from pending and from denied (to update the comment).
    pub fn ensure_deniable(self) -> ModerationResult<()> {
        match self {
            ModerationStatus::Approved => Err(ModerationError::StateConflict(
                APPROVED_DENY_MESSAGE.to_string(),
            )),
            ModerationStatus::Pending | ModerationStatus::Denied => Ok(()),
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ModerationStatus::Pending),
            "approved" => Ok(ModerationStatus::Approved),
            "denied" => Ok(ModerationStatus::Denied),
            _ => Err(format!("Invalid moderation status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_transitions() {
        assert_eq!(
            ModerationStatus::Pending.after_edit().unwrap(),
            ModerationStatus::Pending
        );
        assert_eq!(
            ModerationStatus::Denied.after_edit().unwrap(),
            ModerationStatus::Pending
        );
        match ModerationStatus::Approved.after_edit() {
            Err(ModerationError::StateConflict(message)) => {
                assert_eq!(message, APPROVED_READ_ONLY_MESSAGE)
            }
            other => panic!("expected state conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_deny_guard() {
        assert!(ModerationStatus::Pending.ensure_deniable().is_ok());
        assert!(ModerationStatus::Denied.ensure_deniable().is_ok());
        assert!(ModerationStatus::Approved.ensure_deniable().is_err());
    }

    #[test]
    fn test_round_trip_through_text() {
        for status in [
            ModerationStatus::Pending,
            ModerationStatus::Approved,
            ModerationStatus::Denied,
        ] {
            assert_eq!(status.as_str().parse::<ModerationStatus>().unwrap(), status);
        }
        assert!("reviewed".parse::<ModerationStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&ModerationStatus::Denied).unwrap(),
            "\"denied\""
        );
    }
}
