//! Failure taxonomy shared by every resolver.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a rules operation was rejected. A rejected operation never mutates
/// the character it was applied to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("No level {level} spell slots remaining")]
    InsufficientSlots { level: u8 },

    #[error("{0}")]
    InvalidTarget(String),

    #[error("Unknown action type: {0}")]
    UnknownAction(String),
}

/// The three coarse failure categories reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    PreconditionFailed,
    InvalidTarget,
}

impl RulesError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        RulesError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        RulesError::PreconditionFailed(message.into())
    }

    pub fn invalid_target(message: impl Into<String>) -> Self {
        RulesError::InvalidTarget(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RulesError::NotFound { .. } | RulesError::UnknownAction(_) => ErrorKind::NotFound,
            RulesError::PreconditionFailed(_) | RulesError::InsufficientSlots { .. } => {
                ErrorKind::PreconditionFailed
            }
            RulesError::InvalidTarget(_) => ErrorKind::InvalidTarget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            RulesError::InsufficientSlots { level: 3 }.kind(),
            ErrorKind::PreconditionFailed
        );
        assert_eq!(
            RulesError::UnknownAction("dance".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            RulesError::not_found("Spell", "wish").to_string(),
            "Spell not found: wish"
        );
    }
}
