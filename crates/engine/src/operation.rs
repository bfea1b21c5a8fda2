//! File operations and their outcomes

use remotesync_core::EventType;
use std::fmt;
use std::time::Instant;

/// A requested sync action on one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Path relative to the sync root, `/`-separated
    pub key: String,
    /// What happened to the file
    pub event: EventType,
    /// When the operation was accepted
    pub submitted_at: Instant,
}

impl Operation {
    /// Operation submitted now
    pub fn new(key: impl Into<String>, event: EventType) -> Self {
        Self {
            key: key.into(),
            event,
            submitted_at: Instant::now(),
        }
    }
}

/// Why an operation did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Matched an ignore rule
    Excluded,
    /// The file disappeared before it could be added
    Vanished,
    /// Remote deletion is turned off
    DeletionDisabled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::Excluded => "ignored",
            SkipReason::Vanished => "no longer exists",
            SkipReason::DeletionDisabled => "remote deletion disabled",
        })
    }
}

/// How a settled operation ended
///
/// A rejected operation (hook failure, runner breakage) is an `Err` alongside
/// this type rather than one of its variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The change reached the target
    Synced,
    /// Nothing had to be done
    Skipped(SkipReason),
    /// The transfer ran and reported an error
    Failed(String),
}

impl Outcome {
    /// Whether the change reached the target
    pub fn is_synced(&self) -> bool {
        matches!(self, Outcome::Synced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::Vanished.to_string(), "no longer exists");
        assert_eq!(
            SkipReason::DeletionDisabled.to_string(),
            "remote deletion disabled"
        );
    }

    #[test]
    fn test_outcome_is_synced() {
        assert!(Outcome::Synced.is_synced());
        assert!(!Outcome::Skipped(SkipReason::Excluded).is_synced());
        assert!(!Outcome::Failed("x".to_string()).is_synced());
    }
}
