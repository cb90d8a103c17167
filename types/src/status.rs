//! Claim session lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// Lifecycle status of a claim session.
///
/// ```text
/// OPEN ──► INVALID | EXPIRED | PROCESSING | ERROR
/// PROCESSING ──► COMPLETED | ERROR
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    Open,
    Processing,
    Expired,
    Invalid,
    Completed,
    Error,
}

impl ClaimStatus {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Invalid | Self::Expired | Self::Error
        )
    }

    /// Whether `self → next` is a legal lifecycle step.
    pub fn can_transition_to(&self, next: ClaimStatus) -> bool {
        match self {
            Self::Open => matches!(
                next,
                Self::Invalid | Self::Expired | Self::Processing | Self::Error
            ),
            Self::Processing => matches!(next, Self::Completed | Self::Error),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Processing => "PROCESSING",
            Self::Expired => "EXPIRED",
            Self::Invalid => "INVALID",
            Self::Completed => "COMPLETED",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Open),
            "PROCESSING" => Ok(Self::Processing),
            "EXPIRED" => Ok(Self::Expired),
            "INVALID" => Ok(Self::Invalid),
            "COMPLETED" => Ok(Self::Completed),
            "ERROR" => Ok(Self::Error),
            other => Err(TypeError::UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ClaimStatus; 6] = [
        ClaimStatus::Open,
        ClaimStatus::Processing,
        ClaimStatus::Expired,
        ClaimStatus::Invalid,
        ClaimStatus::Completed,
        ClaimStatus::Error,
    ];

    #[test]
    fn terminal_states_have_no_exits() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn open_exits() {
        assert!(ClaimStatus::Open.can_transition_to(ClaimStatus::Invalid));
        assert!(ClaimStatus::Open.can_transition_to(ClaimStatus::Expired));
        assert!(ClaimStatus::Open.can_transition_to(ClaimStatus::Processing));
        assert!(ClaimStatus::Open.can_transition_to(ClaimStatus::Error));
        assert!(!ClaimStatus::Open.can_transition_to(ClaimStatus::Completed));
        assert!(!ClaimStatus::Open.can_transition_to(ClaimStatus::Open));
    }

    #[test]
    fn processing_exits() {
        assert!(ClaimStatus::Processing.can_transition_to(ClaimStatus::Completed));
        assert!(ClaimStatus::Processing.can_transition_to(ClaimStatus::Error));
        assert!(!ClaimStatus::Processing.can_transition_to(ClaimStatus::Invalid));
    }

    #[test]
    fn string_form_matches_serde() {
        for s in ALL {
            let json = serde_json::to_string(&s).unwrap();
            assert_eq!(json, format!("\"{}\"", s.as_str()));
            assert_eq!(s.as_str().parse::<ClaimStatus>().unwrap(), s);
        }
    }
}
