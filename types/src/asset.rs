//! On-chain asset identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a native asset.
///
/// Tracked stake assets use the dotted form `policy.assetNameHex`; reward
/// tokens use whatever identifier the operator configured. The indexer
/// reports holdings as an undotted `unit` (`policy ++ assetNameHex`), see
/// [`AssetId::from_unit`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Convert an indexer `unit` into the dotted form if it belongs to `policy`.
    ///
    /// Returns `None` when the unit is minted under a different policy, or
    /// when `policy` is empty.
    pub fn from_unit(unit: &str, policy: &str) -> Option<Self> {
        if policy.is_empty() {
            return None;
        }
        let name = unit.strip_prefix(policy)?;
        Some(Self(format!("{policy}.{name}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_under_policy_gets_dotted() {
        let id = AssetId::from_unit("abcd0102", "abcd").unwrap();
        assert_eq!(id.as_str(), "abcd.0102");
    }

    #[test]
    fn unit_under_other_policy_is_skipped() {
        assert!(AssetId::from_unit("ffff0102", "abcd").is_none());
    }

    #[test]
    fn empty_policy_matches_nothing() {
        assert!(AssetId::from_unit("abcd0102", "").is_none());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = AssetId::new("p.01");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p.01\"");
    }
}
