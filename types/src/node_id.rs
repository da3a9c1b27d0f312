//! Node identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Identifies one role-scoped node, e.g. `doctor_node` or `pharmacy_node`.
///
/// Recorded as the `originator` of every block the node appends.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id, rejecting empty or whitespace-bearing names.
    pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(TypesError::InvalidNodeId(s));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NodeId {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

impl FromStr for NodeId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_role_names() {
        let id = NodeId::new("doctor_node").unwrap();
        assert_eq!(id.as_str(), "doctor_node");
        assert_eq!(id.to_string(), "doctor_node");
    }

    #[test]
    fn deserialization_validates() {
        let id: NodeId = serde_json::from_str("\"pharmacy_node\"").unwrap();
        assert_eq!(id.as_str(), "pharmacy_node");
        assert!(serde_json::from_str::<NodeId>("\"\"").is_err());
    }

    #[test]
    fn rejects_empty_and_spaced_names() {
        assert!(NodeId::new("").is_err());
        assert!(NodeId::new("doctor node").is_err());
    }
}
