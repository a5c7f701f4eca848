//! Edge types.
//!
//! Edges connect a source node to a target node and carry a free-form
//! relation label. The backend names endpoints `source`/`target`; the
//! annotated form uses `sourceId`/`targetId`.

use serde::{Deserialize, Serialize};

/// Edge as delivered by the graph backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub relation: String,
}

impl RawEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation: String::new(),
        }
    }

    /// Attach a relation label.
    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = relation.into();
        self
    }
}

/// Validated edge whose endpoints both exist in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindEdge {
    pub source_id: String,
    pub target_id: String,
    pub relation: String,
}

impl From<RawEdge> for MindEdge {
    fn from(edge: RawEdge) -> Self {
        Self {
            source_id: edge.source,
            target_id: edge.target,
            relation: edge.relation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_defaults_to_empty() {
        let edge: RawEdge = serde_json::from_str(r#"{"source":"a","target":"b"}"#).unwrap();
        assert_eq!(edge, RawEdge::new("a", "b"));
        assert!(edge.relation.is_empty());
    }

    #[test]
    fn test_mind_edge_from_raw() {
        let edge = MindEdge::from(RawEdge::new("a", "b").with_relation("mentions"));
        assert_eq!(edge.source_id, "a");
        assert_eq!(edge.target_id, "b");
        assert_eq!(edge.relation, "mentions");

        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["sourceId"], "a");
    }
}
