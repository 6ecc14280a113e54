use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// How the children of a node must be jointly selected.
///
/// - `None`: plain feature, children are independent
/// - `And`: all children belong together
/// - `Or`: at least one child
/// - `Xor`: at most one child
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    #[default]
    None,
    And,
    Or,
    Xor,
}

/// Label tokens marking a group container, checked in order. `-xor` must come
/// before `-or` so the first match wins.
const GROUP_TOKENS: [(&str, GroupType); 3] = [
    ("-xor", GroupType::Xor),
    ("-or", GroupType::Or),
    ("-and", GroupType::And),
];

impl GroupType {
    /// Derive the group type from a display label.
    pub fn from_label(label: &str) -> Self {
        GROUP_TOKENS
            .iter()
            .find(|(token, _)| label.contains(token))
            .map(|(_, kind)| *kind)
            .unwrap_or(GroupType::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
        }
    }

    pub fn is_group(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A node as produced by the ingestion service.
///
/// The service sends the id as `value`; `id` is accepted too. Any `groupType`
/// the service includes is ignored, the engine derives it from `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNode {
    pub label: String,
    #[serde(rename = "value", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<RawNode>>,
}

impl RawNode {
    pub fn leaf(id: impl Into<String>, label: impl Into<String>, mandatory: bool) -> Self {
        Self {
            label: label.into(),
            id: id.into(),
            mandatory,
            children: None,
        }
    }

    pub fn with_children(mut self, children: Vec<RawNode>) -> Self {
        self.children = Some(children);
        self
    }
}

/// Response from the ingestion service.
///
/// `tree_data` is kept untyped so a wrongly shaped document is reported as a
/// malformed tree rather than a transport-level decode failure.
///
/// Decoding goes through serde_json's default nesting limit of 128, and each
/// feature level costs two (its object and its `children` array). Documents
/// deeper than about 60 features fail to decode with a recursion error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestResponse {
    #[serde(rename = "treeData", default)]
    pub tree_data: Option<Value>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub constraints: Vec<Value>,
}

impl IngestResponse {
    pub fn new(root: &RawNode, constraints: Vec<Value>) -> Self {
        Self {
            tree_data: serde_json::to_value(root).ok(),
            constraints,
        }
    }
}

fn list_or_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}

/// A parent-free copy of a feature and its subtree, safe to serialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub id: String,
    pub label: String,
    pub mandatory: bool,
    #[serde(rename = "groupType")]
    pub group_type: GroupType,
    pub children: Vec<FeatureSnapshot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_group_type_from_label_tokens() {
        assert_eq!(GroupType::from_label("Payment-xor"), GroupType::Xor);
        assert_eq!(GroupType::from_label("Filters-or"), GroupType::Or);
        assert_eq!(GroupType::from_label("Core-and"), GroupType::And);
        assert_eq!(GroupType::from_label("Catalog"), GroupType::None);
    }

    #[test]
    fn first_matching_token_wins() {
        assert_eq!(GroupType::from_label("Mode-xor-and"), GroupType::Xor);
        assert_eq!(GroupType::from_label("Mode-or-and"), GroupType::Or);
    }

    #[test]
    fn group_token_match_is_case_sensitive() {
        assert_eq!(GroupType::from_label("Mode-XOR"), GroupType::None);
    }

    #[test]
    fn raw_node_accepts_value_or_id() {
        let from_value: RawNode =
            serde_json::from_str(r#"{"label":"A","value":"a","groupType":"xor"}"#).unwrap();
        let from_id: RawNode = serde_json::from_str(r#"{"label":"A","id":"a"}"#).unwrap();
        assert_eq!(from_value, from_id);
        assert!(!from_value.mandatory);
        assert!(from_value.children.is_none());
    }

    #[test]
    fn non_array_constraints_become_empty() {
        let response: IngestResponse =
            serde_json::from_str(r#"{"treeData":null,"constraints":"none"}"#).unwrap();
        assert!(response.tree_data.is_none());
        assert!(response.constraints.is_empty());
    }
}
