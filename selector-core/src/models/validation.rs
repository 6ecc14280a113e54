use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::GroupType;

/// Group owner id → ids of the owner's children (or of its selected children).
pub type GroupMap = BTreeMap<String, Vec<String>>;

/// Request body sent to the external validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub mandatory: Vec<String>,
    pub or: GroupMap,
    pub xor: GroupMap,
    pub and: GroupMap,
    pub selected: SelectedByGroup,
}

impl ValidationRequest {
    /// The authoritative map for one group kind. `None` has no map.
    pub fn groups_mut(&mut self, kind: GroupType) -> Option<&mut GroupMap> {
        match kind {
            GroupType::None => None,
            GroupType::And => Some(&mut self.and),
            GroupType::Or => Some(&mut self.or),
            GroupType::Xor => Some(&mut self.xor),
        }
    }
}

/// Current selection projected onto the group containers it falls under.
///
/// `mandatory` is keyed by ordinal (`"0"`, `"1"`, ...) on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedByGroup {
    pub or: GroupMap,
    pub xor: GroupMap,
    pub and: GroupMap,
    pub mandatory: BTreeMap<usize, String>,
}

impl SelectedByGroup {
    pub fn groups_mut(&mut self, kind: GroupType) -> Option<&mut GroupMap> {
        match kind {
            GroupType::None => None,
            GroupType::And => Some(&mut self.and),
            GroupType::Or => Some(&mut self.or),
            GroupType::Xor => Some(&mut self.xor),
        }
    }
}

/// Validator verdict. `is_valid = false` is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
