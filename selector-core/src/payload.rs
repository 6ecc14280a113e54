//! Constraint and selection document for the external validator.
//!
//! Group maps are keyed by the group container itself, both in the
//! authoritative maps (`or`, `xor`, `and`) and in the `selected` projection.
//! A selected feature is filed under its parent when that parent is a group
//! container.

use serde::Serialize;
use serde_json::Value;

use crate::models::{translate_constraints, FeatureSnapshot, ValidationRequest};
use crate::selection::Selection;
use crate::tree::FeatureTree;

/// Full snapshot: the parent-free tree, translated cross-tree constraints and
/// the validation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payload {
    pub tree: FeatureSnapshot,
    #[serde(rename = "crossTree")]
    pub cross_tree: Vec<String>,
    #[serde(flatten)]
    pub request: ValidationRequest,
}

pub fn build_payload(tree: &FeatureTree, selection: &Selection, constraints: &[Value]) -> Payload {
    Payload {
        tree: tree.snapshot(),
        cross_tree: translate_constraints(constraints),
        request: build_request(tree, selection),
    }
}

/// Build the request body the validator receives.
pub fn build_request(tree: &FeatureTree, selection: &Selection) -> ValidationRequest {
    let mut request = ValidationRequest::default();

    for node in tree.iter() {
        if node.mandatory {
            request.mandatory.push(node.id.clone());
        }
        if let Some(groups) = request.groups_mut(node.group_type) {
            groups
                .entry(node.id.clone())
                .or_default()
                .extend(tree.children_of(node).map(|child| child.id.clone()));
        }
    }

    // Tree order keeps the projection deterministic.
    let mut ordinal = 0;
    for node in tree.iter().filter(|node| selection.contains(&node.id)) {
        if let Some(container) = tree.parent_of(node) {
            if let Some(groups) = request.selected.groups_mut(container.group_type) {
                groups
                    .entry(container.id.clone())
                    .or_default()
                    .push(node.id.clone());
            }
        }
        if node.mandatory {
            request.selected.mandatory.insert(ordinal, node.id.clone());
            ordinal += 1;
        }
    }

    request
}
