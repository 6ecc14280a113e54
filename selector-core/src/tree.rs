//! Indexed feature hierarchy.
//!
//! Nodes live in a flat arena in pre-order (the root at position 0). Parent and
//! child links are arena positions, and an id → position index gives O(1)
//! lookup, so no query ever walks the tree to find a node.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::models::{FeatureSnapshot, GroupType, IngestResponse, RawNode};

/// Ways an ingested document can fail to describe a single-rooted tree.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("Invalid tree data received: no root feature")]
    MissingRoot,

    #[error("Invalid tree data received: root feature has no children field")]
    MissingChildren,

    #[error("Invalid tree data received: {0}")]
    InvalidShape(String),

    #[error("Invalid tree data received: duplicate feature id '{0}'")]
    DuplicateId(String),
}

/// One feature in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureNode {
    pub id: String,
    pub label: String,
    pub mandatory: bool,
    /// How this node's own children must be selected.
    pub group_type: GroupType,
    position: usize,
    /// Exclusive end of this node's pre-order run.
    end: usize,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl FeatureNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Pre-order rank within the tree.
    pub fn position(&self) -> usize {
        self.position
    }
}

#[derive(Debug, Clone)]
pub struct FeatureTree {
    nodes: Vec<FeatureNode>,
    index: HashMap<String, usize>,
    mandatory: Vec<usize>,
}

impl FeatureTree {
    /// Build a tree from an ingestion response.
    ///
    /// The response must carry `treeData`, and the root must have a `children`
    /// field (an empty list is fine).
    pub fn from_ingest(response: &IngestResponse) -> Result<Self, TreeError> {
        let data = match &response.tree_data {
            Some(Value::Object(map)) => match map.get("children") {
                None | Some(Value::Null) => return Err(TreeError::MissingChildren),
                Some(_) => Value::Object(map.clone()),
            },
            Some(Value::Null) | None => return Err(TreeError::MissingRoot),
            Some(_) => {
                return Err(TreeError::InvalidShape(
                    "treeData is not an object".to_string(),
                ))
            }
        };

        let root: RawNode =
            serde_json::from_value(data).map_err(|e| TreeError::InvalidShape(e.to_string()))?;
        Self::from_raw(&root)
    }

    /// Build a tree from a nested raw record. Fails only on duplicate ids.
    pub fn from_raw(root: &RawNode) -> Result<Self, TreeError> {
        let mut tree = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            mandatory: Vec::new(),
        };
        tree.insert(root, None)?;
        tracing::debug!(
            root = %root.id,
            nodes = tree.nodes.len(),
            mandatory = tree.mandatory.len(),
            "Built feature tree"
        );
        Ok(tree)
    }

    fn insert(&mut self, raw: &RawNode, parent: Option<usize>) -> Result<usize, TreeError> {
        let position = self.nodes.len();
        if self.index.insert(raw.id.clone(), position).is_some() {
            return Err(TreeError::DuplicateId(raw.id.clone()));
        }
        if raw.mandatory {
            self.mandatory.push(position);
        }
        self.nodes.push(FeatureNode {
            id: raw.id.clone(),
            label: raw.label.clone(),
            mandatory: raw.mandatory,
            group_type: GroupType::from_label(&raw.label),
            position,
            end: position + 1,
            parent,
            children: Vec::new(),
        });

        for child in raw.children.iter().flatten() {
            let child_position = self.insert(child, Some(position))?;
            self.nodes[position].children.push(child_position);
        }
        self.nodes[position].end = self.nodes.len();
        Ok(position)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> &FeatureNode {
        &self.nodes[0]
    }

    pub fn get(&self, id: &str) -> Option<&FeatureNode> {
        self.index.get(id).map(|&position| &self.nodes[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn is_root(&self, id: &str) -> bool {
        self.index.get(id) == Some(&0)
    }

    pub fn parent_of(&self, node: &FeatureNode) -> Option<&FeatureNode> {
        node.parent.map(|position| &self.nodes[position])
    }

    pub fn children_of<'a>(
        &'a self,
        node: &'a FeatureNode,
    ) -> impl Iterator<Item = &'a FeatureNode> + 'a {
        node.children.iter().map(move |&position| &self.nodes[position])
    }

    /// Ancestors from the parent up to and including the root.
    pub fn ancestors_of<'a>(&'a self, node: &FeatureNode) -> Ancestors<'a> {
        Ancestors {
            tree: self,
            next: node.parent,
        }
    }

    /// The node followed by all of its descendants, in pre-order.
    pub fn subtree_of<'a>(&'a self, node: &FeatureNode) -> impl Iterator<Item = &'a FeatureNode> {
        self.nodes[node.position..node.end].iter()
    }

    /// All nodes in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureNode> {
        self.nodes.iter()
    }

    /// Ids of every mandatory feature, in pre-order.
    pub fn mandatory_ids(&self) -> impl Iterator<Item = &str> {
        self.mandatory
            .iter()
            .map(move |&position| self.nodes[position].id.as_str())
    }

    /// Flatten back into the nested record the tree was built from.
    pub fn to_raw(&self) -> RawNode {
        self.raw_at(0)
    }

    fn raw_at(&self, position: usize) -> RawNode {
        let node = &self.nodes[position];
        RawNode {
            label: node.label.clone(),
            id: node.id.clone(),
            mandatory: node.mandatory,
            children: Some(
                node.children
                    .iter()
                    .map(|&child| self.raw_at(child))
                    .collect(),
            ),
        }
    }

    /// Parent-free nested copy for transmission.
    pub fn snapshot(&self) -> FeatureSnapshot {
        self.snapshot_at(0)
    }

    fn snapshot_at(&self, position: usize) -> FeatureSnapshot {
        let node = &self.nodes[position];
        FeatureSnapshot {
            id: node.id.clone(),
            label: node.label.clone(),
            mandatory: node.mandatory,
            group_type: node.group_type,
            children: node
                .children
                .iter()
                .map(|&child| self.snapshot_at(child))
                .collect(),
        }
    }
}

/// Iterator over a node's ancestor chain, nearest first.
pub struct Ancestors<'a> {
    tree: &'a FeatureTree,
    next: Option<usize>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a FeatureNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.tree.nodes[self.next?];
        self.next = node.parent;
        Some(node)
    }
}
