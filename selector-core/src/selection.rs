//! Selection state and the rules that keep it consistent.
//!
//! A [`Selection`] only changes by running one [`Intent`] for one node through
//! the [`Propagator`]. Rules, first match wins:
//!
//! 1. Root deselected: empty selection.
//! 2. Mandatory node selected: mandatory baseline plus the node, its parent and the root.
//! 3. Mandatory node deselected: empty selection.
//! 4. Root selected: mandatory baseline plus the root.
//! 5. XOR exclusion (policy-controlled) on select.
//! 6. Optional node selected: add it, its ancestors, the root, every mandatory
//!    feature, and its own mandatory children.
//! 7. Optional node deselected: remove it. A mandatory parent empties the
//!    selection. Otherwise prune ancestors left with no selected children;
//!    pruning a mandatory ancestor empties the selection.
//!
//! Selecting a present id or deselecting an absent one is a no-op, as is any
//! event for an id the tree does not know.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::GroupType;
use crate::tree::{FeatureNode, FeatureTree};

/// The set of chosen feature ids. No duplicates, no order semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeSet<String>);

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    fn insert(&mut self, id: &str) {
        self.0.insert(id.to_string());
    }

    fn remove(&mut self, id: &str) -> bool {
        self.0.remove(id)
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// What the user asked for on a node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Select,
    Deselect,
}

impl Intent {
    /// Map a checkbox state to an intent.
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            Self::Select
        } else {
            Self::Deselect
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Deselect => "deselect",
        }
    }
}

/// Which group rules are enforced while the user toggles features.
///
/// OR and AND groups are never enforced interactively; only the validator
/// checks them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Keep at most one child of each XOR container selected.
    #[serde(default)]
    pub enforce_xor: bool,
}

impl SelectionPolicy {
    pub fn with_xor(enforce_xor: bool) -> Self {
        Self { enforce_xor }
    }
}

/// Applies toggle events to a selection for one tree.
#[derive(Debug, Clone, Copy)]
pub struct Propagator<'a> {
    tree: &'a FeatureTree,
    policy: SelectionPolicy,
}

impl<'a> Propagator<'a> {
    pub fn new(tree: &'a FeatureTree, policy: SelectionPolicy) -> Self {
        Self { tree, policy }
    }

    /// Compute the selection that follows `intent` on `id`.
    pub fn apply(&self, current: &Selection, id: &str, intent: Intent) -> Selection {
        let Some(node) = self.tree.get(id) else {
            tracing::debug!(node = id, "Ignoring toggle for unknown feature");
            return current.clone();
        };

        let already_selected = current.contains(id);
        let next = match intent {
            Intent::Select if already_selected => return current.clone(),
            Intent::Deselect if !already_selected => return current.clone(),
            Intent::Select => self.select(current, node),
            Intent::Deselect => self.deselect(current, node),
        };

        tracing::debug!(
            node = id,
            intent = intent.as_str(),
            before = current.len(),
            after = next.len(),
            "Selection updated"
        );
        next
    }

    fn select(&self, current: &Selection, node: &FeatureNode) -> Selection {
        if node.mandatory {
            let mut next = self.baseline();
            if let Some(parent) = self.tree.parent_of(node) {
                next.insert(&parent.id);
            }
            next.insert(&node.id);
            return next;
        }

        if node.is_root() {
            return self.baseline();
        }

        let mut next = current.clone();
        if self.policy.enforce_xor {
            self.exclude_xor_siblings(&mut next, node);
        }

        next.insert(&node.id);
        for ancestor in self.tree.ancestors_of(node) {
            next.insert(&ancestor.id);
        }
        for id in self.tree.mandatory_ids() {
            next.insert(id);
        }
        for child in self.tree.children_of(node).filter(|child| child.mandatory) {
            next.insert(&child.id);
        }
        next
    }

    fn deselect(&self, current: &Selection, node: &FeatureNode) -> Selection {
        if node.is_root() || node.mandatory {
            return Selection::new();
        }

        if let Some(parent) = self.tree.parent_of(node).filter(|p| p.mandatory) {
            tracing::debug!(
                node = %node.id,
                parent = %parent.id,
                "Deselected a child of a mandatory feature, clearing selection"
            );
            return Selection::new();
        }

        let mut next = current.clone();
        next.remove(&node.id);

        for ancestor in self.tree.ancestors_of(node).filter(|a| !a.is_root()) {
            let keeps_a_child = self
                .tree
                .children_of(ancestor)
                .any(|child| next.contains(&child.id));
            if keeps_a_child {
                continue;
            }
            if ancestor.mandatory {
                tracing::debug!(
                    node = %node.id,
                    ancestor = %ancestor.id,
                    "Deselect emptied a mandatory feature, clearing selection"
                );
                return Selection::new();
            }
            next.remove(&ancestor.id);
        }
        next
    }

    /// Every mandatory feature plus the root.
    fn baseline(&self) -> Selection {
        let mut baseline: Selection = self.tree.mandatory_ids().collect();
        baseline.insert(&self.tree.root().id);
        baseline
    }

    /// Drop the competitors of `node` and of each ancestor that sits directly
    /// under an XOR container, along with their subtrees.
    fn exclude_xor_siblings(&self, selection: &mut Selection, node: &FeatureNode) {
        for member in std::iter::once(node).chain(self.tree.ancestors_of(node)) {
            let Some(container) = self.tree.parent_of(member) else {
                continue;
            };
            if container.group_type != GroupType::Xor {
                continue;
            }
            for sibling in self.tree.children_of(container) {
                if sibling.id == member.id {
                    continue;
                }
                for excluded in self.tree.subtree_of(sibling) {
                    selection.remove(&excluded.id);
                }
            }
        }
    }
}
