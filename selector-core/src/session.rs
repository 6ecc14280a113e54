//! One user's working state: the loaded tree, the selection, and which nodes
//! are expanded.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{translate_constraints, IngestResponse, ValidationRequest};
use crate::payload::{build_payload, build_request, Payload};
use crate::render::render_tree;
use crate::selection::{Intent, Propagator, Selection, SelectionPolicy};
use crate::tree::{FeatureTree, TreeError};

/// A user interaction, replayable against a [`Session`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Select { id: String },
    Deselect { id: String },
    /// Click on a checkbox: select when absent, deselect when present.
    Toggle { id: String },
    ToggleExpand { id: String },
    SetEnforceXor { enabled: bool },
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    tree: Option<FeatureTree>,
    selection: Selection,
    expanded: BTreeSet<String>,
    policy: SelectionPolicy,
    constraints: Vec<Value>,
}

impl Session {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Replace the tree with the one described by an ingestion response.
    ///
    /// Any previous selection and expansion is dropped, since ids are not
    /// stable across documents. On failure the session is left with no tree.
    pub fn load(&mut self, response: &IngestResponse) -> Result<&FeatureTree, TreeError> {
        self.clear();
        match FeatureTree::from_ingest(response) {
            Ok(tree) => {
                tracing::info!(
                    root = %tree.root().id,
                    features = tree.len(),
                    constraints = response.constraints.len(),
                    "Loaded feature tree"
                );
                self.constraints = response.constraints.clone();
                Ok(self.tree.insert(tree))
            }
            Err(e) => {
                tracing::warn!("Rejected feature tree: {}", e);
                Err(e)
            }
        }
    }

    /// Install an already built tree, dropping all prior state.
    pub fn install(&mut self, tree: FeatureTree, constraints: Vec<Value>) {
        self.clear();
        self.tree = Some(tree);
        self.constraints = constraints;
    }

    /// Forget the tree and everything that refers to it.
    pub fn clear(&mut self) {
        self.tree = None;
        self.selection = Selection::new();
        self.expanded.clear();
        self.constraints.clear();
    }

    pub fn tree(&self) -> Option<&FeatureTree> {
        self.tree.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn expanded(&self) -> &BTreeSet<String> {
        &self.expanded
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn constraints(&self) -> &[Value] {
        &self.constraints
    }

    /// Cross-tree constraints in propositional form.
    pub fn constraint_logic(&self) -> Vec<String> {
        translate_constraints(&self.constraints)
    }

    pub fn set_enforce_xor(&mut self, enabled: bool) {
        self.policy.enforce_xor = enabled;
    }

    /// Run one intent through the propagator. No tree means no change.
    pub fn update(&mut self, id: &str, intent: Intent) -> &Selection {
        if let Some(tree) = &self.tree {
            self.selection = Propagator::new(tree, self.policy).apply(&self.selection, id, intent);
        }
        &self.selection
    }

    pub fn select(&mut self, id: &str) -> &Selection {
        self.update(id, Intent::Select)
    }

    pub fn deselect(&mut self, id: &str) -> &Selection {
        self.update(id, Intent::Deselect)
    }

    /// Flip the checkbox for `id`.
    pub fn toggle(&mut self, id: &str) -> &Selection {
        let intent = Intent::from_checked(!self.selection.contains(id));
        self.update(id, intent)
    }

    /// Flip expansion for `id`. Returns whether it is now expanded.
    pub fn toggle_expand(&mut self, id: &str) -> bool {
        let known = self.tree.as_ref().is_some_and(|tree| tree.contains(id));
        if !known {
            return false;
        }
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    pub fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Select { id } => {
                self.select(id);
            }
            SessionEvent::Deselect { id } => {
                self.deselect(id);
            }
            SessionEvent::Toggle { id } => {
                self.toggle(id);
            }
            SessionEvent::ToggleExpand { id } => {
                self.toggle_expand(id);
            }
            SessionEvent::SetEnforceXor { enabled } => self.set_enforce_xor(*enabled),
        }
    }

    pub fn replay<'e>(&mut self, events: impl IntoIterator<Item = &'e SessionEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    pub fn payload(&self) -> Option<Payload> {
        self.tree
            .as_ref()
            .map(|tree| build_payload(tree, &self.selection, &self.constraints))
    }

    pub fn validation_request(&self) -> Option<ValidationRequest> {
        self.tree
            .as_ref()
            .map(|tree| build_request(tree, &self.selection))
    }

    pub fn render(&self, expand_all: bool) -> Option<String> {
        self.tree
            .as_ref()
            .map(|tree| render_tree(tree, &self.selection, &self.expanded, expand_all))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawNode;
    use serde_json::json;

    fn response() -> IngestResponse {
        let raw = RawNode::leaf("root", "Application", true).with_children(vec![
            RawNode::leaf("A", "Catalog", true),
            RawNode::leaf("B", "Payment-xor", false).with_children(vec![
                RawNode::leaf("B1", "Card", false),
                RawNode::leaf("B2", "Cash", false),
            ]),
        ]);
        IngestResponse::new(&raw, vec![json!("B1 requires A")])
    }

    #[test]
    fn events_on_an_empty_session_are_ignored() {
        let mut session = Session::default();
        session.select("root");
        assert!(session.selection().is_empty());
        assert!(!session.toggle_expand("root"));
        assert!(session.payload().is_none());
    }

    #[test]
    fn loading_a_new_tree_resets_selection_and_expansion() {
        let mut session = Session::default();
        session.load(&response()).unwrap();
        session.select("B1");
        session.toggle_expand("B");
        assert_eq!(session.constraints().len(), 1);
        assert_eq!(session.constraint_logic(), vec!["B1 → A"]);
        assert_eq!(session.payload().unwrap().cross_tree, vec!["B1 → A"]);

        session.load(&response()).unwrap();
        assert!(session.selection().is_empty());
        assert!(session.expanded().is_empty());
    }

    #[test]
    fn failed_load_leaves_no_tree() {
        let mut session = Session::default();
        session.load(&response()).unwrap();
        session.select("B1");

        let err = session.load(&IngestResponse::default()).unwrap_err();
        assert_eq!(err, TreeError::MissingRoot);
        assert!(session.tree().is_none());
        assert!(session.selection().is_empty());
        assert!(session.constraints().is_empty());
    }

    #[test]
    fn toggle_flips_checkbox_state() {
        let mut session = Session::default();
        session.load(&response()).unwrap();

        session.toggle("B1");
        assert!(session.selection().contains("B1"));
        session.toggle("B1");
        assert!(!session.selection().contains("B1"));
        assert!(session.selection().contains("root"));
    }

    #[test]
    fn toggle_expand_flips_membership() {
        let mut session = Session::default();
        session.load(&response()).unwrap();
        assert!(session.toggle_expand("B"));
        assert!(session.expanded().contains("B"));
        assert!(!session.toggle_expand("B"));
        assert!(session.expanded().is_empty());
        assert!(!session.toggle_expand("ghost"));
    }

    #[test]
    fn replays_a_recorded_event_list() {
        let events: Vec<SessionEvent> = serde_json::from_value(json!([
            { "event": "set_enforce_xor", "enabled": true },
            { "event": "select", "id": "B1" },
            { "event": "toggle", "id": "B2" },
            { "event": "toggle_expand", "id": "root" }
        ]))
        .unwrap();

        let mut session = Session::default();
        session.load(&response()).unwrap();
        session.replay(&events);

        let selected: Vec<_> = session.selection().iter().collect();
        assert_eq!(selected, vec!["A", "B", "B2", "root"]);
        assert!(session.policy().enforce_xor);
        assert!(session.expanded().contains("root"));
    }
}
